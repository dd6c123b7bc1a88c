//! [`SqliteStore`], the SQLite implementation of [`BookingStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use demos_core::{
  record::{Account, NewAccount, NewProblem, NewReservation, Problem, Reservation},
  slot::SlotKey,
  store::BookingStore,
};

use crate::{
  Result,
  encode::{
    PROBLEM_COLUMNS, RESERVATION_COLUMNS, RawAccount, RawProblem, RawReservation,
    encode_dt, encode_list, encode_requester, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A booking store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All
/// statements run on one connection thread, in submission order.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Fetch at most one reservation matching `column = value`.
  async fn reservation_where(
    &self,
    column: &'static str,
    value: String,
  ) -> Result<Option<Reservation>> {
    let raw: Option<RawReservation> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE {column} = ?1"),
              rusqlite::params![value],
              RawReservation::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawReservation::into_reservation).transpose()
  }
}

// ─── BookingStore impl ───────────────────────────────────────────────────────

impl BookingStore for SqliteStore {
  type Error = crate::Error;

  // ── Reservations ──────────────────────────────────────────────────────────

  async fn reservation(&self, id: Uuid) -> Result<Option<Reservation>> {
    self.reservation_where("id", encode_uuid(id)).await
  }

  async fn reservation_by_slot(&self, slot: SlotKey) -> Result<Option<Reservation>> {
    self.reservation_where("slot_key", slot.as_str().to_owned()).await
  }

  async fn list_reservations(&self, course: Option<String>) -> Result<Vec<Reservation>> {
    let raws: Vec<RawReservation> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(c) = course {
          let mut stmt = conn.prepare(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations
             WHERE course = ?1 ORDER BY date, time"
          ))?;
          stmt
            .query_map(rusqlite::params![c], RawReservation::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations ORDER BY date, time"
          ))?;
          stmt
            .query_map([], RawReservation::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReservation::into_reservation).collect()
  }

  async fn insert_reservation(&self, input: NewReservation) -> Result<Reservation> {
    let reservation = input.into_reservation(Uuid::new_v4());

    let id_str        = encode_uuid(reservation.id);
    let (kind, value) = encode_requester(&reservation.requester);
    let description   = reservation.description.clone();
    let date          = reservation.date.clone();
    let time          = reservation.time.clone();
    let course        = reservation.course.clone();
    let slot_key      = reservation.slot_key.as_str().to_owned();
    let tags_str      = encode_list(&reservation.tags)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reservations (
             id, requester_kind, requester, description,
             date, time, course, slot_key, tags
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, kind, value, description, date, time, course, slot_key, tags_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(reservation)
  }

  async fn update_reservation(
    &self,
    id: Uuid,
    input: NewReservation,
  ) -> Result<Option<Reservation>> {
    let reservation = input.into_reservation(id);

    let id_str        = encode_uuid(id);
    let (kind, value) = encode_requester(&reservation.requester);
    let description   = reservation.description.clone();
    let date          = reservation.date.clone();
    let time          = reservation.time.clone();
    let course        = reservation.course.clone();
    let slot_key      = reservation.slot_key.as_str().to_owned();
    let tags_str      = encode_list(&reservation.tags)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE reservations
           SET requester_kind = ?2, requester = ?3, description = ?4,
               date = ?5, time = ?6, course = ?7, slot_key = ?8, tags = ?9
           WHERE id = ?1",
          rusqlite::params![
            id_str, kind, value, description, date, time, course, slot_key, tags_str,
          ],
        )?)
      })
      .await?;

    Ok((changed > 0).then_some(reservation))
  }

  async fn delete_reservation(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM reservations WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Problem reports ───────────────────────────────────────────────────────

  async fn problem(&self, id: Uuid) -> Result<Option<Problem>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawProblem> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = ?1"),
              rusqlite::params![id_str],
              RawProblem::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProblem::into_problem).transpose()
  }

  async fn list_problems(&self) -> Result<Vec<Problem>> {
    let raws: Vec<RawProblem> = self
      .conn
      .call(|conn| {
        // rowid breaks ties between reports stamped within the same instant.
        let mut stmt = conn.prepare(&format!(
          "SELECT {PROBLEM_COLUMNS} FROM problems ORDER BY created_at DESC, rowid DESC"
        ))?;
        let rows = stmt
          .query_map([], RawProblem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawProblem::into_problem).collect()
  }

  async fn insert_problem(&self, input: NewProblem) -> Result<Problem> {
    let problem = Problem {
      id:          Uuid::new_v4(),
      requester:   input.requester,
      description: input.description,
      course:      input.course,
      language:    input.language,
      images:      input.images,
      tags:        input.tags,
      created_at:  Utc::now(),
    };

    let id_str        = encode_uuid(problem.id);
    let (kind, value) = encode_requester(&problem.requester);
    let description   = problem.description.clone();
    let course        = problem.course.clone();
    let language      = problem.language.clone();
    let images_str    = encode_list(&problem.images)?;
    let tags_str      = encode_list(&problem.tags)?;
    let created_str   = encode_dt(problem.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO problems (
             id, requester_kind, requester, description,
             course, language, images, tags, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str, kind, value, description, course, language, images_str, tags_str,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(problem)
  }

  async fn update_problem(&self, id: Uuid, input: NewProblem) -> Result<Option<Problem>> {
    let id_str        = encode_uuid(id);
    let (kind, value) = encode_requester(&input.requester);
    let images_str    = encode_list(&input.images)?;
    let tags_str      = encode_list(&input.tags)?;
    let NewProblem { description, course, language, .. } = input;

    let raw: Option<RawProblem> = self
      .conn
      .call(move |conn| {
        let changed = conn.execute(
          "UPDATE problems
           SET requester_kind = ?2, requester = ?3, description = ?4,
               course = ?5, language = ?6, images = ?7, tags = ?8
           WHERE id = ?1",
          rusqlite::params![
            id_str, kind, value, description, course, language, images_str, tags_str,
          ],
        )?;
        if changed == 0 {
          return Ok(None);
        }
        Ok(Some(conn.query_row(
          &format!("SELECT {PROBLEM_COLUMNS} FROM problems WHERE id = ?1"),
          rusqlite::params![id_str],
          RawProblem::from_row,
        )?))
      })
      .await?;

    raw.map(RawProblem::into_problem).transpose()
  }

  async fn delete_problem(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM problems WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;
    Ok(removed > 0)
  }

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn account_by_identifier(&self, identifier: String) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, identifier, course, secret_hash, created_at
               FROM accounts WHERE identifier = ?1",
              rusqlite::params![identifier],
              |row| {
                Ok(RawAccount {
                  id:          row.get(0)?,
                  identifier:  row.get(1)?,
                  course:      row.get(2)?,
                  secret_hash: row.get(3)?,
                  created_at:  row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn insert_account(&self, input: NewAccount) -> Result<Account> {
    let account = Account {
      id:          Uuid::new_v4(),
      identifier:  input.identifier,
      course:      input.course,
      secret_hash: input.secret_hash,
      created_at:  Utc::now(),
    };

    let id_str      = encode_uuid(account.id);
    let identifier  = account.identifier.clone();
    let course      = account.course.clone();
    let secret_hash = account.secret_hash.clone();
    let created_str = encode_dt(account.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (id, identifier, course, secret_hash, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, identifier, course, secret_hash, created_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(account)
  }
}
