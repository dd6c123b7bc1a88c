//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (nanosecond
//! precision, `Z` suffix) so that lexical order equals chronological order.
//! Lists are stored as compact JSON arrays. UUIDs are stored as hyphenated
//! lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use demos_core::{
  record::{Account, IdentityKind, Problem, Requester, Reservation},
  slot::SlotKey,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Requester ────────────────────────────────────────────────────────────────

/// Split a requester into its `(requester_kind, requester)` columns.
pub fn encode_requester(r: &Requester) -> (&'static str, String) {
  (r.kind().as_str(), r.value().to_owned())
}

pub fn decode_requester(kind: &str, value: String) -> Result<Requester> {
  match kind {
    "nickname" => Ok(IdentityKind::Nickname.tag(value)),
    "email" => Ok(IdentityKind::Email.tag(value)),
    other => Err(Error::RequesterKind(other.to_owned())),
  }
}

// ─── Lists ────────────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_list(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawReservation::from_row`].
pub const RESERVATION_COLUMNS: &str =
  "id, requester_kind, requester, description, date, time, course, slot_key, tags";

/// Raw strings read directly from a `reservations` row.
pub struct RawReservation {
  pub id:             String,
  pub requester_kind: String,
  pub requester:      String,
  pub description:    String,
  pub date:           String,
  pub time:           String,
  pub course:         String,
  pub slot_key:       String,
  pub tags:           String,
}

impl RawReservation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      requester_kind: row.get(1)?,
      requester:      row.get(2)?,
      description:    row.get(3)?,
      date:           row.get(4)?,
      time:           row.get(5)?,
      course:         row.get(6)?,
      slot_key:       row.get(7)?,
      tags:           row.get(8)?,
    })
  }

  pub fn into_reservation(self) -> Result<Reservation> {
    Ok(Reservation {
      id:          decode_uuid(&self.id)?,
      requester:   decode_requester(&self.requester_kind, self.requester)?,
      description: self.description,
      date:        self.date,
      time:        self.time,
      course:      self.course,
      slot_key:    SlotKey::from_stored(self.slot_key),
      tags:        decode_list(&self.tags)?,
    })
  }
}

/// Column list matching [`RawProblem::from_row`].
pub const PROBLEM_COLUMNS: &str =
  "id, requester_kind, requester, description, course, language, images, tags, created_at";

/// Raw strings read directly from a `problems` row.
pub struct RawProblem {
  pub id:             String,
  pub requester_kind: String,
  pub requester:      String,
  pub description:    String,
  pub course:         String,
  pub language:       String,
  pub images:         String,
  pub tags:           String,
  pub created_at:     String,
}

impl RawProblem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(0)?,
      requester_kind: row.get(1)?,
      requester:      row.get(2)?,
      description:    row.get(3)?,
      course:         row.get(4)?,
      language:       row.get(5)?,
      images:         row.get(6)?,
      tags:           row.get(7)?,
      created_at:     row.get(8)?,
    })
  }

  pub fn into_problem(self) -> Result<Problem> {
    Ok(Problem {
      id:          decode_uuid(&self.id)?,
      requester:   decode_requester(&self.requester_kind, self.requester)?,
      description: self.description,
      course:      self.course,
      language:    self.language,
      images:      decode_list(&self.images)?,
      tags:        decode_list(&self.tags)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub id:          String,
  pub identifier:  String,
  pub course:      String,
  pub secret_hash: String,
  pub created_at:  String,
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      id:          decode_uuid(&self.id)?,
      identifier:  self.identifier,
      course:      self.course,
      secret_hash: self.secret_hash,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = DateTime::parse_from_rfc3339("2024-05-01T10:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let later = early + chrono::Duration::nanoseconds(1_500);
    let (a, b) = (encode_dt(early), encode_dt(later));
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), later);
  }

  #[test]
  fn unknown_requester_kind_is_an_error() {
    assert!(matches!(
      decode_requester("discord", "ana".into()),
      Err(Error::RequesterKind(_))
    ));
  }
}
