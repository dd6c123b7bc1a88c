//! Record types persisted by a [`BookingStore`](crate::store::BookingStore).
//!
//! Records are flat: every field serialises as a top-level JSON key, and the
//! requester identity appears as either a `nickname` or an `email` key
//! depending on the deployment's [`IdentityKind`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::slot::SlotKey;

// ─── Identity ────────────────────────────────────────────────────────────────

/// Which requester field is authoritative for a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
  /// Anonymous students identify themselves with a free-text nickname.
  #[default]
  Nickname,
  /// Students identify themselves with an (authenticated) email address.
  Email,
}

impl IdentityKind {
  /// Tag a raw identifier with this kind.
  pub fn tag(self, value: String) -> Requester {
    match self {
      Self::Nickname => Requester::Nickname(value),
      Self::Email => Requester::Email(value),
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Nickname => "nickname",
      Self::Email => "email",
    }
  }
}

/// Who filed a reservation or problem report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Requester {
  Nickname(String),
  Email(String),
}

impl Requester {
  pub fn kind(&self) -> IdentityKind {
    match self {
      Self::Nickname(_) => IdentityKind::Nickname,
      Self::Email(_) => IdentityKind::Email,
    }
  }

  pub fn value(&self) -> &str {
    match self {
      Self::Nickname(v) | Self::Email(v) => v,
    }
  }
}

// ─── Reservation ─────────────────────────────────────────────────────────────

/// A booked slot with the demonstrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
  /// Store-assigned; never changes once created.
  pub id:          Uuid,
  #[serde(flatten)]
  pub requester:   Requester,
  pub description: String,
  /// `YYYY-MM-DD`.
  pub date:        String,
  /// `HH:MM`.
  pub time:        String,
  pub course:      String,
  /// `date + " " + time`; unique across live reservations.
  pub slot_key:    SlotKey,
  #[serde(default)]
  pub tags:        Vec<String>,
}

/// The mutable part of a reservation, already validated and normalised.
/// Used for both inserts and whole-record updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
  pub requester:   Requester,
  pub description: String,
  pub date:        String,
  pub time:        String,
  pub course:      String,
  pub slot_key:    SlotKey,
  pub tags:        Vec<String>,
}

impl NewReservation {
  pub fn into_reservation(self, id: Uuid) -> Reservation {
    Reservation {
      id,
      requester: self.requester,
      description: self.description,
      date: self.date,
      time: self.time,
      course: self.course,
      slot_key: self.slot_key,
      tags: self.tags,
    }
  }
}

// ─── Problem report ──────────────────────────────────────────────────────────

/// An issue a student reported for a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
  pub id:          Uuid,
  #[serde(flatten)]
  pub requester:   Requester,
  pub description: String,
  pub course:      String,
  #[serde(default)]
  pub language:    String,
  #[serde(default)]
  pub images:      Vec<String>,
  #[serde(default)]
  pub tags:        Vec<String>,
  /// Server-assigned at insert; never touched by updates.
  pub created_at:  DateTime<Utc>,
}

/// The mutable part of a problem report. `created_at` is always set by the
/// store; it is not accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProblem {
  pub requester:   Requester,
  pub description: String,
  pub course:      String,
  pub language:    String,
  pub images:      Vec<String>,
  pub tags:        Vec<String>,
}

// ─── Account ─────────────────────────────────────────────────────────────────

/// A registered identity that can log in and receive a claim.
#[derive(Debug, Clone)]
pub struct Account {
  pub id:          Uuid,
  pub identifier:  String,
  pub course:      String,
  /// One-way hash of the secret (argon2 PHC string in practice).
  pub secret_hash: String,
  pub created_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
  pub identifier:  String,
  pub course:      String,
  pub secret_hash: String,
}
