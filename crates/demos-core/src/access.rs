//! Access policy gate.
//!
//! Decides per operation whether a verified identity claim is required, and
//! whether reservation listings are restricted to the claim's course. How a
//! credential is carried and verified is the HTTP layer's business; this
//! module only sees the outcome as a [`Presented`] value.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Deployment-wide access mode. Not switchable at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
  /// No identity required anywhere; listings are unscoped.
  #[default]
  Open,
  /// Listing reservations requires a claim and is scoped to its course.
  Authenticated,
  /// As `Authenticated`, and updating or deleting reservations also
  /// requires a claim.
  Strict,
}

/// The operations the gate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  CreateReservation,
  ListReservations,
  UpdateReservation,
  DeleteReservation,
  CreateProblem,
  ListProblems,
  UpdateProblem,
  DeleteProblem,
}

/// Verified identity, carried inside a signed bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
  /// Account id.
  pub sub:        Uuid,
  /// The account's email or nickname.
  pub identifier: String,
  pub course:     String,
  /// Issued-at, unix seconds.
  pub iat:        i64,
  /// Expiry, unix seconds.
  pub exp:        i64,
}

/// What the caller presented, after verification.
#[derive(Debug, Clone)]
pub enum Presented {
  Absent,
  /// Malformed, wrongly signed or expired.
  Rejected,
  Verified(Claim),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
  mode: AccessMode,
}

impl AccessPolicy {
  pub fn new(mode: AccessMode) -> Self { Self { mode } }

  fn requires_claim(&self, op: Operation) -> bool {
    use Operation::*;
    match self.mode {
      AccessMode::Open => false,
      AccessMode::Authenticated => matches!(op, ListReservations),
      AccessMode::Strict => {
        matches!(op, ListReservations | UpdateReservation | DeleteReservation)
      }
    }
  }

  /// Check `presented` against the requirement for `op`.
  ///
  /// Returns the claim when one was verified and the mode is not open. A
  /// required claim that is absent is [`Error::AuthRequired`]; one that
  /// failed verification is [`Error::AuthInvalid`]. For operations where a
  /// claim is optional, a rejected credential is ignored.
  pub fn authorize(&self, op: Operation, presented: Presented) -> Result<Option<Claim>> {
    if self.mode == AccessMode::Open {
      return Ok(None);
    }
    match (self.requires_claim(op), presented) {
      (_, Presented::Verified(claim)) => Ok(Some(claim)),
      (true, Presented::Absent) => Err(Error::AuthRequired),
      (true, Presented::Rejected) => Err(Error::AuthInvalid),
      (false, _) => Ok(None),
    }
  }

  /// The course a reservation listing is restricted to, if any.
  pub fn list_scope(&self, claim: Option<&Claim>) -> Option<String> {
    match self.mode {
      AccessMode::Open => None,
      AccessMode::Authenticated | AccessMode::Strict => claim.map(|c| c.course.clone()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn claim(course: &str) -> Claim {
    Claim {
      sub:        Uuid::new_v4(),
      identifier: "ana@uni.hr".into(),
      course:     course.into(),
      iat:        0,
      exp:        i64::MAX,
    }
  }

  #[test]
  fn open_mode_ignores_credentials() {
    let p = AccessPolicy::new(AccessMode::Open);
    assert!(p.authorize(Operation::ListReservations, Presented::Rejected).unwrap().is_none());
    assert!(
      p.authorize(Operation::ListReservations, Presented::Verified(claim("CS101")))
        .unwrap()
        .is_none()
    );
    assert_eq!(p.list_scope(Some(&claim("CS101"))), None);
  }

  #[test]
  fn authenticated_listing_needs_a_claim() {
    let p = AccessPolicy::new(AccessMode::Authenticated);
    assert!(matches!(
      p.authorize(Operation::ListReservations, Presented::Absent),
      Err(Error::AuthRequired)
    ));
    assert!(matches!(
      p.authorize(Operation::ListReservations, Presented::Rejected),
      Err(Error::AuthInvalid)
    ));
    let c = p
      .authorize(Operation::ListReservations, Presented::Verified(claim("CS101")))
      .unwrap();
    assert_eq!(p.list_scope(c.as_ref()).as_deref(), Some("CS101"));
  }

  #[test]
  fn authenticated_create_is_optional() {
    let p = AccessPolicy::new(AccessMode::Authenticated);
    assert!(p.authorize(Operation::CreateReservation, Presented::Absent).unwrap().is_none());
    assert!(p.authorize(Operation::CreateReservation, Presented::Rejected).unwrap().is_none());
    assert!(p.authorize(Operation::UpdateReservation, Presented::Absent).unwrap().is_none());
  }

  #[test]
  fn strict_mode_guards_mutations() {
    let p = AccessPolicy::new(AccessMode::Strict);
    for op in [Operation::UpdateReservation, Operation::DeleteReservation] {
      assert!(matches!(p.authorize(op, Presented::Absent), Err(Error::AuthRequired)));
    }
    assert!(p.authorize(Operation::CreateReservation, Presented::Absent).is_ok());
    assert!(p.authorize(Operation::DeleteProblem, Presented::Absent).is_ok());
  }
}
