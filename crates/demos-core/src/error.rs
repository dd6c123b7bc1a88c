//! Error types for `demos-core`.
//!
//! One variant per failure class a request can end in. The HTTP layer maps
//! each variant to a status code; nothing in this crate knows about HTTP.

use thiserror::Error;
use uuid::Uuid;

use crate::slot::SlotKey;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field is missing or blank, or a field is malformed.
  #[error("{0}")]
  Validation(String),

  /// Another live reservation already holds this slot.
  #[error("slot {0} is already booked")]
  SlotTaken(SlotKey),

  #[error("{kind} {id} not found")]
  NotFound { kind: &'static str, id: Uuid },

  #[error("a credential is required")]
  AuthRequired,

  #[error("the presented credential is invalid or expired")]
  AuthInvalid,

  #[error("an account for {0:?} already exists")]
  DuplicateIdentity(String),

  #[error("unknown identifier or wrong secret")]
  InvalidCredentials,

  /// Hashing or signing a credential failed.
  #[error("credential error: {0}")]
  Credential(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn missing(field: &str) -> Self {
    Self::Validation(format!("missing required field: {field}"))
  }

  pub(crate) fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
