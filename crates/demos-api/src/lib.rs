//! JSON REST API for the demos booking service.
//!
//! Exposes an axum [`Router`] backed by any [`BookingStore`]. TLS, CORS and
//! request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = demos_api::router(AppState::new(store, settings, events));
//! ```

pub mod accounts;
pub mod auth;
pub mod error;
pub mod problems;
pub mod reservations;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use chrono::Duration;
use demos_core::{
  access::{AccessMode, AccessPolicy},
  accounts::AccountManager,
  event::EventSink,
  problems::ProblemManager,
  record::IdentityKind,
  reservations::ReservationManager,
  store::BookingStore,
};
use uuid::Uuid;

use auth::{Argon2Hasher, TokenIssuer};
pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Deployment choices the API needs at construction.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  pub identity:   IdentityKind,
  pub access:     AccessMode,
  /// HMAC key for bearer tokens.
  pub jwt_secret: String,
  pub token_ttl:  Duration,
}

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub reservations: Arc<ReservationManager<S>>,
  pub problems:     Arc<ProblemManager<S>>,
  pub accounts:     Arc<AccountManager<S>>,
  pub policy:       AccessPolicy,
  pub tokens:       Arc<TokenIssuer>,
}

impl<S: BookingStore> AppState<S> {
  /// Wire the managers to one shared store handle and event sink.
  pub fn new(store: Arc<S>, settings: ApiSettings, events: Arc<dyn EventSink>) -> Self {
    Self {
      reservations: Arc::new(ReservationManager::new(
        store.clone(),
        settings.identity,
        events,
      )),
      problems:     Arc::new(ProblemManager::new(store.clone(), settings.identity)),
      accounts:     Arc::new(AccountManager::new(
        store,
        settings.identity,
        Arc::new(Argon2Hasher),
        settings.token_ttl,
      )),
      policy:       AccessPolicy::new(settings.access),
      tokens:       Arc::new(TokenIssuer::new(settings.jwt_secret.as_bytes())),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      reservations: self.reservations.clone(),
      problems:     self.problems.clone(),
      accounts:     self.accounts.clone(),
      policy:       self.policy,
      tokens:       self.tokens.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Routes relative to the API root. The returned `Router<()>` can be nested
/// into any parent router regardless of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: BookingStore + 'static,
{
  Router::new()
    // Reservations
    .route(
      "/reservations",
      get(reservations::list::<S>).post(reservations::create::<S>),
    )
    .route(
      "/reservations/{id}",
      put(reservations::update::<S>).delete(reservations::delete::<S>),
    )
    // Problems
    .route("/problems", get(problems::list::<S>).post(problems::create::<S>))
    .route(
      "/problems/{id}",
      put(problems::update::<S>).delete(problems::delete::<S>),
    )
    // Accounts
    .route("/signup", post(accounts::signup::<S>))
    .route("/login", post(accounts::login::<S>))
    .with_state(state)
}

/// The full API mounted under `/api`.
pub fn router<S>(state: AppState<S>) -> Router<()>
where
  S: BookingStore + 'static,
{
  Router::new().nest("/api", api_router(state))
}

/// Path ids are UUIDs; anything else cannot name a record.
pub(crate) fn parse_id(raw: &str, kind: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("{kind} {raw} not found")))
}

// ─── Integration tests ────────────────────────────────────────────────────────
