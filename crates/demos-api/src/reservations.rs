//! Handlers for `/reservations` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/reservations` | Course-scoped when the deployment requires a claim |
//! | `POST`   | `/reservations` | Body: [`ReservationInput`]; 409 if the slot is taken |
//! | `PUT`    | `/reservations/{id}` | Body: [`ReservationInput`] |
//! | `DELETE` | `/reservations/{id}` | 404 if absent |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use demos_core::{
  access::Operation,
  input::ReservationInput,
  record::Reservation,
  store::BookingStore,
};
use serde_json::{Value, json};

use crate::{AppState, auth::Credential, error::ApiError, parse_id};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /reservations`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Credential(presented): Credential,
) -> Result<Json<Vec<Reservation>>, ApiError>
where
  S: BookingStore + 'static,
{
  let claim = state.policy.authorize(Operation::ListReservations, presented)?;
  let scope = state.policy.list_scope(claim.as_ref());
  Ok(Json(state.reservations.list(scope).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /reservations`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Credential(presented): Credential,
  body: Result<Json<ReservationInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: BookingStore + 'static,
{
  let Json(input) = body?;
  let claim = state.policy.authorize(Operation::CreateReservation, presented)?;
  let reservation = state.reservations.create(input, claim.as_ref()).await?;
  Ok(Json(json!({ "message": "reservation created", "reservation": reservation })))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /reservations/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Credential(presented): Credential,
  body: Result<Json<ReservationInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: BookingStore + 'static,
{
  let claim = state.policy.authorize(Operation::UpdateReservation, presented)?;
  let Json(input) = body?;
  let id = parse_id(&id, "reservation")?;
  let reservation = state.reservations.update(id, input, claim.as_ref()).await?;
  Ok(Json(json!({ "message": "reservation updated", "reservation": reservation })))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /reservations/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Credential(presented): Credential,
) -> Result<Json<Value>, ApiError>
where
  S: BookingStore + 'static,
{
  state.policy.authorize(Operation::DeleteReservation, presented)?;
  let id = parse_id(&id, "reservation")?;
  state.reservations.delete(id).await?;
  Ok(Json(json!({ "message": "reservation deleted" })))
}
