//! Handlers for `/signup` and `/login`.

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use demos_core::{
  accounts::{LoginInput, SignupInput},
  store::BookingStore,
};
use serde_json::json;

use crate::{AppState, error::ApiError};

/// `POST /signup`: 201 with the new account id.
pub async fn signup<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<SignupInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BookingStore + 'static,
{
  let Json(input) = body?;
  let account = state.accounts.signup(input).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "account created", "id": account.id })),
  ))
}

/// `POST /login`: a bearer token for `Authorization: Bearer <token>`.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  body: Result<Json<LoginInput>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BookingStore + 'static,
{
  let Json(input) = body?;
  let claim = state.accounts.login(input).await?;
  let token = state.tokens.sign(&claim)?;
  Ok(Json(json!({
    "message": "logged in",
    "token": token,
    "expires_at": claim.exp,
  })))
}
