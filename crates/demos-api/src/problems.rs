//! Handlers for `/problems` endpoints. Listings are newest-first.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use demos_core::{access::Operation, input::ProblemInput, record::Problem, store::BookingStore};
use serde_json::{Value, json};

use crate::{AppState, auth::Credential, error::ApiError, parse_id};

/// `GET /problems`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Credential(presented): Credential,
) -> Result<Json<Vec<Problem>>, ApiError>
where
  S: BookingStore + 'static,
{
  state.policy.authorize(Operation::ListProblems, presented)?;
  Ok(Json(state.problems.list().await?))
}

/// `POST /problems`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Credential(presented): Credential,
  body: Result<Json<ProblemInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: BookingStore + 'static,
{
  let Json(input) = body?;
  state.policy.authorize(Operation::CreateProblem, presented)?;
  let problem = state.problems.create(input).await?;
  Ok(Json(json!({ "message": "problem reported", "problem": problem })))
}

/// `PUT /problems/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Credential(presented): Credential,
  body: Result<Json<ProblemInput>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: BookingStore + 'static,
{
  state.policy.authorize(Operation::UpdateProblem, presented)?;
  let Json(input) = body?;
  let id = parse_id(&id, "problem")?;
  let problem = state.problems.update(id, input).await?;
  Ok(Json(json!({ "message": "problem updated", "problem": problem })))
}

/// `DELETE /problems/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
  Credential(presented): Credential,
) -> Result<Json<Value>, ApiError>
where
  S: BookingStore + 'static,
{
  state.policy.authorize(Operation::DeleteProblem, presented)?;
  let id = parse_id(&id, "problem")?;
  state.problems.delete(id).await?;
  Ok(Json(json!({ "message": "problem deleted" })))
}
