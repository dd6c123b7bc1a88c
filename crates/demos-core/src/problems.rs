//! Problem report lifecycle. No cross-record invariant; listings are
//! newest-first.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::{
  Error, Result,
  input::ProblemInput,
  record::{IdentityKind, Problem},
  store::BookingStore,
};

pub struct ProblemManager<S> {
  store:    Arc<S>,
  identity: IdentityKind,
}

impl<S: BookingStore> ProblemManager<S> {
  pub fn new(store: Arc<S>, identity: IdentityKind) -> Self { Self { store, identity } }

  pub async fn create(&self, input: ProblemInput) -> Result<Problem> {
    let record = input.validate(self.identity, None)?;
    let problem = self.store.insert_problem(record).await.map_err(Error::store)?;
    info!(id = %problem.id, course = %problem.course, "problem reported");
    Ok(problem)
  }

  /// All reports, most recent first.
  pub async fn list(&self) -> Result<Vec<Problem>> {
    self.store.list_problems().await.map_err(Error::store)
  }

  /// Overwrite the mutable fields of report `id`; `created_at` is kept.
  pub async fn update(&self, id: Uuid, input: ProblemInput) -> Result<Problem> {
    let record = input.validate(self.identity, None)?;
    if self.store.problem(id).await.map_err(Error::store)?.is_none() {
      return Err(Error::NotFound { kind: "problem", id });
    }

    let problem = self
      .store
      .update_problem(id, record)
      .await
      .map_err(Error::store)?
      .ok_or(Error::NotFound { kind: "problem", id })?;
    info!(%id, "problem updated");
    Ok(problem)
  }

  pub async fn delete(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_problem(id).await.map_err(Error::store)? {
      return Err(Error::NotFound { kind: "problem", id });
    }
    info!(%id, "problem deleted");
    Ok(())
  }
}
