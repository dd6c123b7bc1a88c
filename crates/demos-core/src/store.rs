//! The `BookingStore` trait: the record store adapter.
//!
//! The trait is implemented by storage backends (e.g. `demos-store-sqlite`).
//! The managers in this crate depend on this abstraction, not on any concrete
//! backend, and re-read through it on every operation.

use std::future::Future;

use uuid::Uuid;

use crate::{
  record::{Account, NewAccount, NewProblem, NewReservation, Problem, Reservation},
  slot::SlotKey,
};

/// Classification a backend error must expose to the managers.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// True when the write was rejected by a uniqueness constraint (the
  /// reservation slot key or the account identifier).
  fn is_unique_violation(&self) -> bool;
}

/// Abstraction over a persistence backend holding reservations, problem
/// reports and accounts.
///
/// The backend is expected to enforce uniqueness of
/// [`Reservation::slot_key`] and [`Account::identifier`] itself and to report
/// violations through [`StoreError::is_unique_violation`]; the application
/// level conflict check only narrows the race window.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait BookingStore: Send + Sync {
  type Error: StoreError;

  // ── Reservations ──────────────────────────────────────────────────────

  /// Retrieve a reservation by id. Returns `None` if not found.
  fn reservation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Reservation>, Self::Error>> + Send + '_;

  /// The live reservation holding `slot`, if any.
  fn reservation_by_slot(
    &self,
    slot: SlotKey,
  ) -> impl Future<Output = Result<Option<Reservation>, Self::Error>> + Send + '_;

  /// List reservations, optionally restricted to one course.
  fn list_reservations(
    &self,
    course: Option<String>,
  ) -> impl Future<Output = Result<Vec<Reservation>, Self::Error>> + Send + '_;

  /// Persist a new reservation; the store assigns the id.
  fn insert_reservation(
    &self,
    input: NewReservation,
  ) -> impl Future<Output = Result<Reservation, Self::Error>> + Send + '_;

  /// Overwrite every mutable field of reservation `id` in one operation.
  /// Returns `None` if no such reservation exists.
  fn update_reservation(
    &self,
    id: Uuid,
    input: NewReservation,
  ) -> impl Future<Output = Result<Option<Reservation>, Self::Error>> + Send + '_;

  /// Remove reservation `id`. Returns `false` if it did not exist.
  fn delete_reservation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Problem reports ───────────────────────────────────────────────────

  fn problem(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Problem>, Self::Error>> + Send + '_;

  /// All problem reports, most recently created first.
  fn list_problems(
    &self,
  ) -> impl Future<Output = Result<Vec<Problem>, Self::Error>> + Send + '_;

  /// Persist a new report. `created_at` is set by the store.
  fn insert_problem(
    &self,
    input: NewProblem,
  ) -> impl Future<Output = Result<Problem, Self::Error>> + Send + '_;

  /// Overwrite the mutable fields of report `id`, leaving `created_at`
  /// untouched. Returns `None` if no such report exists.
  fn update_problem(
    &self,
    id: Uuid,
    input: NewProblem,
  ) -> impl Future<Output = Result<Option<Problem>, Self::Error>> + Send + '_;

  fn delete_problem(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Accounts ──────────────────────────────────────────────────────────

  fn account_by_identifier(
    &self,
    identifier: String,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Persist a new account; fails with a unique violation if the identifier
  /// is taken.
  fn insert_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;
}
