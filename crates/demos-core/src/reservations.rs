//! Reservation lifecycle: create, list, update, delete.
//!
//! Every write is validated and conflict-checked before the store is touched,
//! so a rejected request leaves no partial state. The store's own uniqueness
//! constraint on the slot key backs up the conflict check when two writers
//! race past it.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  access::Claim,
  event::{BookingEvent, EventSink},
  input::ReservationInput,
  record::{IdentityKind, Reservation},
  slot::{SlotKey, is_slot_taken},
  store::{BookingStore, StoreError},
};

pub struct ReservationManager<S> {
  store:    Arc<S>,
  identity: IdentityKind,
  events:   Arc<dyn EventSink>,
}

impl<S: BookingStore> ReservationManager<S> {
  pub fn new(store: Arc<S>, identity: IdentityKind, events: Arc<dyn EventSink>) -> Self {
    Self { store, identity, events }
  }

  /// Book a new slot.
  ///
  /// On success a [`BookingEvent::ReservationCreated`] is published; what
  /// happens to it afterwards cannot affect the result.
  pub async fn create(
    &self,
    input: ReservationInput,
    claim: Option<&Claim>,
  ) -> Result<Reservation> {
    let record = input.validate(self.identity, claim.map(|c| c.identifier.as_str()))?;
    let slot = record.slot_key.clone();

    if is_slot_taken(&*self.store, &slot, None).await.map_err(Error::store)? {
      warn!(%slot, "rejected booking: slot already taken");
      return Err(Error::SlotTaken(slot));
    }

    let reservation = self
      .store
      .insert_reservation(record)
      .await
      .map_err(|e| write_error(e, slot))?;

    info!(id = %reservation.id, slot = %reservation.slot_key, "reservation created");
    self
      .events
      .publish(BookingEvent::ReservationCreated(reservation.clone()));
    Ok(reservation)
  }

  /// All reservations, or only those for `course` when a scope is given.
  pub async fn list(&self, course: Option<String>) -> Result<Vec<Reservation>> {
    self.store.list_reservations(course).await.map_err(Error::store)
  }

  /// Replace every mutable field of reservation `id`.
  ///
  /// Keeping the reservation's own slot is not a conflict; moving onto a
  /// slot held by another live reservation is.
  pub async fn update(
    &self,
    id: Uuid,
    input: ReservationInput,
    claim: Option<&Claim>,
  ) -> Result<Reservation> {
    let record = input.validate(self.identity, claim.map(|c| c.identifier.as_str()))?;
    let slot = record.slot_key.clone();

    if self.store.reservation(id).await.map_err(Error::store)?.is_none() {
      return Err(not_found(id));
    }

    if is_slot_taken(&*self.store, &slot, Some(id)).await.map_err(Error::store)? {
      warn!(%id, %slot, "rejected update: slot held by another reservation");
      return Err(Error::SlotTaken(slot));
    }

    let reservation = self
      .store
      .update_reservation(id, record)
      .await
      .map_err(|e| write_error(e, slot))?
      .ok_or_else(|| not_found(id))?;

    info!(%id, slot = %reservation.slot_key, "reservation updated");
    Ok(reservation)
  }

  pub async fn delete(&self, id: Uuid) -> Result<()> {
    if !self.store.delete_reservation(id).await.map_err(Error::store)? {
      return Err(not_found(id));
    }
    info!(%id, "reservation deleted");
    Ok(())
  }
}

fn not_found(id: Uuid) -> Error { Error::NotFound { kind: "reservation", id } }

/// A uniqueness violation on write means another writer took the slot
/// between our check and our write.
fn write_error<E: StoreError>(err: E, slot: SlotKey) -> Error {
  if err.is_unique_violation() {
    warn!(%slot, "slot taken by a concurrent writer");
    Error::SlotTaken(slot)
  } else {
    Error::store(err)
  }
}
