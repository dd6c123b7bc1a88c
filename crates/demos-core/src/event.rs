//! Post-commit events.
//!
//! Managers publish an event after a write has been committed. Publishing is
//! synchronous and cannot fail from the caller's point of view; delivery and
//! its failures belong to whoever implements [`EventSink`].

use serde::Serialize;

use crate::record::Reservation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum BookingEvent {
  ReservationCreated(Reservation),
}

/// A non-blocking hand-off point for [`BookingEvent`]s.
pub trait EventSink: Send + Sync {
  fn publish(&self, event: BookingEvent);
}

/// Drops every event. Used when no notifications are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discard;

impl EventSink for Discard {
  fn publish(&self, _event: BookingEvent) {}
}
