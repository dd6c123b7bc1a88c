//! The composite slot key and the slot conflict check.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::BookingStore;

/// `date + " " + time`, e.g. `2024-05-01 10:00`.
///
/// Two reservations collide iff their slot keys are byte-equal; there is no
/// duration or overlap arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotKey(String);

impl SlotKey {
  pub fn new(date: &str, time: &str) -> Self { Self(format!("{date} {time}")) }

  /// Wrap a key read back from storage.
  pub fn from_stored(raw: String) -> Self { Self(raw) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SlotKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Whether a live reservation other than `exclude` already holds `slot`.
///
/// `exclude` is only passed on update, so a reservation may keep its own
/// unchanged slot. Always hits the store; the answer is never cached.
pub async fn is_slot_taken<S: BookingStore>(
  store: &S,
  slot: &SlotKey,
  exclude: Option<Uuid>,
) -> Result<bool, S::Error> {
  let holder = store.reservation_by_slot(slot.clone()).await?;
  Ok(holder.is_some_and(|r| Some(r.id) != exclude))
}
