//! Core types and booking logic for the demos reservation service.
//!
//! This crate has no HTTP or database dependencies.
//! Storage backends implement [`store::BookingStore`]; the HTTP layer drives
//! the managers and maps [`Error`] to responses.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod accounts;
pub mod error;
pub mod event;
pub mod input;
pub mod problems;
pub mod record;
pub mod reservations;
pub mod slot;
pub mod store;

pub use error::{Error, Result};
