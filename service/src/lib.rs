//! # Flash Sale Service
//!
//! Application layer of the flash-sale inventory system: one handler per
//! use case, each composing the core domain with the injected stores.
//!
//! ## The purchase attempt
//!
//! [`commands::ReserveStockHandler`] is the hot path. Control flow for one
//! attempt:
//!
//! 1. Take the per-product lease (`product:{id}`) with bounded retry and a
//!    caller deadline.
//! 2. Reserve against the fast store: one atomic scripted round trip.
//! 3. On success, persist the reservation to the durable store.
//! 4. If the durable write fails, compensate by cancelling the cache
//!    reservation; the counters never stay held for an order that was
//!    never persisted.
//!
//! A sold-out product is a *declined purchase*
//! ([`commands::ReserveOutcome::Declined`]), not an error; lock contention
//! is "try again", distinct from hard failures.
//!
//! ## Keeping the stores honest
//!
//! The durable store is the source of truth. The fast store is a cache
//! with a TTL, re-seeded on read misses and forcibly overwritten by the
//! [`reconciliation::ReconciliationJob`] so drift from partial failures
//! stays bounded.

pub mod commands;
pub mod config;
pub mod error;
pub mod reconciliation;
pub mod resources;

pub use error::{Result, ServiceError};
