//! # T-Bill Ledger
//!
//! A per-owner trade ledger that closes round trips: one buy trade is
//! paired with one later sell trade of the same instrument, and the realized
//! profit is recorded as a settlement ("T-bill").
//!
//! # Architecture
//!
//! - [`domain`]: trades, settlements, value objects and pure pairing/profit rules
//! - [`application`]: trade entry and the settlement engine
//! - [`infrastructure`]: ledger ports with in-memory and PostgreSQL backends
//! - [`api`]: axum REST endpoints
//! - [`config`] and [`telemetry`]: service configuration and logging
//!
//! Each trade is consumed by at most one settlement. The ledger's
//! compare-and-set on a trade's match status is the only arbiter between
//! concurrent settlement attempts.

pub mod api;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod telemetry;
