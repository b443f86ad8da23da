//! # PostgreSQL Persistence
//!
//! sqlx-backed implementation of the ledger ports.

pub mod store;

pub use store::PostgresStore;
