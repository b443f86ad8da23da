//! # In-Memory Ledgers
//!
//! In-memory implementations for testing without database dependencies.
//!
//! ## Available Ledgers
//!
//! - [`InMemoryTradeLedger`]: Trades, on a sharded `DashMap`
//! - [`InMemorySettlementLedger`]: Settlements, on `Arc<RwLock<HashMap>>`

pub mod settlement_ledger;
pub mod trade_ledger;

pub use settlement_ledger::InMemorySettlementLedger;
pub use trade_ledger::InMemoryTradeLedger;
