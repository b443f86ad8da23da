//! # Application Services
//!
//! Services that orchestrate domain logic and infrastructure.
//!
//! This module provides application-level services including:
//! - [`SettlementEngine`]: Creates and edits settlements
//! - [`TradeEntryService`]: Records and edits trades
//! - [`RetryPolicy`]: Bounded backoff for ledger writes

pub mod retry;
pub mod settlement_engine;
pub mod trade_entry;

pub use retry::RetryPolicy;
pub use settlement_engine::{EngineSettings, SettlementEngine, SettlementUpdate, SettlementView};
pub use trade_entry::{NewTrade, TradeEntryService};
