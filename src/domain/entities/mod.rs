//! # Domain Entities
//!
//! ## Aggregates
//!
//! - [`Trade`]: One buy or sell execution with its match status
//! - [`Settlement`]: A closed buy/sell round trip with realized profit

pub mod settlement;
pub mod trade;

pub use settlement::{Settlement, SettlementDetails, SettlementParts};
pub use trade::{MAX_REMARK_LEN, Trade, TradeDetailsUpdate, TradeParts};
