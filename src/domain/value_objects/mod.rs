//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`OwnerId`], [`TradeId`], [`SettlementId`]: String-based identifiers
//!
//! ## Instruments
//!
//! - [`Instrument`]: Code, display name and market
//!
//! ## Numeric Types
//!
//! - [`Price`]: Non-negative decimal unit price
//! - [`Quantity`]: Positive share count
//!
//! ## Domain Enums
//!
//! - `TradeSide`: Buy or Sell
//! - `Market`: Listing exchange
//! - `MatchStatus`: Trade consumption state
//! - `SettlementStatus`: Settlement lifecycle

pub mod arithmetic;
pub mod enums;
pub mod ids;
pub mod instrument;
pub mod price;
pub mod quantity;
pub mod timestamp;

pub use arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic};
pub use enums::{IdDomain, Market, MatchStatus, ParseEnumError, SettlementStatus, TradeSide};
pub use ids::{OwnerId, SettlementId, TradeId};
pub use instrument::Instrument;
pub use price::Price;
pub use quantity::Quantity;
pub use timestamp::Timestamp;
