//! # Settlement Pairing Rules
//!
//! Eligibility checks for closing a buy trade with a sell trade.
//!
//! The first leg must be the buy and the second the sell; ordering is taken
//! from the caller and checked against each trade's side, never inferred
//! from timestamps.

use crate::domain::entities::Trade;
use crate::domain::value_objects::{TradeId, TradeSide};
use std::fmt;

/// Reason a pair of trades cannot be settled together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingViolation {
    /// A leg has already been consumed by another settlement.
    AlreadyMatched {
        /// The consumed trade.
        trade_id: TradeId,
    },
    /// The legs trade different instruments.
    InstrumentMismatch {
        /// Instrument code of the buy leg.
        buy_code: String,
        /// Instrument code of the sell leg.
        sell_code: String,
    },
    /// The legs are not a buy followed by a sell.
    SideMismatch {
        /// Side found on the first leg.
        first: TradeSide,
        /// Side found on the second leg.
        second: TradeSide,
    },
}

impl fmt::Display for PairingViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyMatched { trade_id } => write!(f, "trade {} is already matched", trade_id),
            Self::InstrumentMismatch {
                buy_code,
                sell_code,
            } => write!(
                f,
                "instrument mismatch: buy leg {} vs sell leg {}",
                buy_code, sell_code
            ),
            Self::SideMismatch { first, second } => write!(
                f,
                "expected buy then sell, got {} then {}",
                first, second
            ),
        }
    }
}

/// Checks that `buy` followed by `sell` can be closed into a settlement.
///
/// Checks run in a fixed order: match status, instrument, then sides.
///
/// # Errors
///
/// Returns the first [`PairingViolation`] found.
pub fn check_pair(buy: &Trade, sell: &Trade) -> Result<(), PairingViolation> {
    for leg in [buy, sell] {
        if leg.is_matched() {
            return Err(PairingViolation::AlreadyMatched {
                trade_id: leg.id().clone(),
            });
        }
    }

    if !buy.instrument().same_code(sell.instrument()) {
        return Err(PairingViolation::InstrumentMismatch {
            buy_code: buy.instrument().code().to_string(),
            sell_code: sell.instrument().code().to_string(),
        });
    }

    if !(buy.side().is_buy() && sell.side().is_sell()) {
        return Err(PairingViolation::SideMismatch {
            first: buy.side(),
            second: sell.side(),
        });
    }

    Ok(())
}
