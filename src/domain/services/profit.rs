//! # Round-Trip Profit
//!
//! Profit figures for a buy leg closed by a sell leg.
//!
//! ```text
//! matched_quantity = min(buy.quantity, sell.quantity)
//! profit           = sell.unit_price - buy.unit_price
//! profit_rate      = profit / buy.unit_price * 100   (0 when buy price is 0)
//! ```
//!
//! Profit is the per-share price difference, not scaled by quantity.
//! The rate is rounded to [`RATE_DECIMAL_PLACES`] places.

use crate::domain::errors::DomainResult;
use crate::domain::value_objects::arithmetic::percent_of;
use crate::domain::value_objects::{Price, Quantity};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Decimal places kept on the profit rate.
pub const RATE_DECIMAL_PLACES: u32 = 4;

/// Computed profit figures for one settlement.
///
/// # Examples
///
/// ```
/// use tbill_ledger::domain::services::ProfitBreakdown;
/// use tbill_ledger::domain::value_objects::{Price, Quantity};
/// use rust_decimal::Decimal;
///
/// let breakdown = ProfitBreakdown::compute(
///     Price::from_decimal(Decimal::new(1000, 2)).unwrap(),
///     Quantity::new(100).unwrap(),
///     Price::from_decimal(Decimal::new(1250, 2)).unwrap(),
///     Quantity::new(80).unwrap(),
/// )
/// .unwrap();
///
/// assert_eq!(breakdown.matched_quantity.get(), 80);
/// assert_eq!(breakdown.profit, Decimal::new(250, 2));
/// assert_eq!(breakdown.profit_rate, Decimal::new(25, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitBreakdown {
    /// Shares closed by the round trip.
    pub matched_quantity: Quantity,
    /// Per-share realized profit (may be negative).
    pub profit: Decimal,
    /// Profit as a percentage of the buy price.
    pub profit_rate: Decimal,
}

impl ProfitBreakdown {
    /// Computes the figures for a buy leg closed by a sell leg.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Arithmetic` if an intermediate value cannot be
    /// represented.
    pub fn compute(
        buy_price: Price,
        buy_quantity: Quantity,
        sell_price: Price,
        sell_quantity: Quantity,
    ) -> DomainResult<Self> {
        let matched_quantity = buy_quantity.min(sell_quantity);
        let profit = sell_price.difference(&buy_price)?;

        let profit_rate = if buy_price.is_positive() {
            percent_of(profit, buy_price.get(), RATE_DECIMAL_PLACES)?
        } else {
            Decimal::ZERO
        };

        Ok(Self {
            matched_quantity,
            profit,
            profit_rate,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn price(cents: i64) -> Price {
        Price::from_decimal(Decimal::new(cents, 2)).unwrap()
    }

    fn qty(n: u64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn profitable_round_trip() {
        let b = ProfitBreakdown::compute(price(1000), qty(100), price(1250), qty(80)).unwrap();
        assert_eq!(b.matched_quantity, qty(80));
        assert_eq!(b.profit, Decimal::new(250, 2));
        assert_eq!(b.profit_rate, Decimal::new(25, 0));
    }

    #[test]
    fn losing_round_trip_has_negative_profit() {
        let b = ProfitBreakdown::compute(price(2000), qty(10), price(1500), qty(10)).unwrap();
        assert_eq!(b.profit, Decimal::new(-500, 2));
        assert_eq!(b.profit_rate, Decimal::new(-25, 0));
    }

    #[test]
    fn zero_buy_price_gives_zero_rate() {
        let b = ProfitBreakdown::compute(Price::zero(), qty(10), price(300), qty(5)).unwrap();
        assert_eq!(b.profit, Decimal::new(300, 2));
        assert_eq!(b.profit_rate, Decimal::ZERO);
        assert_eq!(b.matched_quantity, qty(5));
    }

    #[test]
    fn rate_is_rounded() {
        // 1 / 3 * 100 = 33.3333...
        let b = ProfitBreakdown::compute(price(300), qty(1), price(400), qty(1)).unwrap();
        assert_eq!(b.profit_rate, Decimal::new(333333, 4));
    }

    proptest! {
        #[test]
        fn figures_follow_formulas(
            buy_cents in 1i64..10_000_000,
            sell_cents in 0i64..10_000_000,
            buy_qty in 1u64..1_000_000,
            sell_qty in 1u64..1_000_000,
        ) {
            let b = ProfitBreakdown::compute(
                price(buy_cents),
                qty(buy_qty),
                price(sell_cents),
                qty(sell_qty),
            )
            .unwrap();

            let expected_profit = Decimal::new(sell_cents - buy_cents, 2);
            prop_assert_eq!(b.matched_quantity.get(), buy_qty.min(sell_qty));
            prop_assert_eq!(b.profit, expected_profit);

            let exact = expected_profit / Decimal::new(buy_cents, 2) * Decimal::ONE_HUNDRED;
            let diff = (b.profit_rate - exact).abs();
            prop_assert!(diff <= Decimal::new(5, 5));
        }
    }
}
