//! # Price
//!
//! Non-negative decimal unit price of a trade.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::arithmetic::{ArithmeticResult, CheckedArithmetic};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A non-negative unit price.
///
/// Zero is allowed (gifted or bonus shares); negative prices are not.
///
/// # Examples
///
/// ```
/// use tbill_ledger::domain::value_objects::Price;
/// use rust_decimal::Decimal;
///
/// let price = Price::from_decimal(Decimal::new(1250, 2)).unwrap();
/// assert_eq!(price.to_string(), "12.50");
/// assert!(Price::from_decimal(Decimal::new(-1, 0)).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Creates a price from a decimal value.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidPrice` if the value is negative.
    pub fn from_decimal(value: Decimal) -> DomainResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(DomainError::InvalidPrice(format!(
                "price must not be negative, got {}",
                value
            )));
        }
        Ok(Self(value))
    }

    /// Creates a zero price.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Returns the underlying decimal.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> Decimal {
        self.0
    }

    /// Returns true if the price is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the price is strictly positive.
    #[inline]
    #[must_use]
    pub fn is_positive(&self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// Signed difference `self - other`.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error if the subtraction cannot be represented.
    pub fn difference(&self, other: &Self) -> ArithmeticResult<Decimal> {
        self.0.safe_sub(other.0)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = <Decimal as Deserialize>::deserialize(deserializer)?;
        Self::from_decimal(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_valid() {
        let price = Price::from_decimal(Decimal::ZERO).unwrap();
        assert!(price.is_zero());
        assert!(!price.is_positive());
    }

    #[test]
    fn negative_is_rejected() {
        let result = Price::from_decimal(Decimal::new(-1, 2));
        assert!(matches!(result, Err(DomainError::InvalidPrice(_))));
    }

    #[test]
    fn difference_is_signed() {
        let buy = Price::from_decimal(Decimal::new(1250, 2)).unwrap();
        let sell = Price::from_decimal(Decimal::new(1000, 2)).unwrap();
        assert_eq!(sell.difference(&buy).unwrap(), Decimal::new(-250, 2));
    }

    #[test]
    fn deserialize_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("\"-3.5\"");
        assert!(result.is_err());

        let ok: Price = serde_json::from_str("\"3.5\"").unwrap();
        assert_eq!(ok.get(), Decimal::new(35, 1));
    }
}
