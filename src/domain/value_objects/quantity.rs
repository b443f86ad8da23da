//! # Quantity
//!
//! Strictly positive whole number of shares in a trade.

use crate::domain::errors::{DomainError, DomainResult};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A positive share count.
///
/// # Examples
///
/// ```
/// use tbill_ledger::domain::value_objects::Quantity;
///
/// let a = Quantity::new(100).unwrap();
/// let b = Quantity::new(80).unwrap();
/// assert_eq!(a.min(b).get(), 80);
/// assert!(Quantity::new(0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Creates a quantity.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidQuantity` if the value is zero.
    pub fn new(value: u64) -> DomainResult<Self> {
        if value == 0 {
            return Err(DomainError::InvalidQuantity(
                "quantity must be positive".to_string(),
            ));
        }
        Ok(Self(value))
    }

    /// Returns the share count.
    #[inline]
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }

    /// Returns the smaller of two quantities.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self(self.0.min(other.0))
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for Quantity {
    type Error = DomainError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let unsigned = u64::try_from(value).map_err(|_| {
            DomainError::InvalidQuantity(format!("quantity must be positive, got {}", value))
        })?;
        Self::new(unsigned)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = u64::deserialize(deserializer)?;
        Self::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_rejected() {
        assert!(matches!(
            Quantity::new(0),
            Err(DomainError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn negative_i64_is_rejected() {
        assert!(Quantity::try_from(-5i64).is_err());
        assert_eq!(Quantity::try_from(5i64).unwrap().get(), 5);
    }

    #[test]
    fn min_picks_smaller() {
        let a = Quantity::new(100).unwrap();
        let b = Quantity::new(80).unwrap();
        assert_eq!(a.min(b), b);
        assert_eq!(b.min(a), b);
    }

    #[test]
    fn deserialize_validates() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("7").unwrap().get(), 7);
    }
}
