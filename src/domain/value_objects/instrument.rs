//! # Instrument
//!
//! The listed security a trade is executed on.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::enums::Market;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum accepted length of an instrument code.
pub const MAX_CODE_LEN: usize = 32;

/// Maximum accepted length of an instrument display name.
pub const MAX_NAME_LEN: usize = 128;

/// A listed instrument: code, display name and market.
///
/// Two trades refer to the same instrument when their codes are equal; the
/// display name is informational only.
///
/// # Examples
///
/// ```
/// use tbill_ledger::domain::value_objects::instrument::Instrument;
/// use tbill_ledger::domain::value_objects::Market;
///
/// let inst = Instrument::new("600519", "Kweichow Moutai", Market::Shanghai).unwrap();
/// assert_eq!(inst.code(), "600519");
/// assert!(inst.same_code(&Instrument::new(" 600519 ", "", Market::Shanghai).unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instrument {
    code: String,
    name: String,
    market: Market,
}

impl Instrument {
    /// Creates an instrument, trimming surrounding whitespace from code and name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidInstrument` if the code is empty or
    /// either field exceeds its length limit.
    pub fn new(
        code: impl AsRef<str>,
        name: impl AsRef<str>,
        market: Market,
    ) -> DomainResult<Self> {
        let code = code.as_ref().trim();
        let name = name.as_ref().trim();

        if code.is_empty() {
            return Err(DomainError::InvalidInstrument(
                "instrument code must not be empty".to_string(),
            ));
        }
        if code.len() > MAX_CODE_LEN {
            return Err(DomainError::InvalidInstrument(format!(
                "instrument code exceeds {} characters",
                MAX_CODE_LEN
            )));
        }
        if name.len() > MAX_NAME_LEN {
            return Err(DomainError::InvalidInstrument(format!(
                "instrument name exceeds {} characters",
                MAX_NAME_LEN
            )));
        }

        Ok(Self {
            code: code.to_string(),
            name: name.to_string(),
            market,
        })
    }

    /// Reconstructs an instrument from trusted storage without validation.
    #[must_use]
    pub fn from_parts(code: String, name: String, market: Market) -> Self {
        Self { code, name, market }
    }

    /// Returns the instrument code.
    #[inline]
    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Returns the display name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the market.
    #[inline]
    #[must_use]
    pub fn market(&self) -> Market {
        self.market
    }

    /// Returns true if both instruments share the same code.
    #[must_use]
    pub fn same_code(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.code, self.market)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trims_input() {
        let inst = Instrument::new("  AAPL ", " Apple ", Market::Us).unwrap();
        assert_eq!(inst.code(), "AAPL");
        assert_eq!(inst.name(), "Apple");
    }

    #[test]
    fn empty_code_rejected() {
        assert!(matches!(
            Instrument::new("  ", "name", Market::Us),
            Err(DomainError::InvalidInstrument(_))
        ));
    }

    #[test]
    fn long_code_rejected() {
        let code = "X".repeat(MAX_CODE_LEN + 1);
        assert!(Instrument::new(code, "", Market::Us).is_err());
    }

    #[test]
    fn display_includes_market() {
        let inst = Instrument::new("00700", "Tencent", Market::HongKong).unwrap();
        assert_eq!(inst.to_string(), "00700.hk");
    }
}
