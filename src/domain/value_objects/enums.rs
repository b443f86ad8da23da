//! Closed vocabularies of the ledger.
//!
//! - [`TradeSide`] - Buy or Sell direction of a trade
//! - [`Market`] - Exchange the instrument is listed on
//! - [`MatchStatus`] - Whether a trade has been consumed by a settlement
//! - [`SettlementStatus`] - Internal settlement lifecycle
//! - [`IdDomain`] - Record family an identifier is allocated for
//!
//! Each parses case-insensitively from its lowercase wire name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trade side indicating buy or sell direction.
///
/// # Examples
///
/// ```
/// use tbill_ledger::domain::value_objects::enums::TradeSide;
///
/// assert!(TradeSide::Buy.is_buy());
/// assert_eq!(TradeSide::Buy.to_string(), "buy");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TradeSide {
    /// Acquiring the instrument.
    Buy = 0,
    /// Disposing of the instrument.
    Sell = 1,
}

impl TradeSide {
    /// Returns true if this is a buy.
    #[inline]
    #[must_use]
    pub const fn is_buy(self) -> bool {
        matches!(self, Self::Buy)
    }

    /// Returns true if this is a sell.
    #[inline]
    #[must_use]
    pub const fn is_sell(self) -> bool {
        matches!(self, Self::Sell)
    }

    /// Returns the lowercase storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeSide {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buy" => Ok(Self::Buy),
            "sell" => Ok(Self::Sell),
            _ => Err(ParseEnumError::InvalidValue("TradeSide", s.to_string())),
        }
    }
}

/// Market an instrument trades on.
///
/// Two domestic exchanges, one offshore exchange and the foreign market.
///
/// # Examples
///
/// ```
/// use tbill_ledger::domain::value_objects::enums::Market;
///
/// assert!(Market::Shanghai.is_domestic());
/// assert_eq!("hk".parse::<Market>().unwrap(), Market::HongKong);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Market {
    /// Domestic exchange A.
    #[serde(rename = "sh")]
    Shanghai = 0,
    /// Domestic exchange B.
    #[serde(rename = "sz")]
    Shenzhen = 1,
    /// Offshore exchange.
    #[serde(rename = "hk")]
    HongKong = 2,
    /// Foreign market.
    #[serde(rename = "us")]
    Us = 3,
}

impl Market {
    /// Returns true for the two domestic exchanges.
    #[inline]
    #[must_use]
    pub const fn is_domestic(self) -> bool {
        matches!(self, Self::Shanghai | Self::Shenzhen)
    }

    /// Returns the short market code used in storage.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Shanghai => "sh",
            Self::Shenzhen => "sz",
            Self::HongKong => "hk",
            Self::Us => "us",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Market {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sh" | "shanghai" => Ok(Self::Shanghai),
            "sz" | "shenzhen" => Ok(Self::Shenzhen),
            "hk" | "hongkong" | "hong_kong" => Ok(Self::HongKong),
            "us" => Ok(Self::Us),
            _ => Err(ParseEnumError::InvalidValue("Market", s.to_string())),
        }
    }
}

/// Whether a trade has been consumed by a settlement.
///
/// # State Machine
///
/// ```text
/// Unmatched → Matched
/// ```
///
/// There is no public transition out of `Matched`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum MatchStatus {
    /// Available for settlement.
    #[default]
    Unmatched = 0,
    /// Consumed by exactly one settlement.
    Matched = 1,
}

impl MatchStatus {
    /// Returns true if the trade can still be settled.
    #[inline]
    #[must_use]
    pub const fn is_unmatched(self) -> bool {
        matches!(self, Self::Unmatched)
    }

    /// Returns the lowercase storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unmatched => "unmatched",
            Self::Matched => "matched",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unmatched" => Ok(Self::Unmatched),
            "matched" => Ok(Self::Matched),
            _ => Err(ParseEnumError::InvalidValue("MatchStatus", s.to_string())),
        }
    }
}

/// Settlement lifecycle.
///
/// `Pending` only exists while a non-transactional backend is committing a
/// settlement. Readers only ever see `Finalized` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum SettlementStatus {
    /// Inserted, trade legs not yet confirmed.
    #[default]
    Pending = 0,
    /// Both legs matched; visible to readers.
    Finalized = 1,
}

impl SettlementStatus {
    /// Returns true if the settlement is visible to readers.
    #[inline]
    #[must_use]
    pub const fn is_finalized(self) -> bool {
        matches!(self, Self::Finalized)
    }

    /// Returns the lowercase storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettlementStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "finalized" => Ok(Self::Finalized),
            _ => Err(ParseEnumError::InvalidValue(
                "SettlementStatus",
                s.to_string(),
            )),
        }
    }
}

/// Record family an identifier is allocated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdDomain {
    /// Trade records.
    Trade,
    /// Settlement records.
    Settlement,
}

impl IdDomain {
    /// Returns the identifier prefix for this domain.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Trade => "trade",
            Self::Settlement => "tbill",
        }
    }
}

impl fmt::Display for IdDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Error returned when parsing an enum from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEnumError {
    /// The provided string value is not valid for the enum.
    InvalidValue(&'static str, String),
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue(enum_name, value) => {
                write!(f, "invalid {} value: '{}'", enum_name, value)
            }
        }
    }
}

impl std::error::Error for ParseEnumError {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod trade_side {
        use super::*;

        #[test]
        fn side_predicates() {
            assert!(TradeSide::Buy.is_buy());
            assert!(!TradeSide::Sell.is_buy());
        }

        #[test]
        fn from_str_is_case_insensitive() {
            assert_eq!("BUY".parse::<TradeSide>().unwrap(), TradeSide::Buy);
            assert_eq!("sell".parse::<TradeSide>().unwrap(), TradeSide::Sell);
            assert!("hold".parse::<TradeSide>().is_err());
        }

        #[test]
        fn serde_uses_lowercase() {
            let json = serde_json::to_string(&TradeSide::Sell).unwrap();
            assert_eq!(json, "\"sell\"");
        }
    }

    mod market {
        use super::*;

        #[test]
        fn codes_roundtrip_through_from_str() {
            for market in [
                Market::Shanghai,
                Market::Shenzhen,
                Market::HongKong,
                Market::Us,
            ] {
                assert_eq!(market.code().parse::<Market>().unwrap(), market);
            }
        }

        #[test]
        fn domestic_classification() {
            assert!(Market::Shenzhen.is_domestic());
            assert!(!Market::HongKong.is_domestic());
            assert!(!Market::Us.is_domestic());
        }

        #[test]
        fn serde_uses_short_codes() {
            let json = serde_json::to_string(&Market::HongKong).unwrap();
            assert_eq!(json, "\"hk\"");
        }
    }

    mod statuses {
        use super::*;

        #[test]
        fn match_status_defaults_to_unmatched() {
            assert_eq!(MatchStatus::default(), MatchStatus::Unmatched);
            assert!(MatchStatus::default().is_unmatched());
        }

        #[test]
        fn settlement_status_parse() {
            assert_eq!(
                "finalized".parse::<SettlementStatus>().unwrap(),
                SettlementStatus::Finalized
            );
            assert!("done".parse::<SettlementStatus>().is_err());
        }

        #[test]
        fn parse_error_names_enum() {
            let err = "x".parse::<MatchStatus>().unwrap_err();
            assert!(err.to_string().contains("MatchStatus"));
        }
    }

    #[test]
    fn id_domain_prefixes() {
        assert_eq!(IdDomain::Trade.prefix(), "trade");
        assert_eq!(IdDomain::Settlement.prefix(), "tbill");
    }
}
