//! # Trade Entity
//!
//! One buy or sell execution owned by a single user.
//!
//! # Match Lifecycle
//!
//! ```text
//! Unmatched ──mark_matched(settlement)──▶ Matched
//! ```
//!
//! The transition happens exactly once. [`Trade::revert_match`] exists only
//! so that a settlement commit that lost a race can undo its own leg; it
//! requires the caller to present the settlement id the trade was matched to.

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    Instrument, MatchStatus, OwnerId, Price, Quantity, SettlementId, Timestamp, TradeId, TradeSide,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a free-text remark on trades and settlements.
pub const MAX_REMARK_LEN: usize = 500;

/// Trims a remark, maps blank text to `None`, and enforces the length limit.
pub(crate) fn normalize_remark(remark: Option<String>) -> DomainResult<Option<String>> {
    match remark {
        None => Ok(None),
        Some(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            if trimmed.chars().count() > MAX_REMARK_LEN {
                return Err(DomainError::InvalidRemark(format!(
                    "remark exceeds {} characters",
                    MAX_REMARK_LEN
                )));
            }
            Ok(Some(trimmed.to_string()))
        }
    }
}

/// Owner-editable metadata of a trade.
///
/// Matching-relevant fields (side, price, quantity, instrument, status) are
/// deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDetailsUpdate {
    /// New trade date.
    pub trade_date: Option<NaiveDate>,
    /// New remark; an empty string clears it.
    pub remark: Option<String>,
}

impl TradeDetailsUpdate {
    /// Returns true if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trade_date.is_none() && self.remark.is_none()
    }
}

/// All fields of a trade, used to rebuild one from storage.
#[derive(Debug, Clone)]
pub struct TradeParts {
    /// Trade identifier.
    pub id: TradeId,
    /// Owning user.
    pub owner_id: OwnerId,
    /// Traded instrument.
    pub instrument: Instrument,
    /// Buy or sell.
    pub side: TradeSide,
    /// Unit price.
    pub unit_price: Price,
    /// Share count.
    pub quantity: Quantity,
    /// Execution date.
    pub trade_date: NaiveDate,
    /// Free-text remark.
    pub remark: Option<String>,
    /// Consumption state.
    pub match_status: MatchStatus,
    /// Settlement consuming this trade, if matched.
    pub settlement_id: Option<SettlementId>,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
}

/// A buy or sell trade.
///
/// # Invariants
///
/// - `match_status == Matched` iff `settlement_id.is_some()`
/// - quantity is positive, price is non-negative
///
/// # Examples
///
/// ```
/// use tbill_ledger::domain::entities::Trade;
/// use tbill_ledger::domain::value_objects::{
///     Instrument, Market, OwnerId, Price, Quantity, SettlementId, TradeId, TradeSide,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let mut trade = Trade::new(
///     TradeId::new("trade-1"),
///     OwnerId::new("owner-1"),
///     Instrument::new("X", "Example", Market::Us).unwrap(),
///     TradeSide::Buy,
///     Price::from_decimal(Decimal::new(1000, 2)).unwrap(),
///     Quantity::new(100).unwrap(),
///     NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
/// );
///
/// assert!(trade.mark_matched(SettlementId::new("tbill-1")));
/// assert!(!trade.mark_matched(SettlementId::new("tbill-2")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    id: TradeId,
    owner_id: OwnerId,
    instrument: Instrument,
    side: TradeSide,
    unit_price: Price,
    quantity: Quantity,
    trade_date: NaiveDate,
    remark: Option<String>,
    match_status: MatchStatus,
    settlement_id: Option<SettlementId>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Trade {
    /// Creates a new unmatched trade.
    #[must_use]
    pub fn new(
        id: TradeId,
        owner_id: OwnerId,
        instrument: Instrument,
        side: TradeSide,
        unit_price: Price,
        quantity: Quantity,
        trade_date: NaiveDate,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id,
            owner_id,
            instrument,
            side,
            unit_price,
            quantity,
            trade_date,
            remark: None,
            match_status: MatchStatus::Unmatched,
            settlement_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attaches a remark.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRemark` if the remark is too long.
    pub fn with_remark(mut self, remark: Option<String>) -> DomainResult<Self> {
        self.remark = normalize_remark(remark)?;
        Ok(self)
    }

    /// Rebuilds a trade from trusted storage without validation.
    #[must_use]
    pub fn from_parts(parts: TradeParts) -> Self {
        Self {
            id: parts.id,
            owner_id: parts.owner_id,
            instrument: parts.instrument,
            side: parts.side,
            unit_price: parts.unit_price,
            quantity: parts.quantity,
            trade_date: parts.trade_date,
            remark: parts.remark,
            match_status: parts.match_status,
            settlement_id: parts.settlement_id,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }

    /// Returns the trade ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &TradeId {
        &self.id
    }

    /// Returns the owner ID.
    #[inline]
    #[must_use]
    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// Returns the traded instrument.
    #[inline]
    #[must_use]
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Returns the trade side.
    #[inline]
    #[must_use]
    pub fn side(&self) -> TradeSide {
        self.side
    }

    /// Returns the unit price.
    #[inline]
    #[must_use]
    pub fn unit_price(&self) -> Price {
        self.unit_price
    }

    /// Returns the share count.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Returns the execution date.
    #[inline]
    #[must_use]
    pub fn trade_date(&self) -> NaiveDate {
        self.trade_date
    }

    /// Returns the remark, if any.
    #[inline]
    #[must_use]
    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref()
    }

    /// Returns the match status.
    #[inline]
    #[must_use]
    pub fn match_status(&self) -> MatchStatus {
        self.match_status
    }

    /// Returns the consuming settlement, if matched.
    #[inline]
    #[must_use]
    pub fn settlement_id(&self) -> Option<&SettlementId> {
        self.settlement_id.as_ref()
    }

    /// Returns the creation time.
    #[inline]
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Returns the last modification time.
    #[inline]
    #[must_use]
    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Returns true if the trade has been consumed by a settlement.
    #[inline]
    #[must_use]
    pub fn is_matched(&self) -> bool {
        self.match_status == MatchStatus::Matched
    }

    /// Marks the trade as consumed by `settlement_id`.
    ///
    /// Returns `false` without changing anything if the trade is already
    /// matched.
    pub fn mark_matched(&mut self, settlement_id: SettlementId) -> bool {
        if self.is_matched() {
            return false;
        }
        self.match_status = MatchStatus::Matched;
        self.settlement_id = Some(settlement_id);
        self.touch();
        true
    }

    /// Undoes [`mark_matched`](Self::mark_matched) for the given settlement.
    ///
    /// Returns `false` without changing anything unless the trade is matched
    /// to exactly `settlement_id`.
    pub fn revert_match(&mut self, settlement_id: &SettlementId) -> bool {
        if !self.is_matched() || self.settlement_id.as_ref() != Some(settlement_id) {
            return false;
        }
        self.match_status = MatchStatus::Unmatched;
        self.settlement_id = None;
        self.touch();
        true
    }

    /// Applies owner edits to non-matching metadata.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRemark` if the new remark is too long.
    pub fn apply_details(&mut self, update: TradeDetailsUpdate) -> DomainResult<()> {
        if let Some(remark) = update.remark {
            self.remark = normalize_remark(Some(remark))?;
        }
        if let Some(date) = update.trade_date {
            self.trade_date = date;
        }
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        self.updated_at = Timestamp::now();
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade({} {} {} x{} @ {}, {})",
            self.id, self.side, self.instrument, self.quantity, self.unit_price, self.match_status
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::Market;
    use rust_decimal::Decimal;

    fn sample_trade() -> Trade {
        Trade::new(
            TradeId::new("trade-1"),
            OwnerId::new("owner-1"),
            Instrument::new("600000", "Pudong Bank", Market::Shanghai).unwrap(),
            TradeSide::Buy,
            Price::from_decimal(Decimal::new(1000, 2)).unwrap(),
            Quantity::new(100).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
        )
    }

    mod construction {
        use super::*;

        #[test]
        fn new_trade_is_unmatched() {
            let trade = sample_trade();
            assert_eq!(trade.match_status(), MatchStatus::Unmatched);
            assert!(trade.settlement_id().is_none());
            assert_eq!(trade.created_at(), trade.updated_at());
        }

        #[test]
        fn blank_remark_becomes_none() {
            let trade = sample_trade().with_remark(Some("   ".to_string())).unwrap();
            assert!(trade.remark().is_none());
        }

        #[test]
        fn oversized_remark_rejected() {
            let result = sample_trade().with_remark(Some("r".repeat(MAX_REMARK_LEN + 1)));
            assert!(matches!(result, Err(DomainError::InvalidRemark(_))));
        }
    }

    mod matching {
        use super::*;

        #[test]
        fn mark_matched_only_once() {
            let mut trade = sample_trade();
            assert!(trade.mark_matched(SettlementId::new("tbill-1")));
            assert!(trade.is_matched());
            assert_eq!(trade.settlement_id(), Some(&SettlementId::new("tbill-1")));

            assert!(!trade.mark_matched(SettlementId::new("tbill-2")));
            assert_eq!(trade.settlement_id(), Some(&SettlementId::new("tbill-1")));
        }

        #[test]
        fn revert_requires_owning_settlement() {
            let mut trade = sample_trade();
            trade.mark_matched(SettlementId::new("tbill-1"));

            assert!(!trade.revert_match(&SettlementId::new("tbill-other")));
            assert!(trade.is_matched());

            assert!(trade.revert_match(&SettlementId::new("tbill-1")));
            assert!(!trade.is_matched());
            assert!(trade.settlement_id().is_none());
        }

        #[test]
        fn revert_on_unmatched_is_noop() {
            let mut trade = sample_trade();
            assert!(!trade.revert_match(&SettlementId::new("tbill-1")));
        }
    }

    mod details {
        use super::*;

        #[test]
        fn apply_details_changes_only_metadata() {
            let mut trade = sample_trade();
            let new_date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

            trade
                .apply_details(TradeDetailsUpdate {
                    trade_date: Some(new_date),
                    remark: Some("moved".to_string()),
                })
                .unwrap();

            assert_eq!(trade.trade_date(), new_date);
            assert_eq!(trade.remark(), Some("moved"));
            assert_eq!(trade.quantity().get(), 100);
            assert!(!trade.is_matched());
        }
    }

    #[test]
    fn serde_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        assert!(json.contains("\"matchStatus\":\"unmatched\""));
        let back: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, back);
    }
}
