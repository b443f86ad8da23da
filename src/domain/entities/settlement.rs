//! # Settlement Entity
//!
//! A closed round trip: one buy trade paired with one later sell trade of the
//! same instrument, with the realized profit.
//!
//! # Lifecycle
//!
//! ```text
//! Pending ──finalize()──▶ Finalized
//! ```
//!
//! `Pending` exists only while a non-transactional backend confirms both
//! trade legs. Trade references, quantity, prices and profit are fixed at
//! construction; only the date and remark change afterwards.

use crate::domain::entities::trade::{Trade, normalize_remark};
use crate::domain::errors::DomainResult;
use crate::domain::services::ProfitBreakdown;
use crate::domain::value_objects::{
    Instrument, OwnerId, Price, Quantity, SettlementId, SettlementStatus, Timestamp, TradeId,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Caller-supplied settlement metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementDetails {
    /// Settlement date; defaults to the sell leg's trade date.
    pub date: Option<NaiveDate>,
    /// Free-text remark.
    pub remark: Option<String>,
}

/// All fields of a settlement, used to rebuild one from storage.
#[derive(Debug, Clone)]
pub struct SettlementParts {
    /// Settlement identifier.
    pub id: SettlementId,
    /// Owning user.
    pub owner_id: OwnerId,
    /// First (buy) leg.
    pub buy_trade_id: TradeId,
    /// Second (sell) leg.
    pub sell_trade_id: TradeId,
    /// Instrument of both legs.
    pub instrument: Instrument,
    /// Unit price of the buy leg.
    pub buy_price: Price,
    /// Unit price of the sell leg.
    pub sell_price: Price,
    /// Shares closed.
    pub matched_quantity: Quantity,
    /// Per-share profit.
    pub profit: Decimal,
    /// Profit percentage of the buy price.
    pub profit_rate: Decimal,
    /// Free-text remark.
    pub remark: Option<String>,
    /// Settlement date.
    pub date: NaiveDate,
    /// Lifecycle state.
    pub status: SettlementStatus,
    /// Creation time.
    pub created_at: Timestamp,
    /// Last modification time.
    pub updated_at: Timestamp,
}

/// A settlement ("T-bill") record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    id: SettlementId,
    owner_id: OwnerId,
    buy_trade_id: TradeId,
    sell_trade_id: TradeId,
    instrument: Instrument,
    buy_price: Price,
    sell_price: Price,
    matched_quantity: Quantity,
    profit: Decimal,
    profit_rate: Decimal,
    remark: Option<String>,
    date: NaiveDate,
    status: SettlementStatus,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Settlement {
    /// Opens a pending settlement closing `buy` with `sell`.
    ///
    /// Pairing eligibility must already have been checked with
    /// [`check_pair`](crate::domain::services::check_pair).
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRemark` if the remark is too long.
    pub fn open(
        id: SettlementId,
        buy: &Trade,
        sell: &Trade,
        breakdown: ProfitBreakdown,
        details: SettlementDetails,
    ) -> DomainResult<Self> {
        let remark = normalize_remark(details.remark)?;
        let now = Timestamp::now();
        Ok(Self {
            id,
            owner_id: buy.owner_id().clone(),
            buy_trade_id: buy.id().clone(),
            sell_trade_id: sell.id().clone(),
            instrument: buy.instrument().clone(),
            buy_price: buy.unit_price(),
            sell_price: sell.unit_price(),
            matched_quantity: breakdown.matched_quantity,
            profit: breakdown.profit,
            profit_rate: breakdown.profit_rate,
            remark,
            date: details.date.unwrap_or_else(|| sell.trade_date()),
            status: SettlementStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuilds a settlement from trusted storage without validation.
    #[must_use]
    pub fn from_parts(parts: SettlementParts) -> Self {
        Self {
            id: parts.id,
            owner_id: parts.owner_id,
            buy_trade_id: parts.buy_trade_id,
            sell_trade_id: parts.sell_trade_id,
            instrument: parts.instrument,
            buy_price: parts.buy_price,
            sell_price: parts.sell_price,
            matched_quantity: parts.matched_quantity,
            profit: parts.profit,
            profit_rate: parts.profit_rate,
            remark: parts.remark,
            date: parts.date,
            status: parts.status,
            created_at: parts.created_at,
            updated_at: parts.updated_at,
        }
    }

    /// Returns the settlement ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &SettlementId {
        &self.id
    }

    /// Returns the owner ID.
    #[inline]
    #[must_use]
    pub fn owner_id(&self) -> &OwnerId {
        &self.owner_id
    }

    /// Returns the buy (first) leg.
    #[inline]
    #[must_use]
    pub fn buy_trade_id(&self) -> &TradeId {
        &self.buy_trade_id
    }

    /// Returns the sell (second) leg.
    #[inline]
    #[must_use]
    pub fn sell_trade_id(&self) -> &TradeId {
        &self.sell_trade_id
    }

    /// Returns the instrument.
    #[inline]
    #[must_use]
    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Returns the buy unit price.
    #[inline]
    #[must_use]
    pub fn buy_price(&self) -> Price {
        self.buy_price
    }

    /// Returns the sell unit price.
    #[inline]
    #[must_use]
    pub fn sell_price(&self) -> Price {
        self.sell_price
    }

    /// Returns the matched share count.
    #[inline]
    #[must_use]
    pub fn matched_quantity(&self) -> Quantity {
        self.matched_quantity
    }

    /// Returns the per-share profit.
    #[inline]
    #[must_use]
    pub fn profit(&self) -> Decimal {
        self.profit
    }

    /// Returns the profit rate in percent.
    #[inline]
    #[must_use]
    pub fn profit_rate(&self) -> Decimal {
        self.profit_rate
    }

    /// Returns the remark, if any.
    #[inline]
    #[must_use]
    pub fn remark(&self) -> Option<&str> {
        self.remark.as_deref()
    }

    /// Returns the settlement date.
    #[inline]
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the lifecycle state.
    #[inline]
    #[must_use]
    pub fn status(&self) -> SettlementStatus {
        self.status
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

    /// Returns true once both legs are confirmed.
    #[inline]
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.status.is_finalized()
    }

    /// Returns true if `trade_id` is one of the two legs.
    #[must_use]
    pub fn references(&self, trade_id: &TradeId) -> bool {
        &self.buy_trade_id == trade_id || &self.sell_trade_id == trade_id
    }

    /// Returns both legs, buy first.
    #[must_use]
    pub fn legs(&self) -> [&TradeId; 2] {
        [&self.buy_trade_id, &self.sell_trade_id]
    }

    /// Moves a pending settlement to finalized.
    ///
    /// Returns `false` if it was already finalized.
    pub fn finalize(&mut self) -> bool {
        if self.is_finalized() {
            return false;
        }
        self.status = SettlementStatus::Finalized;
        self.updated_at = Timestamp::now();
        true
    }

    /// Consumes the settlement, returning it finalized.
    #[must_use]
    pub fn into_finalized(mut self) -> Self {
        self.finalize();
        self
    }

    /// Updates the mutable metadata. `None` leaves a field unchanged; an
    /// empty remark clears it.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRemark` if the remark is too long.
    pub fn apply_metadata(
        &mut self,
        date: Option<NaiveDate>,
        remark: Option<String>,
    ) -> DomainResult<()> {
        if let Some(remark) = remark {
            self.remark = normalize_remark(Some(remark))?;
        }
        if let Some(date) = date {
            self.date = date;
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }
}

impl fmt::Display for Settlement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Settlement({} {} buy={} sell={} qty={} profit={} rate={}%, {})",
            self.id,
            self.instrument,
            self.buy_trade_id,
            self.sell_trade_id,
            self.matched_quantity,
            self.profit,
            self.profit_rate,
            self.status
        )
    }
}
