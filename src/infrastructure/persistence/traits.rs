//! # Repository Traits
//!
//! Port definitions for persistence abstraction.
//!
//! The settlement engine depends only on these traits; backends can be an
//! in-memory store, PostgreSQL, or anything offering an atomic
//! compare-and-set on a trade's match status.
//!
//! # Available Ports
//!
//! - [`TradeLedger`]: Trades with conditional match-status transitions
//! - [`SettlementLedger`]: Settlement records
//! - [`AtomicSettlementWriter`]: Single-transaction settlement commit
//! - [`IdAllocator`]: Collision-free record identifiers
//!
//! # Examples
//!
//! ```ignore
//! use tbill_ledger::infrastructure::persistence::TradeLedger;
//!
//! async fn claim(ledger: &impl TradeLedger, owner: &OwnerId, id: &TradeId, s: &SettlementId) {
//!     if ledger.try_mark_matched(owner, id, s).await? {
//!         println!("trade {} is ours", id);
//!     }
//! }
//! ```

use crate::domain::entities::{Settlement, Trade, TradeDetailsUpdate};
use crate::domain::value_objects::{
    IdDomain, MatchStatus, OwnerId, SettlementId, Timestamp, TradeId, TradeSide,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Entity not found.
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Duplicate entity.
    #[error("Duplicate entity: {entity_type} with id {id} already exists")]
    Duplicate {
        /// Type of entity.
        entity_type: &'static str,
        /// Entity identifier.
        id: String,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query error.
    #[error("Query error: {0}")]
    Query(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// Creates a not found error.
    #[must_use]
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a duplicate error.
    #[must_use]
    pub fn duplicate(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::Duplicate {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a connection error.
    #[must_use]
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error.
    #[must_use]
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates a serialization error.
    #[must_use]
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a duplicate error.
    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    /// Returns true if the backend may succeed on a later attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Largest accepted page size.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Page number, starting at 1.
    pub page: u32,
    /// Records per page.
    pub page_size: u32,
}

impl PageRequest {
    /// Creates a page request without validation.
    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Returns true if `page >= 1` and `1 <= page_size <= MAX_PAGE_SIZE`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.page >= 1 && self.page_size >= 1 && self.page_size <= MAX_PAGE_SIZE
    }

    /// Number of records to skip.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    /// Number of records to return.
    #[must_use]
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, 20)
    }
}

/// One page of results plus the total count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Records on this page.
    pub items: Vec<T>,
    /// Page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Total matching records across all pages.
    pub total: u64,
    /// True if more records exist after this page.
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Builds a page from its items and the total count.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        let has_more = request.offset() + (items.len() as u64) < total;
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total,
            has_more,
        }
    }

    /// Slices an already filtered and ordered collection into a page.
    #[must_use]
    pub fn from_sorted(all: Vec<T>, request: PageRequest) -> Self {
        let total = all.len() as u64;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items: Vec<T> = all
            .into_iter()
            .skip(offset)
            .take(request.page_size as usize)
            .collect();
        Self::new(items, request, total)
    }
}

/// Filter for trade listings. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeFilter {
    /// Match status to keep.
    pub match_status: Option<MatchStatus>,
    /// Instrument code to keep.
    pub instrument_code: Option<String>,
    /// Side to keep.
    pub side: Option<TradeSide>,
}

impl TradeFilter {
    /// Returns true if `trade` passes the filter.
    #[must_use]
    pub fn matches(&self, trade: &Trade) -> bool {
        self.match_status.is_none_or(|s| trade.match_status() == s)
            && self
                .instrument_code
                .as_deref()
                .is_none_or(|c| trade.instrument().code() == c)
            && self.side.is_none_or(|s| trade.side() == s)
    }
}

/// Filter for settlement listings. `None` means "any".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementFilter {
    /// Instrument code to keep.
    pub instrument_code: Option<String>,
}

impl SettlementFilter {
    /// Returns true if `settlement` passes the filter.
    #[must_use]
    pub fn matches(&self, settlement: &Settlement) -> bool {
        self.instrument_code
            .as_deref()
            .is_none_or(|c| settlement.instrument().code() == c)
    }
}

/// Allocates record identifiers.
///
/// Identifiers must be unique across every concurrent caller for the same
/// domain and owner, including callers in other processes sharing the store.
#[async_trait]
pub trait IdAllocator: Send + Sync + fmt::Debug {
    /// Allocates a new identifier.
    ///
    /// # Errors
    ///
    /// Returns a `RepositoryError` if the allocation backend is unavailable.
    async fn allocate(&self, domain: IdDomain, owner: &OwnerId) -> RepositoryResult<String>;
}

/// Durable collection of trades.
///
/// `try_mark_matched` is the only way a trade becomes matched, and it must be
/// a single atomic check-and-set in the backing store.
#[async_trait]
pub trait TradeLedger: Send + Sync + fmt::Debug {
    /// Inserts a new trade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the id already exists.
    async fn insert(&self, trade: &Trade) -> RepositoryResult<()>;

    /// Fetches a trade owned by `owner`.
    ///
    /// Returns `None` if it does not exist or belongs to someone else.
    async fn fetch(&self, owner: &OwnerId, id: &TradeId) -> RepositoryResult<Option<Trade>>;

    /// Atomically moves an unmatched trade to matched, recording
    /// `settlement_id`.
    ///
    /// Returns `Ok(false)` without side effects if the trade is already
    /// matched or no longer exists.
    async fn try_mark_matched(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        settlement_id: &SettlementId,
    ) -> RepositoryResult<bool>;

    /// Atomically undoes `try_mark_matched`, but only if the trade is matched
    /// to exactly `settlement_id`.
    ///
    /// Compensation only: used to roll back a settlement that failed to
    /// commit, never to unmatch a finalized settlement.
    async fn revert_match(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        settlement_id: &SettlementId,
    ) -> RepositoryResult<bool>;

    /// Applies owner edits to a trade's metadata.
    ///
    /// Returns `Ok(None)` if the trade does not exist.
    async fn update_details(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        update: TradeDetailsUpdate,
    ) -> RepositoryResult<Option<Trade>>;

    /// Deletes a trade, but only while it is unmatched.
    ///
    /// Returns `Ok(false)` if it is matched or does not exist.
    async fn delete_unmatched(&self, owner: &OwnerId, id: &TradeId) -> RepositoryResult<bool>;

    /// Lists an owner's trades, newest trade date first.
    async fn list(
        &self,
        owner: &OwnerId,
        filter: &TradeFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Trade>>;
}

/// Durable collection of settlements.
#[async_trait]
pub trait SettlementLedger: Send + Sync + fmt::Debug {
    /// Inserts a settlement.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Duplicate` if the id already exists.
    async fn insert(&self, settlement: &Settlement) -> RepositoryResult<()>;

    /// Fetches a settlement owned by `owner`, in any state.
    async fn fetch(
        &self,
        owner: &OwnerId,
        id: &SettlementId,
    ) -> RepositoryResult<Option<Settlement>>;

    /// Moves a pending settlement to finalized.
    ///
    /// Returns `Ok(false)` if it does not exist or is already finalized.
    async fn finalize(&self, owner: &OwnerId, id: &SettlementId) -> RepositoryResult<bool>;

    /// Updates the date and/or remark of a finalized settlement.
    ///
    /// Returns `Ok(true)` iff a finalized record existed and was updated.
    async fn update_metadata(
        &self,
        owner: &OwnerId,
        id: &SettlementId,
        date: Option<NaiveDate>,
        remark: Option<String>,
    ) -> RepositoryResult<bool>;

    /// Deletes a pending settlement. Used only for rollback.
    ///
    /// Returns `Ok(false)` if it does not exist or is finalized.
    async fn delete(&self, owner: &OwnerId, id: &SettlementId) -> RepositoryResult<bool>;

    /// Lists an owner's finalized settlements, newest date first.
    async fn list(
        &self,
        owner: &OwnerId,
        filter: &SettlementFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Settlement>>;

    /// Finds pending settlements created before `older_than`, across owners.
    async fn find_stale_pending(&self, older_than: Timestamp)
    -> RepositoryResult<Vec<Settlement>>;
}

/// Result of a transactional settlement commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Settlement inserted and both legs matched.
    Committed,
    /// A leg was matched by someone else; nothing was written.
    LegAlreadyMatched(TradeId),
}

/// Backends able to commit a settlement in one transaction.
///
/// The implementation inserts the (finalized) settlement and performs both
/// conditional leg updates inside a single transaction, rolling back if
/// either update loses.
#[async_trait]
pub trait AtomicSettlementWriter: Send + Sync + fmt::Debug {
    /// Commits `settlement` and both of its legs atomically.
    ///
    /// # Errors
    ///
    /// Returns a `RepositoryError` on backend failure; nothing is written.
    async fn commit_settlement(&self, settlement: &Settlement) -> RepositoryResult<CommitOutcome>;
}
