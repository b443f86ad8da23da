//! # Settlement Engine
//!
//! Closes a buy trade with a later sell trade of the same instrument into a
//! settlement, consuming both trades exactly once.
//!
//! # Commit Protocols
//!
//! With an [`AtomicSettlementWriter`] the settlement and both leg updates go
//! through one storage transaction. Without one, the engine runs a
//! compensating protocol:
//!
//! ```text
//! insert Pending ─▶ CAS buy ─▶ CAS sell ─▶ finalize ─▶ Finalized
//!                      │          │
//!                      └──lost────┴──▶ revert legs ─▶ delete Pending ─▶ AlreadyMatched
//! ```
//!
//! Each commit runs on a detached task, so dropping the caller's future
//! never leaves the protocol half-way. A caller that outwaits
//! [`EngineSettings::commit_deadline`] gets a retryable timeout while the
//! task runs on to completion or rollback. Pending records left behind by a
//! crashed process are rolled back by [`SettlementEngine::recover_pending`].
//!
//! # Examples
//!
//! ```ignore
//! let engine = SettlementEngine::new(trades, settlements, ids);
//! let settlement = engine
//!     .create_settlement(&owner, &buy_id, &sell_id, SettlementDetails::default())
//!     .await?;
//! ```

use crate::application::error::{ApplicationError, ApplicationResult, InfrastructureError};
use crate::application::services::retry::RetryPolicy;
use crate::domain::entities::{Settlement, SettlementDetails, Trade};
use crate::domain::services::{ProfitBreakdown, check_pair};
use crate::domain::value_objects::{IdDomain, OwnerId, SettlementId, Timestamp, TradeId};
use crate::infrastructure::persistence::{
    AtomicSettlementWriter, CommitOutcome, IdAllocator, Page, PageRequest, SettlementFilter,
    SettlementLedger, TradeLedger,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry budgets and deadline for the commit protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Budget for each forward step of a commit.
    pub commit_retry: RetryPolicy,
    /// Budget for each compensating step.
    pub rollback_retry: RetryPolicy,
    /// How long a caller waits for a commit. The commit itself is not
    /// cancelled when this elapses.
    pub commit_deadline: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            commit_retry: RetryPolicy::default(),
            rollback_retry: RetryPolicy::default(),
            commit_deadline: Duration::from_secs(30),
        }
    }
}

/// Requested change to a finalized settlement.
///
/// Only `date` and `remark` may change. Any other key in the request body
/// lands in `rejected` and fails the update, even when its value is `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementUpdate {
    /// New settlement date.
    pub date: Option<NaiveDate>,
    /// New remark; empty clears it.
    pub remark: Option<String>,
    /// Every other supplied key.
    #[serde(flatten)]
    pub rejected: BTreeMap<String, serde_json::Value>,
}

impl SettlementUpdate {
    /// Creates an update of the mutable fields only.
    #[must_use]
    pub fn metadata(date: Option<NaiveDate>, remark: Option<String>) -> Self {
        Self {
            date,
            remark,
            rejected: BTreeMap::new(),
        }
    }

    /// Names of non-editable fields present in the request, sorted.
    #[must_use]
    pub fn immutable_fields(&self) -> Vec<&str> {
        self.rejected.keys().map(String::as_str).collect()
    }
}

/// A settlement together with both of its trades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementView {
    /// The settlement record.
    pub settlement: Settlement,
    /// Its buy leg.
    pub buy_trade: Trade,
    /// Its sell leg.
    pub sell_trade: Trade,
}

/// Storage handles shared with detached commit tasks.
#[derive(Debug, Clone)]
struct Ledgers {
    trades: Arc<dyn TradeLedger>,
    settlements: Arc<dyn SettlementLedger>,
    atomic_writer: Option<Arc<dyn AtomicSettlementWriter>>,
    settings: EngineSettings,
}

/// Creates, reads and edits settlements.
///
/// Cheap to clone; share one instance across request handlers.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    ledgers: Ledgers,
    ids: Arc<dyn IdAllocator>,
}

impl SettlementEngine {
    /// Creates an engine using the compensating commit protocol.
    #[must_use]
    pub fn new(
        trades: Arc<dyn TradeLedger>,
        settlements: Arc<dyn SettlementLedger>,
        ids: Arc<dyn IdAllocator>,
    ) -> Self {
        Self {
            ledgers: Ledgers {
                trades,
                settlements,
                atomic_writer: None,
                settings: EngineSettings::default(),
            },
            ids,
        }
    }

    /// Commits through `writer` in a single transaction instead.
    #[must_use]
    pub fn with_atomic_writer(mut self, writer: Arc<dyn AtomicSettlementWriter>) -> Self {
        self.ledgers.atomic_writer = Some(writer);
        self
    }

    /// Overrides the retry budgets and commit deadline.
    #[must_use]
    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.ledgers.settings = settings;
        self
    }

    /// Returns the settings in use.
    #[must_use]
    pub fn settings(&self) -> EngineSettings {
        self.ledgers.settings
    }

    /// Closes `buy_id` with `sell_id`.
    ///
    /// # Errors
    ///
    /// - `Validation` if an id is empty or both ids are equal
    /// - `NotFound` if either trade does not exist for `owner`
    /// - `AlreadyMatched` if either trade is consumed, including by a
    ///   concurrent call that won the race
    /// - `InstrumentMismatch` / `SideMismatch` if the pair is ineligible
    /// - `Infrastructure` if storage keeps failing, or if the commit outlives
    ///   the deadline (it may still succeed)
    pub async fn create_settlement(
        &self,
        owner: &OwnerId,
        buy_id: &TradeId,
        sell_id: &TradeId,
        details: SettlementDetails,
    ) -> ApplicationResult<Settlement> {
        if owner.is_empty() {
            return Err(ApplicationError::unauthorized());
        }
        if buy_id.is_empty() || sell_id.is_empty() {
            return Err(ApplicationError::validation(
                "buy and sell trade ids are required",
            ));
        }
        if buy_id == sell_id {
            return Err(ApplicationError::validation(
                "buy and sell trade ids must differ",
            ));
        }

        let (buy, sell) = tokio::try_join!(
            self.ledgers.trades.fetch(owner, buy_id),
            self.ledgers.trades.fetch(owner, sell_id),
        )?;
        let buy = buy.ok_or_else(|| ApplicationError::not_found("Trade", buy_id.as_str()))?;
        let sell = sell.ok_or_else(|| ApplicationError::not_found("Trade", sell_id.as_str()))?;

        check_pair(&buy, &sell).inspect_err(|violation| {
            debug!(%owner, %buy_id, %sell_id, %violation, "pair rejected");
        })?;

        let breakdown = ProfitBreakdown::compute(
            buy.unit_price(),
            buy.quantity(),
            sell.unit_price(),
            sell.quantity(),
        )?;

        let id = SettlementId::new(self.ids.allocate(IdDomain::Settlement, owner).await?);
        let pending = Settlement::open(id, &buy, &sell, breakdown, details)?;

        let ledgers = self.ledgers.clone();
        let deadline = self.ledgers.settings.commit_deadline;
        let settlement_id = pending.id().clone();
        let task = tokio::spawn(async move { ledgers.commit(pending).await });
        let settlement = match tokio::time::timeout(deadline, task).await {
            Ok(joined) => joined
                .map_err(|e| ApplicationError::internal(format!("commit task failed: {}", e)))??,
            Err(_) => {
                warn!(%settlement_id, %owner, ?deadline, "commit still running after deadline");
                return Err(InfrastructureError::timeout(format!(
                    "settlement {} did not commit within {:?}",
                    settlement_id, deadline
                ))
                .into());
            }
        };

        info!(
            settlement_id = %settlement.id(),
            %owner,
            %buy_id,
            %sell_id,
            instrument = %settlement.instrument(),
            quantity = settlement.matched_quantity().get(),
            profit = %settlement.profit(),
            profit_rate = %settlement.profit_rate(),
            "settlement created"
        );
        Ok(settlement)
    }

    /// Changes the date and/or remark of a finalized settlement.
    ///
    /// # Errors
    ///
    /// - `Validation` if the update names any field besides date and remark,
    ///   or no field at all
    /// - `NotFound` if the settlement does not exist for `owner`
    pub async fn update_metadata(
        &self,
        owner: &OwnerId,
        id: &SettlementId,
        update: SettlementUpdate,
    ) -> ApplicationResult<Settlement> {
        let forbidden = update.immutable_fields();
        if !forbidden.is_empty() {
            return Err(ApplicationError::validation(format!(
                "immutable fields cannot be updated: {}",
                forbidden.join(", ")
            )));
        }
        if update.date.is_none() && update.remark.is_none() {
            return Err(ApplicationError::validation("no updatable fields supplied"));
        }

        let mut preview = self.fetch_finalized(owner, id).await?;
        preview.apply_metadata(update.date, update.remark.clone())?;

        let updated = self
            .ledgers
            .settlements
            .update_metadata(owner, id, update.date, update.remark)
            .await?;
        if !updated {
            return Err(ApplicationError::not_found("Settlement", id.as_str()));
        }

        debug!(settlement_id = %id, %owner, "settlement metadata updated");
        self.fetch_finalized(owner, id).await
    }

    /// Returns a finalized settlement with both trades.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the settlement is absent or not yet finalized
    /// - `Integrity` if a referenced trade is missing
    pub async fn get_settlement(
        &self,
        owner: &OwnerId,
        id: &SettlementId,
    ) -> ApplicationResult<SettlementView> {
        let settlement = self.fetch_finalized(owner, id).await?;

        let (buy, sell) = tokio::try_join!(
            self.ledgers.trades.fetch(owner, settlement.buy_trade_id()),
            self.ledgers.trades.fetch(owner, settlement.sell_trade_id()),
        )?;

        match (buy, sell) {
            (Some(buy_trade), Some(sell_trade)) => Ok(SettlementView {
                settlement,
                buy_trade,
                sell_trade,
            }),
            (buy, sell) => {
                error!(
                    settlement_id = %id,
                    %owner,
                    buy_missing = buy.is_none(),
                    sell_missing = sell.is_none(),
                    "settlement references a missing trade"
                );
                Err(ApplicationError::integrity(format!(
                    "settlement {} references a missing trade",
                    id
                )))
            }
        }
    }

    /// Lists finalized settlements, newest date first.
    ///
    /// # Errors
    ///
    /// Returns `Validation` unless `page >= 1` and `1 <= page_size <= 100`.
    pub async fn list_settlements(
        &self,
        owner: &OwnerId,
        filter: &SettlementFilter,
        page: PageRequest,
    ) -> ApplicationResult<Page<Settlement>> {
        if !page.is_valid() {
            return Err(ApplicationError::validation(format!(
                "invalid page {} / page size {}",
                page.page, page.page_size
            )));
        }
        Ok(self.ledgers.settlements.list(owner, filter, page).await?)
    }

    /// Rolls back pending settlements created before `older_than`.
    ///
    /// Returns the number of settlements rolled back.
    ///
    /// # Errors
    ///
    /// Returns `Infrastructure` if the pending scan fails. Failures on
    /// individual records are logged and skipped.
    pub async fn recover_pending(&self, older_than: Timestamp) -> ApplicationResult<usize> {
        let stale = self
            .ledgers
            .settlements
            .find_stale_pending(older_than)
            .await?;

        let mut recovered = 0;
        for settlement in stale {
            let owner = settlement.owner_id();
            // Deleting first wins any race with a finalize still in flight.
            match self.ledgers.settlements.delete(owner, settlement.id()).await {
                Ok(true) => {
                    self.ledgers.revert_legs(&settlement).await;
                    recovered += 1;
                    warn!(settlement_id = %settlement.id(), %owner, "stale pending settlement rolled back");
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(settlement_id = %settlement.id(), error = %e, "failed to delete stale pending settlement");
                }
            }
        }
        Ok(recovered)
    }

    async fn fetch_finalized(
        &self,
        owner: &OwnerId,
        id: &SettlementId,
    ) -> ApplicationResult<Settlement> {
        match self.ledgers.settlements.fetch(owner, id).await? {
            Some(s) if s.is_finalized() => Ok(s),
            _ => Err(ApplicationError::not_found("Settlement", id.as_str())),
        }
    }
}

impl Ledgers {
    async fn commit(&self, pending: Settlement) -> ApplicationResult<Settlement> {
        match &self.atomic_writer {
            Some(writer) => self.commit_atomic(writer.as_ref(), pending).await,
            None => self.commit_compensating(pending).await,
        }
    }

    async fn commit_atomic(
        &self,
        writer: &dyn AtomicSettlementWriter,
        pending: Settlement,
    ) -> ApplicationResult<Settlement> {
        let settlement = pending.into_finalized();
        let outcome = self
            .settings
            .commit_retry
            .run("commit_settlement", || writer.commit_settlement(&settlement))
            .await?;

        match outcome {
            CommitOutcome::Committed => Ok(settlement),
            CommitOutcome::LegAlreadyMatched(trade_id) => {
                // An earlier attempt may have committed before its reply was lost.
                if self.is_stored(&settlement).await {
                    return Ok(settlement);
                }
                warn!(settlement_id = %settlement.id(), %trade_id, "settlement lost race for leg");
                Err(ApplicationError::already_matched(trade_id))
            }
        }
    }

    async fn commit_compensating(&self, pending: Settlement) -> ApplicationResult<Settlement> {
        let retry = self.settings.commit_retry;

        if let Err(e) = retry
            .run("insert_pending", || self.settlements.insert(&pending))
            .await
        {
            self.rollback(&pending).await;
            return Err(e.into());
        }

        for leg in pending.legs() {
            match self.mark_leg(&pending, leg).await {
                Ok(true) => {}
                Ok(false) => {
                    warn!(settlement_id = %pending.id(), trade_id = %leg, "settlement lost race for leg");
                    self.rollback(&pending).await;
                    return Err(ApplicationError::already_matched(leg.clone()));
                }
                Err(e) => {
                    self.rollback(&pending).await;
                    return Err(e);
                }
            }
        }

        let owner = pending.owner_id();
        let finalized = retry
            .run("finalize", || self.settlements.finalize(owner, pending.id()))
            .await;

        match finalized {
            Ok(true) => Ok(pending.into_finalized()),
            Ok(false) => match self.settlements.fetch(owner, pending.id()).await {
                Ok(Some(stored)) if stored.is_finalized() => Ok(stored),
                _ => {
                    // Pending record was removed by recovery; give the legs back.
                    self.revert_legs(&pending).await;
                    Err(ApplicationError::internal(format!(
                        "settlement {} was rolled back before it could be finalized",
                        pending.id()
                    )))
                }
            },
            Err(e) => {
                // Outcome unknown: both legs are ours, recovery resolves the record.
                error!(
                    settlement_id = %pending.id(),
                    error = %e,
                    "finalize failed after retries, left pending for recovery"
                );
                Err(e.into())
            }
        }
    }

    /// Claims one leg. A `false` from the store is re-checked, since a
    /// retried CAS may report the effect of its own earlier attempt.
    async fn mark_leg(&self, pending: &Settlement, leg: &TradeId) -> ApplicationResult<bool> {
        let owner = pending.owner_id();
        let claimed = self
            .settings
            .commit_retry
            .run("mark_matched", || {
                self.trades.try_mark_matched(owner, leg, pending.id())
            })
            .await?;
        if claimed {
            return Ok(true);
        }

        let current = self.trades.fetch(owner, leg).await?;
        Ok(current.is_some_and(|t| t.settlement_id() == Some(pending.id())))
    }

    async fn rollback(&self, pending: &Settlement) {
        self.revert_legs(pending).await;

        let owner = pending.owner_id();
        let deleted = self
            .settings
            .rollback_retry
            .run("delete_pending", || self.settlements.delete(owner, pending.id()))
            .await;
        if let Err(e) = deleted {
            error!(
                settlement_id = %pending.id(),
                %owner,
                error = %e,
                "integrity anomaly: pending settlement not removed during rollback"
            );
        }
    }

    async fn revert_legs(&self, settlement: &Settlement) {
        let owner = settlement.owner_id();
        for leg in settlement.legs() {
            let reverted = self
                .settings
                .rollback_retry
                .run("revert_match", || {
                    self.trades.revert_match(owner, leg, settlement.id())
                })
                .await;
            match reverted {
                Ok(true) => debug!(settlement_id = %settlement.id(), trade_id = %leg, "leg released"),
                Ok(false) => {}
                Err(e) => error!(
                    settlement_id = %settlement.id(),
                    trade_id = %leg,
                    error = %e,
                    "integrity anomaly: leg could not be released"
                ),
            }
        }
    }

    async fn is_stored(&self, settlement: &Settlement) -> bool {
        matches!(
            self.settlements
                .fetch(settlement.owner_id(), settlement.id())
                .await,
            Ok(Some(_))
        )
    }
}
