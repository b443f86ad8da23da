//! # In-Memory Trade Ledger
//!
//! In-memory implementation of [`TradeLedger`] for tests and single-process
//! deployments.
//!
//! Uses [`DashMap`] keyed by trade identifier. Every match-status transition
//! runs under the entry's shard lock, which makes
//! [`try_mark_matched`](TradeLedger::try_mark_matched) a true compare-and-set.
//!
//! # Examples
//!
//! ```
//! use tbill_ledger::infrastructure::persistence::in_memory::InMemoryTradeLedger;
//!
//! let ledger = InMemoryTradeLedger::new();
//! assert!(ledger.is_empty());
//! ```

use crate::domain::entities::{Trade, TradeDetailsUpdate};
use crate::domain::value_objects::{OwnerId, SettlementId, TradeId};
use crate::infrastructure::persistence::traits::{
    Page, PageRequest, RepositoryError, RepositoryResult, TradeFilter, TradeLedger,
};
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::cmp::Reverse;

/// In-memory implementation of [`TradeLedger`].
///
/// # Thread Safety
///
/// Safe to share across tasks; per-trade updates are serialized by the
/// `DashMap` shard holding the entry.
#[derive(Debug, Default)]
pub struct InMemoryTradeLedger {
    trades: DashMap<TradeId, Trade>,
}

impl InMemoryTradeLedger {
    /// Creates a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored trades across all owners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trades.len()
    }

    /// Returns true if no trades are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}

#[async_trait]
impl TradeLedger for InMemoryTradeLedger {
    async fn insert(&self, trade: &Trade) -> RepositoryResult<()> {
        match self.trades.entry(trade.id().clone()) {
            Entry::Occupied(_) => Err(RepositoryError::duplicate("Trade", trade.id().as_str())),
            Entry::Vacant(slot) => {
                slot.insert(trade.clone());
                Ok(())
            }
        }
    }

    async fn fetch(&self, owner: &OwnerId, id: &TradeId) -> RepositoryResult<Option<Trade>> {
        Ok(self
            .trades
            .get(id)
            .filter(|t| t.owner_id() == owner)
            .map(|t| t.value().clone()))
    }

    async fn try_mark_matched(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        settlement_id: &SettlementId,
    ) -> RepositoryResult<bool> {
        match self.trades.get_mut(id) {
            Some(mut trade) if trade.owner_id() == owner => {
                Ok(trade.mark_matched(settlement_id.clone()))
            }
            _ => Ok(false),
        }
    }

    async fn revert_match(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        settlement_id: &SettlementId,
    ) -> RepositoryResult<bool> {
        match self.trades.get_mut(id) {
            Some(mut trade) if trade.owner_id() == owner => Ok(trade.revert_match(settlement_id)),
            _ => Ok(false),
        }
    }

    async fn update_details(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        update: TradeDetailsUpdate,
    ) -> RepositoryResult<Option<Trade>> {
        match self.trades.get_mut(id) {
            Some(mut trade) if trade.owner_id() == owner => {
                trade
                    .apply_details(update)
                    .map_err(|e| RepositoryError::internal(e.to_string()))?;
                Ok(Some(trade.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_unmatched(&self, owner: &OwnerId, id: &TradeId) -> RepositoryResult<bool> {
        Ok(self
            .trades
            .remove_if(id, |_, t| t.owner_id() == owner && !t.is_matched())
            .is_some())
    }

    async fn list(
        &self,
        owner: &OwnerId,
        filter: &TradeFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Trade>> {
        let mut trades: Vec<Trade> = self
            .trades
            .iter()
            .filter(|entry| entry.owner_id() == owner && filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        trades.sort_by_key(|t| Reverse((t.trade_date(), t.created_at(), t.id().clone())));
        Ok(Page::from_sorted(trades, page))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Instrument, Market, MatchStatus, Price, Quantity, TradeSide};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::sync::Arc;

    fn owner() -> OwnerId {
        OwnerId::new("owner-1")
    }

    fn trade(id: &str, side: TradeSide, day: u32) -> Trade {
        Trade::new(
            TradeId::new(id),
            owner(),
            Instrument::new("600000", "Pudong Bank", Market::Shanghai).unwrap(),
            side,
            Price::from_decimal(Decimal::new(1000, 2)).unwrap(),
            Quantity::new(100).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
        )
    }

    mod insert_and_fetch {
        use super::*;

        #[tokio::test]
        async fn insert_then_fetch() {
            let ledger = InMemoryTradeLedger::new();
            let t = trade("t-1", TradeSide::Buy, 1);
            ledger.insert(&t).await.unwrap();

            let found = ledger.fetch(&owner(), t.id()).await.unwrap();
            assert_eq!(found, Some(t));
            assert_eq!(ledger.len(), 1);
        }

        #[tokio::test]
        async fn duplicate_insert_rejected() {
            let ledger = InMemoryTradeLedger::new();
            let t = trade("t-1", TradeSide::Buy, 1);
            ledger.insert(&t).await.unwrap();

            let err = ledger.insert(&t).await.unwrap_err();
            assert!(err.is_duplicate());
        }

        #[tokio::test]
        async fn other_owner_cannot_see_trade() {
            let ledger = InMemoryTradeLedger::new();
            let t = trade("t-1", TradeSide::Buy, 1);
            ledger.insert(&t).await.unwrap();

            let found = ledger.fetch(&OwnerId::new("intruder"), t.id()).await.unwrap();
            assert!(found.is_none());
        }
    }

    mod matching {
        use super::*;

        #[tokio::test]
        async fn mark_matched_succeeds_once() {
            let ledger = InMemoryTradeLedger::new();
            let t = trade("t-1", TradeSide::Buy, 1);
            ledger.insert(&t).await.unwrap();

            let first = ledger
                .try_mark_matched(&owner(), t.id(), &SettlementId::new("tbill-1"))
                .await
                .unwrap();
            let second = ledger
                .try_mark_matched(&owner(), t.id(), &SettlementId::new("tbill-2"))
                .await
                .unwrap();

            assert!(first);
            assert!(!second);
            let stored = ledger.fetch(&owner(), t.id()).await.unwrap().unwrap();
            assert_eq!(stored.settlement_id(), Some(&SettlementId::new("tbill-1")));
        }

        #[tokio::test]
        async fn mark_missing_trade_returns_false() {
            let ledger = InMemoryTradeLedger::new();
            let ok = ledger
                .try_mark_matched(&owner(), &TradeId::new("nope"), &SettlementId::new("s"))
                .await
                .unwrap();
            assert!(!ok);
        }

        #[tokio::test]
        async fn revert_only_for_owning_settlement() {
            let ledger = InMemoryTradeLedger::new();
            let t = trade("t-1", TradeSide::Buy, 1);
            ledger.insert(&t).await.unwrap();
            let s1 = SettlementId::new("tbill-1");
            ledger.try_mark_matched(&owner(), t.id(), &s1).await.unwrap();

            assert!(
                !ledger
                    .revert_match(&owner(), t.id(), &SettlementId::new("tbill-9"))
                    .await
                    .unwrap()
            );
            assert!(ledger.revert_match(&owner(), t.id(), &s1).await.unwrap());

            let stored = ledger.fetch(&owner(), t.id()).await.unwrap().unwrap();
            assert_eq!(stored.match_status(), MatchStatus::Unmatched);
        }

        #[tokio::test]
        async fn concurrent_marks_have_single_winner() {
            let ledger = Arc::new(InMemoryTradeLedger::new());
            let t = trade("t-1", TradeSide::Buy, 1);
            ledger.insert(&t).await.unwrap();

            let mut handles = Vec::new();
            for i in 0..16 {
                let ledger = Arc::clone(&ledger);
                handles.push(tokio::spawn(async move {
                    ledger
                        .try_mark_matched(
                            &owner(),
                            &TradeId::new("t-1"),
                            &SettlementId::new(format!("tbill-{i}")),
                        )
                        .await
                        .unwrap()
                }));
            }

            let mut wins = 0;
            for handle in handles {
                if handle.await.unwrap() {
                    wins += 1;
                }
            }
            assert_eq!(wins, 1);
        }
    }

    mod mutation {
        use super::*;

        #[tokio::test]
        async fn delete_refuses_matched_trade() {
            let ledger = InMemoryTradeLedger::new();
            let t = trade("t-1", TradeSide::Buy, 1);
            ledger.insert(&t).await.unwrap();
            ledger
                .try_mark_matched(&owner(), t.id(), &SettlementId::new("tbill-1"))
                .await
                .unwrap();

            assert!(!ledger.delete_unmatched(&owner(), t.id()).await.unwrap());
            assert_eq!(ledger.len(), 1);
        }

        #[tokio::test]
        async fn delete_unmatched_trade() {
            let ledger = InMemoryTradeLedger::new();
            let t = trade("t-1", TradeSide::Buy, 1);
            ledger.insert(&t).await.unwrap();

            assert!(ledger.delete_unmatched(&owner(), t.id()).await.unwrap());
            assert!(ledger.is_empty());
        }

        #[tokio::test]
        async fn update_details_returns_new_state() {
            let ledger = InMemoryTradeLedger::new();
            let t = trade("t-1", TradeSide::Buy, 1);
            ledger.insert(&t).await.unwrap();

            let updated = ledger
                .update_details(
                    &owner(),
                    t.id(),
                    TradeDetailsUpdate {
                        trade_date: None,
                        remark: Some("note".to_string()),
                    },
                )
                .await
                .unwrap()
                .unwrap();
            assert_eq!(updated.remark(), Some("note"));
        }
    }

    mod listing {
        use super::*;

        #[tokio::test]
        async fn lists_newest_first_with_filter() {
            let ledger = InMemoryTradeLedger::new();
            ledger.insert(&trade("a", TradeSide::Buy, 1)).await.unwrap();
            ledger.insert(&trade("b", TradeSide::Sell, 3)).await.unwrap();
            ledger.insert(&trade("c", TradeSide::Buy, 2)).await.unwrap();

            let all = ledger
                .list(&owner(), &TradeFilter::default(), PageRequest::new(1, 10))
                .await
                .unwrap();
            let ids: Vec<&str> = all.items.iter().map(|t| t.id().as_str()).collect();
            assert_eq!(ids, vec!["b", "c", "a"]);

            let buys = ledger
                .list(
                    &owner(),
                    &TradeFilter {
                        side: Some(TradeSide::Buy),
                        ..TradeFilter::default()
                    },
                    PageRequest::new(1, 10),
                )
                .await
                .unwrap();
            assert_eq!(buys.total, 2);
        }
    }
}
