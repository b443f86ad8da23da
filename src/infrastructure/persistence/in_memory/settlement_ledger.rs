//! # In-Memory Settlement Ledger
//!
//! In-memory implementation of [`SettlementLedger`] for testing.
//!
//! This implementation uses a thread-safe `HashMap` for storage,
//! making it suitable for unit tests without database dependencies.

use crate::domain::entities::Settlement;
use crate::domain::value_objects::{OwnerId, SettlementId, Timestamp};
use crate::infrastructure::persistence::traits::{
    Page, PageRequest, RepositoryError, RepositoryResult, SettlementFilter, SettlementLedger,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory implementation of [`SettlementLedger`].
#[derive(Debug, Clone)]
pub struct InMemorySettlementLedger {
    storage: Arc<RwLock<HashMap<SettlementId, Settlement>>>,
}

impl InMemorySettlementLedger {
    /// Creates a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the number of stored settlements, pending included.
    pub async fn len(&self) -> usize {
        self.storage.read().await.len()
    }

    /// Returns true if no settlements are stored.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Returns every stored settlement regardless of owner or state.
    pub async fn snapshot(&self) -> Vec<Settlement> {
        self.storage.read().await.values().cloned().collect()
    }
}

impl Default for InMemorySettlementLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettlementLedger for InMemorySettlementLedger {
    async fn insert(&self, settlement: &Settlement) -> RepositoryResult<()> {
        let mut storage = self.storage.write().await;
        match storage.entry(settlement.id().clone()) {
            Entry::Occupied(_) => Err(RepositoryError::duplicate(
                "Settlement",
                settlement.id().as_str(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(settlement.clone());
                Ok(())
            }
        }
    }

    async fn fetch(
        &self,
        owner: &OwnerId,
        id: &SettlementId,
    ) -> RepositoryResult<Option<Settlement>> {
        let storage = self.storage.read().await;
        Ok(storage.get(id).filter(|s| s.owner_id() == owner).cloned())
    }

    async fn finalize(&self, owner: &OwnerId, id: &SettlementId) -> RepositoryResult<bool> {
        let mut storage = self.storage.write().await;
        Ok(storage
            .get_mut(id)
            .filter(|s| s.owner_id() == owner)
            .is_some_and(Settlement::finalize))
    }

    async fn update_metadata(
        &self,
        owner: &OwnerId,
        id: &SettlementId,
        date: Option<NaiveDate>,
        remark: Option<String>,
    ) -> RepositoryResult<bool> {
        let mut storage = self.storage.write().await;
        match storage.get_mut(id) {
            Some(s) if s.owner_id() == owner && s.is_finalized() => {
                s.apply_metadata(date, remark)
                    .map_err(|e| RepositoryError::internal(e.to_string()))?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, owner: &OwnerId, id: &SettlementId) -> RepositoryResult<bool> {
        let mut storage = self.storage.write().await;
        let removable = storage
            .get(id)
            .is_some_and(|s| s.owner_id() == owner && !s.is_finalized());
        if removable {
            storage.remove(id);
        }
        Ok(removable)
    }

    async fn list(
        &self,
        owner: &OwnerId,
        filter: &SettlementFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Settlement>> {
        let storage = self.storage.read().await;
        let mut items: Vec<Settlement> = storage
            .values()
            .filter(|s| s.owner_id() == owner && s.is_finalized() && filter.matches(s))
            .cloned()
            .collect();
        items.sort_by_key(|s| Reverse((s.date(), s.created_at(), s.id().clone())));
        Ok(Page::from_sorted(items, page))
    }

    async fn find_stale_pending(
        &self,
        older_than: Timestamp,
    ) -> RepositoryResult<Vec<Settlement>> {
        let storage = self.storage.read().await;
        Ok(storage
            .values()
            .filter(|s| !s.is_finalized() && s.created_at().is_before(&older_than))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::{SettlementDetails, Trade};
    use crate::domain::services::ProfitBreakdown;
    use crate::domain::value_objects::{
        Instrument, Market, Price, Quantity, SettlementStatus, TradeId, TradeSide,
    };
    use rust_decimal::Decimal;

    fn owner() -> OwnerId {
        OwnerId::new("owner-1")
    }

    fn settlement(id: &str, day: u32) -> Settlement {
        let leg = |tid: &str, side, cents| {
            Trade::new(
                TradeId::new(tid),
                owner(),
                Instrument::new("AAPL", "Apple", Market::Us).unwrap(),
                side,
                Price::from_decimal(Decimal::new(cents, 2)).unwrap(),
                Quantity::new(10).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            )
        };
        let buy = leg(&format!("{id}-buy"), TradeSide::Buy, 1000);
        let sell = leg(&format!("{id}-sell"), TradeSide::Sell, 1100);
        let breakdown = ProfitBreakdown::compute(
            buy.unit_price(),
            buy.quantity(),
            sell.unit_price(),
            sell.quantity(),
        )
        .unwrap();
        Settlement::open(
            SettlementId::new(id),
            &buy,
            &sell,
            breakdown,
            SettlementDetails::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn insert_is_unique() {
        let ledger = InMemorySettlementLedger::new();
        let s = settlement("tbill-1", 1);
        ledger.insert(&s).await.unwrap();
        assert!(ledger.insert(&s).await.unwrap_err().is_duplicate());
    }

    #[tokio::test]
    async fn finalize_once_then_metadata_editable() {
        let ledger = InMemorySettlementLedger::new();
        let s = settlement("tbill-1", 1);
        ledger.insert(&s).await.unwrap();

        assert!(
            !ledger
                .update_metadata(&owner(), s.id(), None, Some("early".into()))
                .await
                .unwrap()
        );
        assert!(ledger.finalize(&owner(), s.id()).await.unwrap());
        assert!(!ledger.finalize(&owner(), s.id()).await.unwrap());
        assert!(
            ledger
                .update_metadata(&owner(), s.id(), None, Some("late".into()))
                .await
                .unwrap()
        );

        let stored = ledger.fetch(&owner(), s.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), SettlementStatus::Finalized);
        assert_eq!(stored.remark(), Some("late"));
    }

    #[tokio::test]
    async fn delete_only_pending() {
        let ledger = InMemorySettlementLedger::new();
        let pending = settlement("tbill-1", 1);
        let done = settlement("tbill-2", 2).into_finalized();
        ledger.insert(&pending).await.unwrap();
        ledger.insert(&done).await.unwrap();

        assert!(ledger.delete(&owner(), pending.id()).await.unwrap());
        assert!(!ledger.delete(&owner(), done.id()).await.unwrap());
        assert_eq!(ledger.len().await, 1);
    }

    #[tokio::test]
    async fn list_hides_pending_and_sorts_by_date() {
        let ledger = InMemorySettlementLedger::new();
        ledger
            .insert(&settlement("tbill-1", 1).into_finalized())
            .await
            .unwrap();
        ledger
            .insert(&settlement("tbill-2", 5).into_finalized())
            .await
            .unwrap();
        ledger.insert(&settlement("tbill-3", 9)).await.unwrap();

        let page = ledger
            .list(&owner(), &SettlementFilter::default(), PageRequest::new(1, 10))
            .await
            .unwrap();
        let ids: Vec<&str> = page.items.iter().map(|s| s.id().as_str()).collect();
        assert_eq!(ids, vec!["tbill-2", "tbill-1"]);
        assert_eq!(page.total, 2);
    }

    #[tokio::test]
    async fn stale_pending_respects_cutoff() {
        let ledger = InMemorySettlementLedger::new();
        ledger.insert(&settlement("tbill-1", 1)).await.unwrap();
        ledger
            .insert(&settlement("tbill-2", 2).into_finalized())
            .await
            .unwrap();

        let future = Timestamp::now().add_secs(60);
        let past = Timestamp::now().sub_secs(60);
        assert_eq!(ledger.find_stale_pending(future).await.unwrap().len(), 1);
        assert!(ledger.find_stale_pending(past).await.unwrap().is_empty());
    }
}
