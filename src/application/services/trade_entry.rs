//! # Trade Entry
//!
//! Recording, reading and editing an owner's trades.
//!
//! Trades enter the ledger unmatched. Only the settlement engine ever marks
//! them matched, after which they can no longer be deleted.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::domain::entities::{Trade, TradeDetailsUpdate};
use crate::domain::value_objects::{
    IdDomain, Instrument, Market, OwnerId, Price, Quantity, TradeId, TradeSide,
};
use crate::infrastructure::persistence::{IdAllocator, Page, PageRequest, TradeFilter, TradeLedger};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// A trade as submitted by its owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrade {
    /// Instrument code.
    pub instrument_code: String,
    /// Instrument display name.
    #[serde(default)]
    pub instrument_name: String,
    /// Listing market.
    pub market: Market,
    /// Buy or sell.
    pub side: TradeSide,
    /// Unit price.
    pub unit_price: Decimal,
    /// Share count.
    pub quantity: u64,
    /// Execution date.
    pub trade_date: NaiveDate,
    /// Free-text remark.
    #[serde(default)]
    pub remark: Option<String>,
}

/// Use cases for an owner's own trades.
#[derive(Debug, Clone)]
pub struct TradeEntryService {
    trades: Arc<dyn TradeLedger>,
    ids: Arc<dyn IdAllocator>,
}

impl TradeEntryService {
    /// Creates the service.
    #[must_use]
    pub fn new(trades: Arc<dyn TradeLedger>, ids: Arc<dyn IdAllocator>) -> Self {
        Self { trades, ids }
    }

    /// Validates and stores a new unmatched trade.
    ///
    /// # Errors
    ///
    /// Returns `Domain` for an invalid instrument, price, quantity or remark.
    pub async fn record_trade(&self, owner: &OwnerId, new: NewTrade) -> ApplicationResult<Trade> {
        require_owner(owner)?;

        let instrument = Instrument::new(&new.instrument_code, &new.instrument_name, new.market)?;
        let price = Price::from_decimal(new.unit_price)?;
        let quantity = Quantity::new(new.quantity)?;

        let id = TradeId::new(self.ids.allocate(IdDomain::Trade, owner).await?);
        let trade = Trade::new(
            id,
            owner.clone(),
            instrument,
            new.side,
            price,
            quantity,
            new.trade_date,
        )
        .with_remark(new.remark)?;

        self.trades.insert(&trade).await?;
        info!(
            trade_id = %trade.id(),
            %owner,
            side = %trade.side(),
            instrument = %trade.instrument(),
            quantity = trade.quantity().get(),
            price = %trade.unit_price(),
            "trade recorded"
        );
        Ok(trade)
    }

    /// Returns one trade.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the trade does not exist for `owner`.
    pub async fn get_trade(&self, owner: &OwnerId, id: &TradeId) -> ApplicationResult<Trade> {
        require_owner(owner)?;
        self.trades
            .fetch(owner, id)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Trade", id.as_str()))
    }

    /// Lists trades, newest trade date first.
    ///
    /// # Errors
    ///
    /// Returns `Validation` unless `page >= 1` and `1 <= page_size <= 100`.
    pub async fn list_trades(
        &self,
        owner: &OwnerId,
        filter: &TradeFilter,
        page: PageRequest,
    ) -> ApplicationResult<Page<Trade>> {
        require_owner(owner)?;
        if !page.is_valid() {
            return Err(ApplicationError::validation(format!(
                "invalid page {} / page size {}",
                page.page, page.page_size
            )));
        }
        Ok(self.trades.list(owner, filter, page).await?)
    }

    /// Edits the date and/or remark of a trade, matched or not.
    ///
    /// # Errors
    ///
    /// - `Validation` if the update is empty
    /// - `NotFound` if the trade does not exist for `owner`
    pub async fn update_trade_details(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        update: TradeDetailsUpdate,
    ) -> ApplicationResult<Trade> {
        require_owner(owner)?;
        if update.is_empty() {
            return Err(ApplicationError::validation("no updatable fields supplied"));
        }

        let mut preview = self.get_trade(owner, id).await?;
        preview.apply_details(update.clone())?;

        let trade = self
            .trades
            .update_details(owner, id, update)
            .await?
            .ok_or_else(|| ApplicationError::not_found("Trade", id.as_str()))?;
        debug!(trade_id = %id, %owner, "trade details updated");
        Ok(trade)
    }

    /// Deletes an unmatched trade.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the trade does not exist for `owner`
    /// - `TradeLocked` if it has been consumed by a settlement
    pub async fn delete_trade(&self, owner: &OwnerId, id: &TradeId) -> ApplicationResult<()> {
        require_owner(owner)?;
        if self.trades.delete_unmatched(owner, id).await? {
            info!(trade_id = %id, %owner, "trade deleted");
            return Ok(());
        }

        match self.trades.fetch(owner, id).await? {
            Some(trade) if trade.is_matched() => Err(ApplicationError::trade_locked(id.as_str())),
            Some(_) => Err(ApplicationError::internal(format!(
                "trade {} could not be deleted",
                id
            ))),
            None => Err(ApplicationError::not_found("Trade", id.as_str())),
        }
    }
}

fn require_owner(owner: &OwnerId) -> ApplicationResult<()> {
    if owner.is_empty() {
        return Err(ApplicationError::unauthorized());
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{MatchStatus, SettlementId};
    use crate::infrastructure::persistence::SequenceIdAllocator;
    use crate::infrastructure::persistence::in_memory::InMemoryTradeLedger;

    fn owner() -> OwnerId {
        OwnerId::new("owner-1")
    }

    fn new_trade(side: TradeSide) -> NewTrade {
        NewTrade {
            instrument_code: "000001".to_string(),
            instrument_name: "Ping An Bank".to_string(),
            market: Market::Shenzhen,
            side,
            unit_price: Decimal::new(1234, 2),
            quantity: 300,
            trade_date: NaiveDate::from_ymd_opt(2024, 8, 8).unwrap(),
            remark: Some("  opening  ".to_string()),
        }
    }

    fn service() -> (TradeEntryService, Arc<InMemoryTradeLedger>) {
        let ledger = Arc::new(InMemoryTradeLedger::new());
        let service = TradeEntryService::new(ledger.clone(), Arc::new(SequenceIdAllocator::new()));
        (service, ledger)
    }

    mod record {
        use super::*;

        #[tokio::test]
        async fn stores_unmatched_trade() {
            let (service, ledger) = service();
            let trade = service
                .record_trade(&owner(), new_trade(TradeSide::Buy))
                .await
                .unwrap();

            assert!(trade.id().as_str().starts_with("trade-"));
            assert_eq!(trade.match_status(), MatchStatus::Unmatched);
            assert_eq!(trade.remark(), Some("opening"));
            assert_eq!(ledger.len(), 1);
        }

        #[tokio::test]
        async fn zero_quantity_rejected() {
            let (service, ledger) = service();
            let mut input = new_trade(TradeSide::Buy);
            input.quantity = 0;

            let err = service.record_trade(&owner(), input).await.unwrap_err();
            assert!(matches!(err, ApplicationError::Domain(_)));
            assert!(ledger.is_empty());
        }

        #[tokio::test]
        async fn negative_price_rejected() {
            let (service, _) = service();
            let mut input = new_trade(TradeSide::Sell);
            input.unit_price = Decimal::new(-1, 0);

            let err = service.record_trade(&owner(), input).await.unwrap_err();
            assert!(matches!(err, ApplicationError::Domain(_)));
        }

        #[tokio::test]
        async fn anonymous_owner_unauthorized() {
            let (service, _) = service();
            let err = service
                .record_trade(&OwnerId::new(""), new_trade(TradeSide::Buy))
                .await
                .unwrap_err();
            assert!(err.is_unauthorized());
        }
    }

    mod edit_and_delete {
        use super::*;

        #[tokio::test]
        async fn updates_remark() {
            let (service, _) = service();
            let trade = service
                .record_trade(&owner(), new_trade(TradeSide::Buy))
                .await
                .unwrap();

            let updated = service
                .update_trade_details(
                    &owner(),
                    trade.id(),
                    TradeDetailsUpdate {
                        trade_date: None,
                        remark: Some("revised".to_string()),
                    },
                )
                .await
                .unwrap();
            assert_eq!(updated.remark(), Some("revised"));
            assert_eq!(updated.unit_price(), trade.unit_price());
        }

        #[tokio::test]
        async fn empty_update_rejected() {
            let (service, _) = service();
            let trade = service
                .record_trade(&owner(), new_trade(TradeSide::Buy))
                .await
                .unwrap();
            let err = service
                .update_trade_details(&owner(), trade.id(), TradeDetailsUpdate::default())
                .await
                .unwrap_err();
            assert!(err.is_validation());
        }

        #[tokio::test]
        async fn delete_unmatched() {
            let (service, ledger) = service();
            let trade = service
                .record_trade(&owner(), new_trade(TradeSide::Buy))
                .await
                .unwrap();

            service.delete_trade(&owner(), trade.id()).await.unwrap();
            assert!(ledger.is_empty());
        }

        #[tokio::test]
        async fn delete_matched_is_locked() {
            let (service, ledger) = service();
            let trade = service
                .record_trade(&owner(), new_trade(TradeSide::Buy))
                .await
                .unwrap();
            ledger
                .try_mark_matched(&owner(), trade.id(), &SettlementId::new("tbill-1"))
                .await
                .unwrap();

            let err = service.delete_trade(&owner(), trade.id()).await.unwrap_err();
            assert!(matches!(err, ApplicationError::TradeLocked(_)));
            assert_eq!(ledger.len(), 1);
        }

        #[tokio::test]
        async fn delete_missing_not_found() {
            let (service, _) = service();
            let err = service
                .delete_trade(&owner(), &TradeId::new("ghost"))
                .await
                .unwrap_err();
            assert!(err.is_not_found());
        }
    }

    #[tokio::test]
    async fn list_rejects_oversized_pages() {
        let (service, _) = service();
        let err = service
            .list_trades(&owner(), &TradeFilter::default(), PageRequest::new(1, 500))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }
}
