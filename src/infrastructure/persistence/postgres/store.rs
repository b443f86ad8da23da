//! # PostgreSQL Ledger Store
//!
//! PostgreSQL implementation of every persistence port using sqlx.
//!
//! Match-status transitions are conditional `UPDATE ... WHERE match_status =
//! 'unmatched'` statements whose `rows_affected` decides the winner, and
//! [`AtomicSettlementWriter::commit_settlement`] runs both leg updates plus
//! the settlement insert in one transaction.

use crate::domain::entities::{
    Settlement, SettlementParts, Trade, TradeDetailsUpdate, TradeParts,
};
use crate::domain::value_objects::{
    IdDomain, Instrument, Market, MatchStatus, OwnerId, Price, Quantity, SettlementId,
    SettlementStatus, Timestamp, TradeId, TradeSide,
};
use crate::infrastructure::persistence::traits::{
    AtomicSettlementWriter, CommitOutcome, IdAllocator, Page, PageRequest, RepositoryError,
    RepositoryResult, SettlementFilter, SettlementLedger, TradeFilter, TradeLedger,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::str::FromStr;
use tracing::{debug, info, warn};

const TRADE_COLUMNS: &str = "id, owner_id, instrument_code, instrument_name, market, side, \
     unit_price, quantity, trade_date, remark, match_status, settlement_id, created_at, updated_at";

const SETTLEMENT_COLUMNS: &str = "id, owner_id, buy_trade_id, sell_trade_id, instrument_code, \
     instrument_name, market, buy_price, sell_price, matched_quantity, profit, profit_rate, \
     remark, settlement_date, status, created_at, updated_at";

/// PostgreSQL-backed ledger.
///
/// # Examples
///
/// ```ignore
/// use tbill_ledger::infrastructure::persistence::postgres::PostgresStore;
///
/// let store = PostgresStore::connect("postgres://...", 10).await?;
/// store.run_migrations().await?;
/// ```
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store from an existing pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connects to `database_url` with a bounded pool.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Connection` if the database is unreachable.
    pub async fn connect(database_url: &str, max_connections: u32) -> RepositoryResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| RepositoryError::connection(format!("failed to connect: {}", e)))?;
        info!(max_connections, "connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates tables, indexes and the id sequence if missing.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Query` if the migration fails.
    pub async fn run_migrations(&self) -> RepositoryResult<()> {
        let migration_sql = include_str!("../../../../migrations/001_create_ledger.sql");
        sqlx::raw_sql(migration_sql)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::query(format!("migration failed: {}", e)))?;
        info!("ledger migrations completed");
        Ok(())
    }
}

fn map_sqlx(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::connection(e.to_string())
        }
        other => RepositoryError::query(other.to_string()),
    }
}

fn map_insert(entity_type: &'static str, id: &str, e: sqlx::Error) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::duplicate(entity_type, id)
        }
        _ => map_sqlx(e),
    }
}

fn as_i64(value: u64) -> RepositoryResult<i64> {
    i64::try_from(value).map_err(|e| RepositoryError::serialization(e.to_string()))
}

#[async_trait]
impl IdAllocator for PostgresStore {
    async fn allocate(&self, domain: IdDomain, _owner: &OwnerId) -> RepositoryResult<String> {
        let (seq,): (i64,) = sqlx::query_as("SELECT nextval('ledger_id_seq')")
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(format!("{}-{:012}", domain.prefix(), seq))
    }
}

#[async_trait]
impl TradeLedger for PostgresStore {
    async fn insert(&self, trade: &Trade) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO trades (
                id, owner_id, instrument_code, instrument_name, market, side,
                unit_price, quantity, trade_date, remark, match_status,
                settlement_id, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(trade.id().as_str())
        .bind(trade.owner_id().as_str())
        .bind(trade.instrument().code())
        .bind(trade.instrument().name())
        .bind(trade.instrument().market().code())
        .bind(trade.side().as_str())
        .bind(trade.unit_price().get())
        .bind(as_i64(trade.quantity().get())?)
        .bind(trade.trade_date())
        .bind(trade.remark())
        .bind(trade.match_status().as_str())
        .bind(trade.settlement_id().map(SettlementId::as_str))
        .bind(DateTime::<Utc>::from(trade.created_at()))
        .bind(DateTime::<Utc>::from(trade.updated_at()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert("Trade", trade.id().as_str(), e))?;
        Ok(())
    }

    async fn fetch(&self, owner: &OwnerId, id: &TradeId) -> RepositoryResult<Option<Trade>> {
        let sql = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = $1 AND owner_id = $2");
        let row: Option<TradeRow> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .bind(owner.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(TradeRow::try_into_trade).transpose()
    }

    async fn try_mark_matched(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        settlement_id: &SettlementId,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trades
            SET match_status = 'matched', settlement_id = $3, updated_at = $4
            WHERE id = $1 AND owner_id = $2 AND match_status = 'unmatched'
            "#,
        )
        .bind(id.as_str())
        .bind(owner.as_str())
        .bind(settlement_id.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() == 1)
    }

    async fn revert_match(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        settlement_id: &SettlementId,
    ) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE trades
            SET match_status = 'unmatched', settlement_id = NULL, updated_at = $4
            WHERE id = $1 AND owner_id = $2
              AND match_status = 'matched' AND settlement_id = $3
            "#,
        )
        .bind(id.as_str())
        .bind(owner.as_str())
        .bind(settlement_id.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_details(
        &self,
        owner: &OwnerId,
        id: &TradeId,
        update: TradeDetailsUpdate,
    ) -> RepositoryResult<Option<Trade>> {
        let Some(mut trade) = TradeLedger::fetch(self, owner, id).await? else {
            return Ok(None);
        };
        trade
            .apply_details(update)
            .map_err(|e| RepositoryError::internal(e.to_string()))?;

        // Matching columns are left alone so a concurrent match is never undone.
        let sql = format!(
            "UPDATE trades SET trade_date = $3, remark = $4, updated_at = $5 \
             WHERE id = $1 AND owner_id = $2 RETURNING {TRADE_COLUMNS}"
        );
        let row: Option<TradeRow> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .bind(owner.as_str())
            .bind(trade.trade_date())
            .bind(trade.remark())
            .bind(DateTime::<Utc>::from(trade.updated_at()))
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(TradeRow::try_into_trade).transpose()
    }

    async fn delete_unmatched(&self, owner: &OwnerId, id: &TradeId) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "DELETE FROM trades WHERE id = $1 AND owner_id = $2 AND match_status = 'unmatched'",
        )
        .bind(id.as_str())
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() == 1)
    }

    async fn list(
        &self,
        owner: &OwnerId,
        filter: &TradeFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Trade>> {
        const WHERE: &str = "owner_id = $1 \
             AND ($2::TEXT IS NULL OR match_status = $2) \
             AND ($3::TEXT IS NULL OR instrument_code = $3) \
             AND ($4::TEXT IS NULL OR side = $4)";

        let status = filter.match_status.map(MatchStatus::as_str);
        let side = filter.side.map(TradeSide::as_str);

        let count_sql = format!("SELECT COUNT(*) FROM trades WHERE {WHERE}");
        let (total,): (i64,) = sqlx::query_as(&count_sql)
            .bind(owner.as_str())
            .bind(status)
            .bind(filter.instrument_code.as_deref())
            .bind(side)
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let sql = format!(
            "SELECT {TRADE_COLUMNS} FROM trades WHERE {WHERE} \
             ORDER BY trade_date DESC, created_at DESC, id DESC LIMIT $5 OFFSET $6"
        );
        let rows: Vec<TradeRow> = sqlx::query_as(&sql)
            .bind(owner.as_str())
            .bind(status)
            .bind(filter.instrument_code.as_deref())
            .bind(side)
            .bind(as_i64(page.limit())?)
            .bind(as_i64(page.offset())?)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let items = rows
            .into_iter()
            .map(TradeRow::try_into_trade)
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok(Page::new(items, page, u64::try_from(total).unwrap_or(0)))
    }
}

#[async_trait]
impl SettlementLedger for PostgresStore {
    async fn insert(&self, settlement: &Settlement) -> RepositoryResult<()> {
        insert_settlement(&self.pool, settlement).await
    }

    async fn fetch(
        &self,
        owner: &OwnerId,
        id: &SettlementId,
    ) -> RepositoryResult<Option<Settlement>> {
        let sql =
            format!("SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE id = $1 AND owner_id = $2");
        let row: Option<SettlementRow> = sqlx::query_as(&sql)
            .bind(id.as_str())
            .bind(owner.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        row.map(SettlementRow::try_into_settlement).transpose()
    }

    async fn finalize(&self, owner: &OwnerId, id: &SettlementId) -> RepositoryResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE settlements SET status = 'finalized', updated_at = $3
            WHERE id = $1 AND owner_id = $2 AND status = 'pending'
            "#,
        )
        .bind(id.as_str())
        .bind(owner.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() == 1)
    }

    async fn update_metadata(
        &self,
        owner: &OwnerId,
        id: &SettlementId,
        date: Option<NaiveDate>,
        remark: Option<String>,
    ) -> RepositoryResult<bool> {
        let Some(mut settlement) = SettlementLedger::fetch(self, owner, id).await? else {
            return Ok(false);
        };
        if !settlement.is_finalized() {
            return Ok(false);
        }
        settlement
            .apply_metadata(date, remark)
            .map_err(|e| RepositoryError::internal(e.to_string()))?;

        let result = sqlx::query(
            r#"
            UPDATE settlements SET settlement_date = $3, remark = $4, updated_at = $5
            WHERE id = $1 AND owner_id = $2 AND status = 'finalized'
            "#,
        )
        .bind(id.as_str())
        .bind(owner.as_str())
        .bind(settlement.date())
        .bind(settlement.remark())
        .bind(DateTime::<Utc>::from(settlement.updated_at()))
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() == 1)
    }

    async fn delete(&self, owner: &OwnerId, id: &SettlementId) -> RepositoryResult<bool> {
        let result = sqlx::query(
            "DELETE FROM settlements WHERE id = $1 AND owner_id = $2 AND status = 'pending'",
        )
        .bind(id.as_str())
        .bind(owner.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx)?;
        Ok(result.rows_affected() == 1)
    }

    async fn list(
        &self,
        owner: &OwnerId,
        filter: &SettlementFilter,
        page: PageRequest,
    ) -> RepositoryResult<Page<Settlement>> {
        const WHERE: &str = "owner_id = $1 AND status = 'finalized' \
             AND ($2::TEXT IS NULL OR instrument_code = $2)";

        let count_sql = format!("SELECT COUNT(*) FROM settlements WHERE {WHERE}");
        let (total,): (i64,) = sqlx::query_as(&count_sql)
            .bind(owner.as_str())
            .bind(filter.instrument_code.as_deref())
            .fetch_one(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let sql = format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements WHERE {WHERE} \
             ORDER BY settlement_date DESC, created_at DESC, id DESC LIMIT $3 OFFSET $4"
        );
        let rows: Vec<SettlementRow> = sqlx::query_as(&sql)
            .bind(owner.as_str())
            .bind(filter.instrument_code.as_deref())
            .bind(as_i64(page.limit())?)
            .bind(as_i64(page.offset())?)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;

        let items = rows
            .into_iter()
            .map(SettlementRow::try_into_settlement)
            .collect::<RepositoryResult<Vec<_>>>()?;
        Ok(Page::new(items, page, u64::try_from(total).unwrap_or(0)))
    }

    async fn find_stale_pending(
        &self,
        older_than: Timestamp,
    ) -> RepositoryResult<Vec<Settlement>> {
        let sql = format!(
            "SELECT {SETTLEMENT_COLUMNS} FROM settlements \
             WHERE status = 'pending' AND created_at < $1 ORDER BY created_at ASC"
        );
        let rows: Vec<SettlementRow> = sqlx::query_as(&sql)
            .bind(DateTime::<Utc>::from(older_than))
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx)?;
        rows.into_iter()
            .map(SettlementRow::try_into_settlement)
            .collect()
    }
}

#[async_trait]
impl AtomicSettlementWriter for PostgresStore {
    async fn commit_settlement(&self, settlement: &Settlement) -> RepositoryResult<CommitOutcome> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx)?;
        let now = Utc::now();

        for leg in settlement.legs() {
            let result = sqlx::query(
                r#"
                UPDATE trades
                SET match_status = 'matched', settlement_id = $3, updated_at = $4
                WHERE id = $1 AND owner_id = $2 AND match_status = 'unmatched'
                "#,
            )
            .bind(leg.as_str())
            .bind(settlement.owner_id().as_str())
            .bind(settlement.id().as_str())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx)?;

            if result.rows_affected() != 1 {
                tx.rollback().await.map_err(map_sqlx)?;
                debug!(trade_id = %leg, settlement_id = %settlement.id(), "leg already matched, transaction rolled back");
                return Ok(CommitOutcome::LegAlreadyMatched(leg.clone()));
            }
        }

        insert_settlement(&mut *tx, settlement).await?;
        tx.commit().await.map_err(map_sqlx)?;
        Ok(CommitOutcome::Committed)
    }
}

async fn insert_settlement<'e, E>(executor: E, settlement: &Settlement) -> RepositoryResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Postgres>,
{
    sqlx::query(
        r#"
        INSERT INTO settlements (
            id, owner_id, buy_trade_id, sell_trade_id, instrument_code,
            instrument_name, market, buy_price, sell_price, matched_quantity,
            profit, profit_rate, remark, settlement_date, status,
            created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        "#,
    )
    .bind(settlement.id().as_str())
    .bind(settlement.owner_id().as_str())
    .bind(settlement.buy_trade_id().as_str())
    .bind(settlement.sell_trade_id().as_str())
    .bind(settlement.instrument().code())
    .bind(settlement.instrument().name())
    .bind(settlement.instrument().market().code())
    .bind(settlement.buy_price().get())
    .bind(settlement.sell_price().get())
    .bind(as_i64(settlement.matched_quantity().get())?)
    .bind(settlement.profit())
    .bind(settlement.profit_rate())
    .bind(settlement.remark())
    .bind(settlement.date())
    .bind(settlement.status().as_str())
    .bind(DateTime::<Utc>::from(settlement.created_at()))
    .bind(DateTime::<Utc>::from(settlement.updated_at()))
    .execute(executor)
    .await
    .map_err(|e| {
        let err = map_insert("Settlement", settlement.id().as_str(), e);
        if err.is_duplicate() {
            warn!(settlement_id = %settlement.id(), "settlement insert hit a unique constraint");
        }
        err
    })?;
    Ok(())
}

fn parse_column<T>(column: &str, raw: &str) -> RepositoryResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    T::from_str(raw)
        .map_err(|e| RepositoryError::serialization(format!("column {}: {}", column, e)))
}

fn decode_price(column: &str, value: Decimal) -> RepositoryResult<Price> {
    Price::from_decimal(value)
        .map_err(|e| RepositoryError::serialization(format!("column {}: {}", column, e)))
}

fn decode_quantity(column: &str, value: i64) -> RepositoryResult<Quantity> {
    Quantity::try_from(value)
        .map_err(|e| RepositoryError::serialization(format!("column {}: {}", column, e)))
}

/// Row type for trade queries.
#[derive(Debug, Clone, sqlx::FromRow)]
struct TradeRow {
    id: String,
    owner_id: String,
    instrument_code: String,
    instrument_name: String,
    market: String,
    side: String,
    unit_price: Decimal,
    quantity: i64,
    trade_date: NaiveDate,
    remark: Option<String>,
    match_status: String,
    settlement_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TradeRow {
    fn try_into_trade(self) -> RepositoryResult<Trade> {
        let market: Market = parse_column("market", &self.market)?;
        Ok(Trade::from_parts(TradeParts {
            id: TradeId::new(self.id),
            owner_id: OwnerId::new(self.owner_id),
            instrument: Instrument::from_parts(self.instrument_code, self.instrument_name, market),
            side: parse_column("side", &self.side)?,
            unit_price: decode_price("unit_price", self.unit_price)?,
            quantity: decode_quantity("quantity", self.quantity)?,
            trade_date: self.trade_date,
            remark: self.remark,
            match_status: parse_column("match_status", &self.match_status)?,
            settlement_id: self.settlement_id.map(SettlementId::new),
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        }))
    }
}

/// Row type for settlement queries.
#[derive(Debug, Clone, sqlx::FromRow)]
struct SettlementRow {
    id: String,
    owner_id: String,
    buy_trade_id: String,
    sell_trade_id: String,
    instrument_code: String,
    instrument_name: String,
    market: String,
    buy_price: Decimal,
    sell_price: Decimal,
    matched_quantity: i64,
    profit: Decimal,
    profit_rate: Decimal,
    remark: Option<String>,
    settlement_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SettlementRow {
    fn try_into_settlement(self) -> RepositoryResult<Settlement> {
        let market: Market = parse_column("market", &self.market)?;
        let status: SettlementStatus = parse_column("status", &self.status)?;
        Ok(Settlement::from_parts(SettlementParts {
            id: SettlementId::new(self.id),
            owner_id: OwnerId::new(self.owner_id),
            buy_trade_id: TradeId::new(self.buy_trade_id),
            sell_trade_id: TradeId::new(self.sell_trade_id),
            instrument: Instrument::from_parts(self.instrument_code, self.instrument_name, market),
            buy_price: decode_price("buy_price", self.buy_price)?,
            sell_price: decode_price("sell_price", self.sell_price)?,
            matched_quantity: decode_quantity("matched_quantity", self.matched_quantity)?,
            profit: self.profit,
            profit_rate: self.profit_rate,
            remark: self.remark,
            date: self.settlement_date,
            status,
            created_at: Timestamp::from(self.created_at),
            updated_at: Timestamp::from(self.updated_at),
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn trade_row() -> TradeRow {
        TradeRow {
            id: "trade-000000000001".to_string(),
            owner_id: "owner-1".to_string(),
            instrument_code: "00700".to_string(),
            instrument_name: "Tencent".to_string(),
            market: "hk".to_string(),
            side: "sell".to_string(),
            unit_price: Decimal::new(32050, 2),
            quantity: 200,
            trade_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            remark: None,
            match_status: "matched".to_string(),
            settlement_id: Some("tbill-000000000002".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn settlement_row() -> SettlementRow {
        SettlementRow {
            id: "tbill-000000000002".to_string(),
            owner_id: "owner-1".to_string(),
            buy_trade_id: "trade-a".to_string(),
            sell_trade_id: "trade-b".to_string(),
            instrument_code: "00700".to_string(),
            instrument_name: "Tencent".to_string(),
            market: "hk".to_string(),
            buy_price: Decimal::new(30000, 2),
            sell_price: Decimal::new(32050, 2),
            matched_quantity: 200,
            profit: Decimal::new(2050, 2),
            profit_rate: Decimal::new(68333, 4),
            remark: Some("swing".to_string()),
            settlement_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
            status: "finalized".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    mod trade_rows {
        use super::*;

        #[test]
        fn converts_valid_row() {
            let trade = trade_row().try_into_trade().unwrap();
            assert_eq!(trade.side(), TradeSide::Sell);
            assert_eq!(trade.instrument().market(), Market::HongKong);
            assert!(trade.is_matched());
            assert_eq!(
                trade.settlement_id(),
                Some(&SettlementId::new("tbill-000000000002"))
            );
            assert_eq!(trade.quantity().get(), 200);
        }

        #[test]
        fn unknown_side_is_serialization_error() {
            let mut row = trade_row();
            row.side = "short".to_string();
            let err = row.try_into_trade().unwrap_err();
            assert!(matches!(err, RepositoryError::Serialization(_)));
            assert!(err.to_string().contains("side"));
        }

        #[test]
        fn non_positive_quantity_rejected() {
            let mut row = trade_row();
            row.quantity = 0;
            assert!(row.try_into_trade().is_err());
        }

        #[test]
        fn negative_price_rejected() {
            let mut row = trade_row();
            row.unit_price = Decimal::new(-1, 0);
            assert!(row.try_into_trade().is_err());
        }
    }

    mod settlement_rows {
        use super::*;

        #[test]
        fn converts_valid_row() {
            let s = settlement_row().try_into_settlement().unwrap();
            assert!(s.is_finalized());
            assert_eq!(s.buy_trade_id(), &TradeId::new("trade-a"));
            assert_eq!(s.profit(), Decimal::new(2050, 2));
            assert_eq!(s.remark(), Some("swing"));
        }

        #[test]
        fn unknown_status_rejected() {
            let mut row = settlement_row();
            row.status = "cancelled".to_string();
            assert!(row.try_into_settlement().is_err());
        }
    }

    #[test]
    fn column_lists_match_row_fields() {
        assert_eq!(TRADE_COLUMNS.split(',').count(), 14);
        assert_eq!(SETTLEMENT_COLUMNS.split(',').count(), 17);
    }
}
