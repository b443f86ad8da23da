//! # REST Handlers
//!
//! Request handlers for trade entry and settlements. Each handler extracts
//! the caller, delegates to an application service and returns JSON.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::{
    NewTrade, SettlementEngine, SettlementUpdate, SettlementView, TradeEntryService,
};
use crate::domain::entities::{Settlement, SettlementDetails, Trade, TradeDetailsUpdate};
use crate::domain::value_objects::{MatchStatus, OwnerId, SettlementId, TradeId, TradeSide};
use crate::infrastructure::persistence::{Page, PageRequest, SettlementFilter, TradeFilter};
use axum::Json;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

/// Header carrying the authenticated owner id.
pub const OWNER_HEADER: &str = "x-owner-id";

/// Shared handler state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Settlement use cases.
    pub engine: SettlementEngine,
    /// Trade entry use cases.
    pub trades: TradeEntryService,
}

/// The calling owner, read from [`OWNER_HEADER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub OwnerId);

impl<S> FromRequestParts<S> for Owner
where
    S: Send + Sync,
{
    type Rejection = ApplicationError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let owner = parts
            .headers
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(ApplicationError::unauthorized)?;
        Ok(Self(OwnerId::new(owner)))
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Crate version.
    pub version: String,
}

/// Paging and filter parameters for `GET /trades`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeListParams {
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Records per page.
    pub page_size: Option<u32>,
    /// `matched`, `unmatched` or `all`.
    pub match_status: Option<String>,
    /// `buy`, `sell` or `all`.
    pub side: Option<String>,
    /// Exact instrument code.
    pub instrument_code: Option<String>,
}

impl TradeListParams {
    fn into_query(self) -> ApplicationResult<(TradeFilter, PageRequest)> {
        let filter = TradeFilter {
            match_status: parse_choice::<MatchStatus>(self.match_status.as_deref())?,
            instrument_code: non_empty(self.instrument_code),
            side: parse_choice::<TradeSide>(self.side.as_deref())?,
        };
        Ok((filter, page_request(self.page, self.page_size)))
    }
}

/// Paging and filter parameters for `GET /settlements`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementListParams {
    /// Page number, starting at 1.
    pub page: Option<u32>,
    /// Records per page.
    pub page_size: Option<u32>,
    /// Exact instrument code.
    pub instrument_code: Option<String>,
}

/// Body of `POST /settlements`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSettlementRequest {
    /// Buy leg.
    pub buy_trade_id: String,
    /// Sell leg.
    pub sell_trade_id: String,
    /// Settlement date; defaults to the sell trade's date.
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Free-text remark.
    #[serde(default)]
    pub remark: Option<String>,
}

fn page_request(page: Option<u32>, page_size: Option<u32>) -> PageRequest {
    let default = PageRequest::default();
    PageRequest::new(
        page.unwrap_or(default.page),
        page_size.unwrap_or(default.page_size),
    )
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// "all" and absent both mean no filter.
fn parse_choice<T>(raw: Option<&str>) -> ApplicationResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s
            .to_lowercase()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ApplicationError::validation(e.to_string())),
    }
}

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/v1/trades`
pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Json(body): Json<NewTrade>,
) -> ApplicationResult<(StatusCode, Json<Trade>)> {
    let trade = state.trades.record_trade(&owner, body).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

/// `GET /api/v1/trades`
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Query(params): Query<TradeListParams>,
) -> ApplicationResult<Json<Page<Trade>>> {
    let (filter, page) = params.into_query()?;
    let trades = state.trades.list_trades(&owner, &filter, page).await?;
    Ok(Json(trades))
}

/// `GET /api/v1/trades/{id}`
pub async fn get_trade(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> ApplicationResult<Json<Trade>> {
    let trade = state.trades.get_trade(&owner, &TradeId::new(id)).await?;
    Ok(Json(trade))
}

/// `PATCH /api/v1/trades/{id}`
pub async fn update_trade(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(body): Json<TradeDetailsUpdate>,
) -> ApplicationResult<Json<Trade>> {
    let trade = state
        .trades
        .update_trade_details(&owner, &TradeId::new(id), body)
        .await?;
    Ok(Json(trade))
}

/// `DELETE /api/v1/trades/{id}`
pub async fn delete_trade(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> ApplicationResult<StatusCode> {
    state.trades.delete_trade(&owner, &TradeId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/v1/settlements`
pub async fn create_settlement(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Json(body): Json<CreateSettlementRequest>,
) -> ApplicationResult<(StatusCode, Json<Settlement>)> {
    let details = SettlementDetails {
        date: body.date,
        remark: body.remark,
    };
    let settlement = state
        .engine
        .create_settlement(
            &owner,
            &TradeId::new(body.buy_trade_id),
            &TradeId::new(body.sell_trade_id),
            details,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(settlement)))
}

/// `GET /api/v1/settlements`
pub async fn list_settlements(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Query(params): Query<SettlementListParams>,
) -> ApplicationResult<Json<Page<Settlement>>> {
    let filter = SettlementFilter {
        instrument_code: non_empty(params.instrument_code),
    };
    let page = page_request(params.page, params.page_size);
    let settlements = state.engine.list_settlements(&owner, &filter, page).await?;
    Ok(Json(settlements))
}

/// `GET /api/v1/settlements/{id}`
pub async fn get_settlement(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> ApplicationResult<Json<SettlementView>> {
    let view = state
        .engine
        .get_settlement(&owner, &SettlementId::new(id))
        .await?;
    Ok(Json(view))
}

/// `PATCH /api/v1/settlements/{id}`
pub async fn update_settlement(
    State(state): State<Arc<AppState>>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    Json(body): Json<SettlementUpdate>,
) -> ApplicationResult<Json<Settlement>> {
    let settlement = state
        .engine
        .update_metadata(&owner, &SettlementId::new(id), body)
        .await?;
    Ok(Json(settlement))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn all_means_no_filter() {
        assert_eq!(parse_choice::<TradeSide>(Some("all")).unwrap(), None);
        assert_eq!(parse_choice::<TradeSide>(None).unwrap(), None);
        assert_eq!(
            parse_choice::<TradeSide>(Some("SELL")).unwrap(),
            Some(TradeSide::Sell)
        );
        assert!(parse_choice::<MatchStatus>(Some("settled")).is_err());
    }

    #[test]
    fn missing_paging_uses_defaults() {
        let (filter, page) = TradeListParams::default().into_query().unwrap();
        assert_eq!(page, PageRequest::default());
        assert_eq!(filter, TradeFilter::default());
    }

    #[test]
    fn blank_instrument_code_ignored() {
        let params = TradeListParams {
            instrument_code: Some("  ".to_string()),
            match_status: Some("matched".to_string()),
            ..TradeListParams::default()
        };
        let (filter, _) = params.into_query().unwrap();
        assert_eq!(filter.instrument_code, None);
        assert_eq!(filter.match_status, Some(MatchStatus::Matched));
    }
}
