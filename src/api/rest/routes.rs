//! # REST Routes
//!
//! Router construction and HTTP middleware.

use super::handlers::{
    AppState, create_settlement, create_trade, delete_trade, get_settlement, get_trade, health,
    list_settlements, list_trades, update_settlement, update_trade,
};
use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Builds the API router with request tracing.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/trades", get(list_trades).post(create_trade))
        .route(
            "/trades/{id}",
            get(get_trade).patch(update_trade).delete(delete_trade),
        )
        .route("/settlements", get(list_settlements).post(create_settlement))
        .route(
            "/settlements/{id}",
            get(get_settlement).patch(update_settlement),
        );

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds a CORS layer for `origins`; an empty list allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(allowed)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::rest::error::ErrorResponse;
    use crate::api::rest::handlers::OWNER_HEADER;
    use crate::application::services::{SettlementEngine, TradeEntryService};
    use crate::infrastructure::persistence::SequenceIdAllocator;
    use crate::infrastructure::persistence::in_memory::{
        InMemorySettlementLedger, InMemoryTradeLedger,
    };
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    fn app() -> Router {
        let trades = Arc::new(InMemoryTradeLedger::new());
        let settlements = Arc::new(InMemorySettlementLedger::new());
        let ids = Arc::new(SequenceIdAllocator::new());
        let state = AppState {
            engine: SettlementEngine::new(trades.clone(), settlements, ids.clone()),
            trades: TradeEntryService::new(trades, ids),
        };
        create_router(Arc::new(state))
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(OWNER_HEADER, "owner-1");
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn trade_body(side: &str, price: &str, quantity: u64, date: &str) -> Value {
        json!({
            "instrumentCode": "600519",
            "instrumentName": "Kweichow Moutai",
            "market": "sh",
            "side": side,
            "unitPrice": price,
            "quantity": quantity,
            "tradeDate": date,
        })
    }

    #[tokio::test]
    async fn health_needs_no_owner() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_owner_is_unauthorized() {
        let response = app()
            .oneshot(Request::get("/api/v1/trades").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.code, "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn round_trip_over_http() {
        let app = app();

        let (status, buy) = send(
            &app,
            Method::POST,
            "/api/v1/trades",
            Some(trade_body("buy", "10.00", 100, "2024-03-01")),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, sell) = send(
            &app,
            Method::POST,
            "/api/v1/trades",
            Some(trade_body("sell", "12.50", 80, "2024-03-05")),
        )
        .await;

        let request = json!({
            "buyTradeId": buy["id"],
            "sellTradeId": sell["id"],
        });
        let (status, settlement) =
            send(&app, Method::POST, "/api/v1/settlements", Some(request.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(settlement["matchedQuantity"], json!(80));

        let (status, err) = send(&app, Method::POST, "/api/v1/settlements", Some(request)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["code"], json!("ALREADY_MATCHED"));

        let id = settlement["id"].as_str().unwrap();
        let (status, view) = send(&app, Method::GET, &format!("/api/v1/settlements/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["buyTrade"]["matchStatus"], json!("matched"));

        let buy_id = buy["id"].as_str().unwrap();
        let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/trades/{buy_id}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn immutable_settlement_fields_rejected() {
        let app = app();
        let (status, err) = send(
            &app,
            Method::PATCH,
            "/api/v1/settlements/tbill-1",
            Some(json!({ "profit": "99" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(err["code"], json!("VALIDATION_ERROR"));
    }

    #[tokio::test]
    async fn settlement_patch_accepts_only_date_and_remark() {
        let app = app();
        let (_, buy) = send(
            &app,
            Method::POST,
            "/api/v1/trades",
            Some(trade_body("buy", "10.00", 100, "2024-03-01")),
        )
        .await;
        let (_, sell) = send(
            &app,
            Method::POST,
            "/api/v1/trades",
            Some(trade_body("sell", "11.00", 100, "2024-03-02")),
        )
        .await;
        let (_, settlement) = send(
            &app,
            Method::POST,
            "/api/v1/settlements",
            Some(json!({ "buyTradeId": buy["id"], "sellTradeId": sell["id"] })),
        )
        .await;
        let path = format!("/api/v1/settlements/{}", settlement["id"].as_str().unwrap());

        for body in [
            json!({ "firstTradeId": "other", "remark": "a" }),
            json!({ "secondTradeId": "other", "remark": "b" }),
            json!({ "quantity": 1, "remark": "c" }),
            json!({ "profit": null, "remark": "d" }),
            json!({ "instrumentName": "X", "market": "us", "remark": "e" }),
        ] {
            let (status, err) = send(&app, Method::PATCH, &path, Some(body.clone())).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
            assert_eq!(err["code"], json!("VALIDATION_ERROR"));
        }

        let (_, view) = send(&app, Method::GET, &path, None).await;
        assert_eq!(view["settlement"]["profit"], settlement["profit"]);
        assert!(view["settlement"]["remark"].is_null());

        let (status, updated) =
            send(&app, Method::PATCH, &path, Some(json!({ "remark": "kept" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["remark"], json!("kept"));
    }

    #[tokio::test]
    async fn unknown_trade_is_not_found() {
        let (status, _) = send(&app(), Method::GET, "/api/v1/trades/ghost", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn invalid_filter_rejected() {
        let (status, _) = send(&app(), Method::GET, "/api/v1/trades?side=short", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn cors_skips_invalid_origins() {
        let _ = cors_layer(&["https://ledger.example".to_string(), "bad\norigin".to_string()]);
        let _ = cors_layer(&[]);
    }
}
