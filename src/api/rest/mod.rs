//! # REST API
//!
//! JSON endpoints over axum for trade entry and settlements.
//!
//! Every `/api/v1` request must carry the owner id in the `x-owner-id`
//! header. Application errors map to status codes in [`error`].
//!
//! # Endpoints
//!
//! ## Trades
//! - `POST /api/v1/trades` - Record a trade
//! - `GET /api/v1/trades` - List trades with filtering and pagination
//! - `GET /api/v1/trades/{id}` - Get trade by ID
//! - `PATCH /api/v1/trades/{id}` - Edit trade date or remark
//! - `DELETE /api/v1/trades/{id}` - Delete an unmatched trade
//!
//! ## Settlements
//! - `POST /api/v1/settlements` - Pair a buy with a sell
//! - `GET /api/v1/settlements` - List finalized settlements
//! - `GET /api/v1/settlements/{id}` - Get a settlement with both trades
//! - `PATCH /api/v1/settlements/{id}` - Edit settlement date or remark
//!
//! ## Health
//! - `GET /health` - Liveness check
//!
//! # Usage
//!
//! ```ignore
//! use tbill_ledger::api::rest::{create_router, AppState};
//! use std::sync::Arc;
//!
//! let state = Arc::new(AppState { engine, trades });
//! let router = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

pub mod error;
pub mod handlers;
pub mod routes;

pub use error::ErrorResponse;
pub use handlers::{
    AppState, CreateSettlementRequest, HealthResponse, OWNER_HEADER, Owner, SettlementListParams,
    TradeListParams,
};
pub use routes::{cors_layer, create_router};
