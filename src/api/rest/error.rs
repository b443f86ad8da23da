//! # REST Error Mapping
//!
//! Converts [`ApplicationError`] into HTTP responses. This is the only place
//! status codes are chosen.

use crate::application::error::{ApplicationError, InfrastructureError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ErrorResponse {
    /// Creates an error body.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Returns the status code and error code for `err`.
#[must_use]
pub fn classify(err: &ApplicationError) -> (StatusCode, &'static str) {
    match err {
        ApplicationError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ApplicationError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ApplicationError::AlreadyMatched { .. } => (StatusCode::CONFLICT, "ALREADY_MATCHED"),
        ApplicationError::TradeLocked(_) => (StatusCode::CONFLICT, "TRADE_LOCKED"),
        ApplicationError::InstrumentMismatch { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INSTRUMENT_MISMATCH")
        }
        ApplicationError::SideMismatch { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "SIDE_MISMATCH")
        }
        ApplicationError::Integrity(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTEGRITY_ERROR"),
        ApplicationError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        ApplicationError::Domain(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        ApplicationError::Infrastructure(InfrastructureError::Timeout(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "TIMEOUT")
        }
        ApplicationError::Infrastructure(InfrastructureError::Repository(_)) => {
            (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE")
        }
        ApplicationError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, code) = classify(&self);
        if status.is_server_error() {
            error!(%status, code, error = %self, "request failed");
        } else if status == StatusCode::CONFLICT {
            warn!(%status, code, error = %self, "request conflicted");
        }

        // Storage details stay in the logs.
        let message = match &self {
            ApplicationError::Infrastructure(_) | ApplicationError::Internal(_) => {
                "service temporarily unavailable".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(ErrorResponse::new(code, message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DomainError;
    use crate::domain::value_objects::{TradeId, TradeSide};
    use crate::infrastructure::persistence::RepositoryError;

    #[test]
    fn status_mapping() {
        let cases = [
            (ApplicationError::validation("x"), StatusCode::BAD_REQUEST),
            (ApplicationError::not_found("Trade", "t"), StatusCode::NOT_FOUND),
            (
                ApplicationError::already_matched(TradeId::new("t")),
                StatusCode::CONFLICT,
            ),
            (ApplicationError::trade_locked("t"), StatusCode::CONFLICT),
            (
                ApplicationError::InstrumentMismatch {
                    buy_code: "A".into(),
                    sell_code: "B".into(),
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApplicationError::SideMismatch {
                    first: TradeSide::Sell,
                    second: TradeSide::Buy,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApplicationError::integrity("missing leg"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApplicationError::unauthorized(), StatusCode::UNAUTHORIZED),
            (
                DomainError::InvalidQuantity("0".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                RepositoryError::connection("down").into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(classify(&err).0, expected, "{err}");
        }
    }

    #[test]
    fn storage_errors_are_not_leaked() {
        let err: ApplicationError = RepositoryError::query("relation trades missing").into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
