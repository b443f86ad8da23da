//! # Application Errors
//!
//! Error types for the application layer.
//!
//! Every failure a use case can produce is a typed variant here; the REST
//! boundary maps variants to status codes in one place.
//!
//! # Error Hierarchy
//!
//! ```text
//! ApplicationError
//! ├── Validation(String)                  - Malformed or forbidden input
//! ├── NotFound { resource_type, id }      - Missing trade or settlement
//! ├── AlreadyMatched { trade_id }         - Leg consumed by another settlement
//! ├── InstrumentMismatch { .. }           - Legs trade different instruments
//! ├── SideMismatch { .. }                 - Legs are not buy then sell
//! ├── TradeLocked(String)                 - Matched trade cannot be changed
//! ├── Integrity(String)                   - Stored state violates an invariant
//! ├── Unauthorized                        - No caller identity
//! ├── Domain(DomainError)                 - Business rule violations
//! ├── Infrastructure(InfrastructureError) - Storage failures
//! └── Internal(String)                    - Bugs and task failures
//! ```
//!
//! # Examples
//!
//! ```
//! use tbill_ledger::application::error::{ApplicationError, InfrastructureError};
//!
//! let err = ApplicationError::validation("buy and sell must differ");
//! assert!(err.is_validation());
//!
//! let infra_err = InfrastructureError::timeout("commit exceeded 5s");
//! let app_err: ApplicationError = infra_err.into();
//! assert!(app_err.is_retryable());
//! ```

use crate::domain::errors::DomainError;
use crate::domain::services::PairingViolation;
use crate::domain::value_objects::{TradeId, TradeSide};
use crate::infrastructure::persistence::RepositoryError;
use thiserror::Error;

/// Infrastructure layer error.
///
/// Storage failures and operations that outlived their deadline.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// The operation did not finish in time. It may still complete.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Repository error.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl InfrastructureError {
    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Repository(e) => e.is_transient(),
        }
    }
}

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("not found: {resource_type} with id {id}")]
    NotFound {
        /// Type of resource.
        resource_type: String,
        /// Resource identifier.
        id: String,
    },

    /// A leg has already been consumed by a settlement.
    #[error("trade already matched: {trade_id}")]
    AlreadyMatched {
        /// The consumed trade.
        trade_id: TradeId,
    },

    /// The two legs trade different instruments.
    #[error("instrument mismatch: buy leg {buy_code}, sell leg {sell_code}")]
    InstrumentMismatch {
        /// Instrument code of the buy leg.
        buy_code: String,
        /// Instrument code of the sell leg.
        sell_code: String,
    },

    /// The legs are not a buy followed by a sell.
    #[error("side mismatch: expected buy then sell, got {first} then {second}")]
    SideMismatch {
        /// Side of the first leg.
        first: TradeSide,
        /// Side of the second leg.
        second: TradeSide,
    },

    /// The trade is part of a settlement and cannot be changed.
    #[error("trade locked by settlement: {0}")]
    TradeLocked(String),

    /// Stored state violates a ledger invariant.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Authentication or authorization failure.
    #[error("unauthorized")]
    Unauthorized,

    /// Domain error from business logic.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// Infrastructure error from storage backends.
    #[error("infrastructure error: {0}")]
    Infrastructure(#[from] InfrastructureError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Creates an already-matched error.
    #[must_use]
    pub fn already_matched(trade_id: TradeId) -> Self {
        Self::AlreadyMatched { trade_id }
    }

    /// Creates a trade locked error.
    #[must_use]
    pub fn trade_locked(trade_id: impl Into<String>) -> Self {
        Self::TradeLocked(trade_id.into())
    }

    /// Creates an integrity error.
    #[must_use]
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity(message.into())
    }

    /// Creates an unauthorized error.
    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Unauthorized
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Infrastructure(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if the request lost against existing ledger state.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyMatched { .. } | Self::TradeLocked(_))
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an authorization error.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(err: RepositoryError) -> Self {
        Self::Infrastructure(InfrastructureError::Repository(err))
    }
}

impl From<PairingViolation> for ApplicationError {
    fn from(violation: PairingViolation) -> Self {
        match violation {
            PairingViolation::AlreadyMatched { trade_id } => Self::AlreadyMatched { trade_id },
            PairingViolation::InstrumentMismatch {
                buy_code,
                sell_code,
            } => Self::InstrumentMismatch {
                buy_code,
                sell_code,
            },
            PairingViolation::SideMismatch { first, second } => {
                Self::SideMismatch { first, second }
            }
        }
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
