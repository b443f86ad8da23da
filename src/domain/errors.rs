//! # Domain Errors
//!
//! Business rule violations raised while constructing or mutating entities.

use crate::domain::value_objects::ArithmeticError;
use thiserror::Error;

/// Domain layer error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Price failed validation.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Quantity failed validation.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Identifier is missing or malformed.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Instrument code or name is missing or malformed.
    #[error("invalid instrument: {0}")]
    InvalidInstrument(String),

    /// Free-text field exceeds its limit.
    #[error("invalid remark: {0}")]
    InvalidRemark(String),

    /// Checked arithmetic failed.
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
