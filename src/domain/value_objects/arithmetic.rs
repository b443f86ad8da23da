//! # Checked Arithmetic
//!
//! Overflow-checked decimal operations for money values. Nothing in the
//! ledger computes with bare `+`, `-`, `*` or `/` on prices.
//!
//! ```
//! use tbill_ledger::domain::value_objects::arithmetic::{percent_of, ArithmeticError};
//! use rust_decimal::Decimal;
//!
//! let rate = percent_of(Decimal::new(250, 2), Decimal::new(1000, 2), 4).unwrap();
//! assert_eq!(rate, Decimal::new(25, 0));
//! assert_eq!(
//!     percent_of(Decimal::ONE, Decimal::ZERO, 4),
//!     Err(ArithmeticError::DivisionByZero)
//! );
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// A decimal operation whose result cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ArithmeticError {
    /// Result exceeds the decimal range.
    #[error("arithmetic overflow")]
    Overflow,

    /// Result falls below the decimal range.
    #[error("arithmetic underflow")]
    Underflow,

    /// Divisor was zero.
    #[error("division by zero")]
    DivisionByZero,
}

/// Result type for arithmetic operations.
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

/// Checked operations returning [`ArithmeticError`] instead of panicking.
pub trait CheckedArithmetic: Sized {
    /// Subtracts `rhs`.
    ///
    /// # Errors
    ///
    /// Returns `Underflow` if the result is out of range.
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Multiplies by `rhs`.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the result is out of range.
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Divides by `rhs`.
    ///
    /// # Errors
    ///
    /// Returns `DivisionByZero` for a zero divisor, `Overflow` otherwise.
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self>;
}

impl CheckedArithmetic for Decimal {
    #[inline]
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_sub(rhs).ok_or(ArithmeticError::Underflow)
    }

    #[inline]
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        self.checked_div(rhs).ok_or(ArithmeticError::Overflow)
    }
}

/// `part / whole * 100`, rounded half away from zero to `decimal_places`.
///
/// # Errors
///
/// Returns `DivisionByZero` if `whole` is zero, `Overflow` if the
/// quotient is out of range.
pub fn percent_of(part: Decimal, whole: Decimal, decimal_places: u32) -> ArithmeticResult<Decimal> {
    Ok(part
        .safe_div(whole)?
        .safe_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero))
}
