//! # Domain Services
//!
//! Business logic that spans more than one entity.
//!
//! ## Services
//!
//! - [`pairing::check_pair`]: Buy/sell eligibility rules
//! - [`profit::ProfitBreakdown`]: Round-trip profit figures

pub mod pairing;
pub mod profit;

pub use pairing::{PairingViolation, check_pair};
pub use profit::ProfitBreakdown;
