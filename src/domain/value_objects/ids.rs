//! # Identifiers
//!
//! String-based identity types for owners, trades and settlements.
//!
//! Trade and settlement identifiers are produced by an
//! [`IdAllocator`](crate::infrastructure::persistence::IdAllocator); owner
//! identifiers come from the authenticated caller.
//!
//! # Examples
//!
//! ```
//! use tbill_ledger::domain::value_objects::{OwnerId, TradeId};
//!
//! let owner = OwnerId::new("user-1");
//! let trade = TradeId::new("trade-42");
//!
//! assert_eq!(owner.as_str(), "user-1");
//! assert!(!trade.is_empty());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if the identifier is empty or whitespace only.
            #[inline]
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Consumes the identifier, returning the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Identifier of the user owning a record.
    ///
    /// All ledger queries are scoped to an owner; records are never shared.
    OwnerId
);

string_id!(
    /// Identifier of a single buy or sell trade.
    TradeId
);

string_id!(
    /// Identifier of a settlement (closed buy/sell round trip).
    SettlementId
);
