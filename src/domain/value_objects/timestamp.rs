//! # Timestamp Value Object
//!
//! UTC instant used for record creation and modification times, and for
//! the age cut-off of abandoned pending settlements.
//!
//! ```
//! use tbill_ledger::domain::value_objects::timestamp::Timestamp;
//!
//! let now = Timestamp::now();
//! assert!(now.sub_secs(300).is_before(&now));
//! ```

use chrono::{DateTime, NaiveDate, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current moment.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// From Unix milliseconds; `None` if out of range.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        Utc.timestamp_millis_opt(millis).single().map(Self)
    }

    /// From Unix seconds; `None` if out of range.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Unix timestamp in microseconds.
    #[inline]
    #[must_use]
    pub fn timestamp_micros(&self) -> i64 {
        self.0.timestamp_micros()
    }

    /// Moves forward by `secs`, saturating at the representable range.
    #[must_use]
    pub fn add_secs(&self, secs: i64) -> Self {
        let shifted = TimeDelta::try_seconds(secs).and_then(|d| self.0.checked_add_signed(d));
        Self(shifted.unwrap_or(if secs < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        }))
    }

    /// Moves back by `secs`, saturating at the representable range.
    #[must_use]
    pub fn sub_secs(&self, secs: i64) -> Self {
        self.add_secs(secs.saturating_neg())
    }

    /// True if strictly earlier than `other`.
    #[inline]
    #[must_use]
    pub fn is_before(&self, other: &Self) -> bool {
        self.0 < other.0
    }

    /// Calendar date in UTC.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0.date_naive()
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
