//! # Sequence Id Allocator
//!
//! Process-local [`IdAllocator`] combining a timestamp, a monotonic counter
//! and random bits.
//!
//! Identifiers look like `trade-18c2f1a3b4e5f-2a-5d1e09c4f7b2`: domain prefix,
//! microseconds since the epoch, a per-allocator sequence number, then 48
//! random bits. Two allocations from the same allocator never collide; the
//! random suffix separates allocators in different processes.

use crate::domain::value_objects::{IdDomain, OwnerId, Timestamp};
use crate::infrastructure::persistence::traits::{IdAllocator, RepositoryResult};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

const RANDOM_MASK: u128 = (1 << 48) - 1;

/// Lock-free identifier allocator.
///
/// # Examples
///
/// ```
/// use tbill_ledger::infrastructure::persistence::SequenceIdAllocator;
///
/// let allocator = SequenceIdAllocator::new();
/// assert_eq!(allocator.issued(), 0);
/// ```
#[derive(Debug, Default)]
pub struct SequenceIdAllocator {
    sequence: AtomicU64,
}

impl SequenceIdAllocator {
    /// Creates a new allocator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many identifiers have been issued.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }

    /// Allocates synchronously.
    #[must_use]
    pub fn next_id(&self, domain: IdDomain) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let micros = Timestamp::now().timestamp_micros();
        let random = Uuid::new_v4().as_u128() & RANDOM_MASK;
        format!("{}-{:x}-{:x}-{:012x}", domain.prefix(), micros, seq, random)
    }
}

#[async_trait]
impl IdAllocator for SequenceIdAllocator {
    async fn allocate(&self, domain: IdDomain, _owner: &OwnerId) -> RepositoryResult<String> {
        Ok(self.next_id(domain))
    }
}
