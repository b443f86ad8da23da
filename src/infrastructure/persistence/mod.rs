//! # Persistence Layer
//!
//! Ledger ports and their implementations.
//!
//! ## Ports
//!
//! - [`TradeLedger`]: Trades and their match-status transitions
//! - [`SettlementLedger`]: Settlement records
//! - [`AtomicSettlementWriter`]: Transactional settlement commit
//! - [`IdAllocator`]: Record identifiers
//!
//! ## Implementations
//!
//! - `in_memory`: Process-local ledgers for tests and single-node use
//! - `postgres`: PostgreSQL store implementing every port
//! - [`SequenceIdAllocator`]: Lock-free process-local allocator

pub mod id_allocator;
pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use id_allocator::SequenceIdAllocator;
pub use traits::{
    AtomicSettlementWriter, CommitOutcome, IdAllocator, MAX_PAGE_SIZE, Page, PageRequest,
    RepositoryError, RepositoryResult, SettlementFilter, SettlementLedger, TradeFilter,
    TradeLedger,
};
