//! Cache Module
//!
//! Provides an in-memory cache bounded by cumulative entry size, with LRU
//! eviction and optional TTL expiration.

mod entry;
mod ledger;
mod stats;
mod store;


pub(crate) use entry::Entry;
pub(crate) use ledger::RecencyLedger;

// Re-export public types
pub use stats::CacheStats;
pub use store::SizedCache;
