//! Error types for the cache
//!
//! Every failure is local and reported through a return value: the only
//! fallible operation is inserting an entry, which can be rejected.

use thiserror::Error;

// == Cache Error Enum ==
/// Reasons an insert is rejected.
///
/// A rejected insert leaves the cache exactly as it was before the call.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheError {
    /// Entry sizes must be non-negative
    #[error("Negative entry size: {0}")]
    NegativeSize(i64),

    /// A single entry larger than the whole budget can never fit
    #[error("Entry size {size} exceeds maximum cache size {max_size}")]
    ExceedsMaxSize { size: i64, max_size: i64 },

    /// Adding the entry would overflow the size accounting
    #[error("Entry size {size} would overflow cumulative size {current}")]
    SizeOverflow { size: i64, current: i64 },
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
