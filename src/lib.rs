//! Sized LRU - An embeddable in-memory cache bounded by entry size
//!
//! Evicts least recently used entries once the cumulative size of the cached
//! values exceeds a configured budget, and optionally expires entries after a
//! fixed time-to-live.
//!
//! The cache is a plain single-owner data structure. Wrap it in a mutex if it
//! has to be shared between threads.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStats, SizedCache};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
