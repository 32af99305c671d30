//! Configuration Module
//!
//! Handles loading cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default size budget: 64 MiB worth of size units.
const DEFAULT_MAX_SIZE: i64 = 64 * 1024 * 1024;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum cumulative entry size; zero means unbounded
    pub max_size: i64,
    /// Time-to-live in milliseconds applied to every insert; zero disables TTL
    pub ttl_ms: u64,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_SIZE` - Maximum cumulative size (default: 67108864)
    /// - `CACHE_TTL_MS` - Entry TTL in milliseconds (default: 0, no expiry)
    pub fn from_env() -> Self {
        Self {
            max_size: env::var("CACHE_MAX_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_SIZE),
            ttl_ms: env::var("CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        }
    }

    /// Returns the configured TTL as a Duration.
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: DEFAULT_MAX_SIZE,
            ttl_ms: 0,
        }
    }
}
