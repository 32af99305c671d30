//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cached value together with its accounting metadata.
#[derive(Debug, Clone)]
pub(crate) struct Entry<K, V> {
    /// The key the entry is indexed by
    pub key: K,
    /// The stored value
    pub value: V,
    /// Caller-supplied cost counted against the cache budget
    pub size: i64,
    /// Absolute expiration time, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<K, V> Entry<K, V> {
    // == Constructor ==
    /// Creates a new entry.
    pub fn new(key: K, value: V, size: i64, expires_at: Option<Instant>) -> Self {
        Self {
            key,
            value,
            size,
            expires_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired relative to `now`.
    ///
    /// Boundary condition: an entry is expired only once `now` is strictly
    /// past its expiration time; at the exact expiration instant it is live.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL relative to `now`, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining_at(&self, now: Instant) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(now))
    }
}
