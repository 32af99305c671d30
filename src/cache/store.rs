//! Cache Store Module
//!
//! Main cache engine combining the key index and the recency ledger with
//! size accounting and TTL expiration.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::{CacheStats, Entry, RecencyLedger};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Sized Cache ==
/// LRU cache bounded by the cumulative size of its entries.
///
/// Not safe for concurrent access; callers sharing it across threads must
/// provide their own synchronization.
#[derive(Debug)]
pub struct SizedCache<K, V> {
    /// Entries ordered by recency
    ledger: RecencyLedger<K, V>,
    /// Key to ledger slot
    index: HashMap<K, usize>,
    /// Sum of the sizes of every entry in the ledger, expired ones included
    size: i64,
    /// Size budget, zero means unbounded
    max_size: i64,
    /// TTL applied to inserts without an explicit expiration, zero disables it
    ttl: Duration,
    /// Performance statistics
    stats: CacheStats,
}

impl<K, V> SizedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    // == Constructors ==
    /// Creates a new cache with the given size budget and no TTL.
    ///
    /// A `max_size` of zero disables the budget entirely; eviction is then
    /// the caller's responsibility and the size total is not overflow checked.
    pub fn new(max_size: i64) -> Self {
        Self::with_ttl(max_size, Duration::ZERO)
    }

    /// Creates a new cache with the given size budget and default TTL.
    pub fn with_ttl(max_size: i64, ttl: Duration) -> Self {
        Self {
            ledger: RecencyLedger::new(),
            index: HashMap::new(),
            size: 0,
            max_size,
            ttl,
            stats: CacheStats::new(),
        }
    }

    /// Creates a new cache from configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::with_ttl(config.max_size, config.ttl())
    }

    // == Add ==
    /// Stores a value, applying the cache-wide TTL if one is set.
    ///
    /// Returns false if the entry was rejected, in which case the cache is
    /// unchanged. An accepted insert may evict other entries.
    pub fn add(&mut self, key: K, value: V, size: i64) -> bool {
        self.try_add(key, value, size).is_ok()
    }

    /// Stores a value, reporting why it was rejected.
    pub fn try_add(&mut self, key: K, value: V, size: i64) -> Result<()> {
        let now = Instant::now();
        let expires_at = (!self.ttl.is_zero()).then(|| now + self.ttl);
        self.insert(key, value, size, expires_at, now)
    }

    /// Stores a value that expires at `expires_at`, overriding the cache-wide TTL.
    pub fn add_with_expiration(&mut self, key: K, value: V, size: i64, expires_at: Instant) -> bool {
        self.try_add_with_expiration(key, value, size, expires_at)
            .is_ok()
    }

    /// Stores a value with an explicit expiration, reporting why it was rejected.
    pub fn try_add_with_expiration(
        &mut self,
        key: K,
        value: V,
        size: i64,
        expires_at: Instant,
    ) -> Result<()> {
        self.insert(key, value, size, Some(expires_at), Instant::now())
    }

    // == Get ==
    /// Retrieves a value by key and marks it most recently used.
    ///
    /// Expired entries are reported as misses but stay in the cache (and in
    /// its size) until they are evicted, removed or swept.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_at(key, Instant::now())
    }

    /// Retrieves a value, judging expiration against `now`.
    pub fn get_at<Q>(&mut self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = match self.index.get(key) {
            Some(&slot) => slot,
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        let live = self
            .ledger
            .get(slot)
            .is_some_and(|entry| !entry.is_expired_at(now));
        if !live {
            self.stats.record_miss();
            return None;
        }

        self.stats.record_hit();
        self.ledger.move_to_front(slot);
        self.ledger.get(slot).map(|entry| &entry.value)
    }

    // == Peek ==
    /// Retrieves a live value without touching recency or statistics.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key, Instant::now()).map(|entry| &entry.value)
    }

    /// Checks whether a live entry exists for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.live_entry(key, Instant::now()).is_some()
    }

    // == Remove ==
    /// Removes an entry by key, expired or not.
    ///
    /// Returns the removed value, or None if the key was absent.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.remove_slot(slot).map(|entry| entry.value)
    }

    /// Removes the least recently used entry.
    pub fn remove_oldest(&mut self) -> Option<(K, V)> {
        let slot = self.ledger.back()?;
        self.remove_slot(slot).map(|entry| (entry.key, entry.value))
    }

    // == Remove Expired ==
    /// Removes expired entries, oldest first.
    ///
    /// At most `max_to_remove` entries are removed; zero removes all of them.
    /// Returns the number of entries removed.
    pub fn remove_expired(&mut self, max_to_remove: usize) -> usize {
        self.remove_expired_at(max_to_remove, Instant::now())
    }

    /// Removes entries expired as of `now`, oldest first.
    pub fn remove_expired_at(&mut self, max_to_remove: usize, now: Instant) -> usize {
        let mut removed = 0;
        let mut cursor = self.ledger.back();

        while let Some(slot) = cursor {
            cursor = self.ledger.newer(slot);

            if self.is_expired_slot(slot, now) {
                self.remove_slot(slot);
                removed += 1;
                if max_to_remove > 0 && removed == max_to_remove {
                    break;
                }
            }
        }

        if removed > 0 {
            self.stats.record_expirations(removed);
            debug!(removed, size = self.size, "Removed expired cache entries");
        }
        removed
    }

    // == Clear ==
    /// Removes every entry.
    pub fn clear(&mut self) {
        self.ledger.clear();
        self.index.clear();
        self.size = 0;
    }

    // == Accessors ==
    /// Returns the number of entries, including expired ones not yet purged.
    pub fn len(&self) -> usize {
        self.ledger.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ledger.is_empty()
    }

    /// Returns the cumulative size of all entries, including expired ones not yet purged.
    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn max_size(&self) -> i64 {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sets the TTL applied to subsequent inserts; zero disables it.
    ///
    /// Entries already in the cache keep their expiration.
    pub fn set_ttl(&mut self, ttl: Duration) {
        self.ttl = ttl;
    }

    /// Returns how long the entry for `key` has left before it expires.
    ///
    /// Returns None if the key is absent or its entry never expires, and
    /// `Some(Duration::ZERO)` for an expired entry not yet purged. Recency is
    /// left untouched.
    pub fn ttl_remaining<Q>(&self, key: &Q) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.ttl_remaining_at(key, Instant::now())
    }

    /// Returns the remaining TTL for `key` relative to `now`.
    pub fn ttl_remaining_at<Q>(&self, key: &Q, now: Instant) -> Option<Duration>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.ledger.get(slot)?.ttl_remaining_at(now)
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.clone()
    }

    /// Iterates live entries from most to least recently used.
    ///
    /// Expired entries are skipped but not removed.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        let now = Instant::now();
        self.ledger
            .iter()
            .filter(move |entry| !entry.is_expired_at(now))
            .map(|entry| (&entry.key, &entry.value))
    }

    /// Every entry in recency order, expired ones included.
    #[cfg(test)]
    pub(crate) fn entries(&self) -> impl Iterator<Item = &Entry<K, V>> + '_ {
        self.ledger.iter()
    }

    /// Whether the key index holds `key`, expired or not.
    #[cfg(test)]
    pub(crate) fn is_indexed<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    // --- Internals ---

    fn insert(
        &mut self,
        key: K,
        value: V,
        size: i64,
        expires_at: Option<Instant>,
        now: Instant,
    ) -> Result<()> {
        if let Err(err) = self.check_admission(size) {
            self.stats.record_rejection();
            debug!(
                size,
                max_size = self.max_size,
                current = self.size,
                error = %err,
                "Rejected cache insert"
            );
            return Err(err);
        }

        // A refresh is remove-then-insert so the old size never lingers.
        if let Some(&slot) = self.index.get(&key) {
            self.remove_slot(slot);
        }

        let slot = self
            .ledger
            .push_front(Entry::new(key.clone(), value, size, expires_at));
        self.index.insert(key, slot);
        // Unbounded mode does not guard against overflow of the total.
        self.size = self.size.wrapping_add(size);

        if self.max_size > 0 {
            self.evict(now);
        }
        Ok(())
    }

    fn check_admission(&self, size: i64) -> Result<()> {
        if size < 0 {
            return Err(CacheError::NegativeSize(size));
        }

        if self.max_size > 0 && size > self.max_size {
            return Err(CacheError::ExceedsMaxSize {
                size,
                max_size: self.max_size,
            });
        }

        if self.max_size > 0 && self.size.checked_add(size).is_none() {
            return Err(CacheError::SizeOverflow {
                size,
                current: self.size,
            });
        }

        Ok(())
    }

    /// Restores `size <= max_size`: expired entries go first, then plain LRU.
    fn evict(&mut self, now: Instant) {
        let mut expired = 0;
        let mut cursor = self.ledger.back();

        while self.size > self.max_size {
            let Some(slot) = cursor else { break };
            cursor = self.ledger.newer(slot);

            if self.is_expired_slot(slot, now) {
                self.remove_slot(slot);
                expired += 1;
            }
        }

        if expired > 0 {
            self.stats.record_expirations(expired);
            debug!(expired, size = self.size, "Purged expired entries to make room");
        }

        while self.size > self.max_size {
            let evicted = self
                .ledger
                .back()
                .and_then(|slot| self.remove_slot(slot));

            match evicted {
                Some(entry) => {
                    self.stats.record_eviction();
                    trace!(size = entry.size, remaining = self.size, "Evicted least recently used entry");
                }
                None => break,
            }
        }
    }

    fn live_entry<Q>(&self, key: &Q, now: Instant) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.ledger
            .get(slot)
            .filter(|entry| !entry.is_expired_at(now))
    }

    fn is_expired_slot(&self, slot: usize, now: Instant) -> bool {
        self.ledger
            .get(slot)
            .is_some_and(|entry| entry.is_expired_at(now))
    }

    /// Removes a slot from the ledger, the index and the size total together.
    fn remove_slot(&mut self, slot: usize) -> Option<Entry<K, V>> {
        let entry = self.ledger.remove(slot)?;
        self.index.remove(&entry.key);
        self.size = self.size.wrapping_sub(entry.size);
        Some(entry)
    }
}
