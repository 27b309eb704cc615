//! Cache Engine Module
//!
//! Main cache engine combining the entry store, eviction policy, expiry
//! tracker and memory accountant behind `get`/`put`/`delete`/`clear`.
//!
//! Every public operation leaves `len() <= capacity` and
//! `memory <= memory_ceiling` (when configured) once it returns.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::clock::duration_to_ms;
use crate::cache::{
    CacheEntry, CacheStats, CachedValue, Clock, EntryMetadata, EntryStore, EvictionPolicy,
    ExpiryTracker, Policy, PolicyKind, ShallowSize, SizeEstimator, SystemClock,
};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache ==
/// Memory-bounded cache with a pluggable eviction policy and TTL expiry.
///
/// Values are handed in as `Arc<V>`. With weak values enabled the cache
/// keeps only a `Weak<V>`, and an entry disappears once every owner outside
/// the cache has dropped its handle.
pub struct Cache<K, V> {
    /// Key-entry storage and memory accounting
    store: EntryStore<K, V>,
    /// Eviction ordering
    policy: Policy<K>,
    /// TTL deadlines
    expiry: ExpiryTracker<K>,
    /// Cumulative counters
    stats: CacheStats,
    config: CacheConfig,
    clock: Arc<dyn Clock>,
    estimator: Box<dyn SizeEstimator<V>>,
}

impl<K, V> Cache<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructors ==
    /// Creates a cache reading time from the system clock and sizing values
    /// by their shallow type size.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_parts(config, SystemClock::new(), ShallowSize)
    }

    /// Creates a cache with an injected clock.
    pub fn with_clock(config: CacheConfig, clock: impl Clock + 'static) -> Result<Self> {
        Self::with_parts(config, clock, ShallowSize)
    }

    /// Creates a cache with an injected clock and size estimator.
    pub fn with_parts(
        config: CacheConfig,
        clock: impl Clock + 'static,
        estimator: impl SizeEstimator<V> + 'static,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            store: EntryStore::new(config.memory_ceiling),
            policy: Policy::new(config.policy),
            expiry: ExpiryTracker::new(),
            stats: CacheStats::new(),
            config,
            clock: Arc::new(clock),
            estimator: Box::new(estimator),
        })
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Expired entries and weak entries whose value was released are removed
    /// and counted as misses. Expiry is checked before the policy sees the
    /// access, so an expired entry never gets a recency or frequency bump.
    pub fn get<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_ms();

        let value = match self.store.get(key) {
            Some(entry) => entry.value.upgrade(),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if self.expiry.is_expired(key, now) {
            self.remove_entry(key);
            self.stats.record_expiration();
            self.stats.record_miss();
            debug!("Expired entry removed on access");
            return None;
        }

        let Some(value) = value else {
            self.remove_entry(key);
            self.stats.record_invalidation();
            self.stats.record_miss();
            debug!("Released weak entry removed on access");
            return None;
        };

        self.policy.on_access(key);
        if let Some(entry) = self.store.get_mut(key) {
            entry.record_access(now);
        }
        self.stats.record_hit();
        Some(value)
    }

    // == Put ==
    /// Stores a value, sizing it with the configured estimator.
    ///
    /// An existing entry for `key` is replaced, not updated: its policy state
    /// (recency, frequency, queue position) starts over.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL (uses the configured default if None)
    pub fn put(&mut self, key: K, value: Arc<V>, ttl: Option<Duration>) -> Result<()> {
        let size_bytes = self.estimator.estimate_size(&*value);
        self.put_with_size(key, value, size_bytes, ttl)
    }

    /// Stores a value with a caller-supplied size.
    pub fn put_with_size(
        &mut self,
        key: K,
        value: Arc<V>,
        size_bytes: usize,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let ttl_ms = ttl.or(self.config.default_ttl).map(duration_to_ms);
        let now = self.clock.now_ms();
        self.insert_at(key, value, size_bytes, ttl_ms, now)
    }

    fn insert_at(
        &mut self,
        key: K,
        value: Arc<V>,
        size_bytes: usize,
        ttl_ms: Option<u64>,
        now: u64,
    ) -> Result<()> {
        // Rejected before any side effect so the cache stays untouched
        self.check_fits(size_bytes)?;

        if let Some((_, old)) = self.remove_entry(&key) {
            if old.is_expired(now) {
                self.stats.record_expiration();
            }
        }

        if self.needs_room(size_bytes) {
            self.reclaim_expired(now);
        }
        if self.needs_room(size_bytes) {
            self.reclaim_released();
        }
        while self.needs_room(size_bytes) {
            if self.store.is_empty() {
                return Err(CacheError::EntryTooLarge {
                    size: size_bytes,
                    ceiling: self.store.memory().ceiling().unwrap_or(usize::MAX),
                });
            }
            self.evict_one();
        }

        let entry = CacheEntry::new(
            CachedValue::new(value, self.config.weak_values),
            size_bytes,
            now,
            ttl_ms,
        );
        if let Some(deadline) = entry.expires_at {
            self.expiry.set_expiry(key.clone(), deadline);
        }
        self.policy.on_insert(key.clone());
        self.store.insert(key, entry);

        Ok(())
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was present.
    ///
    /// Deletions are not counted as evictions.
    pub fn delete<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Drops every entry. Cumulative counters are kept.
    pub fn clear(&mut self) {
        let dropped = self.store.len();
        self.store.clear();
        self.policy.clear();
        self.expiry.clear_all();
        debug!("Cache cleared: dropped {} entries", dropped);
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_usage(self.store.len(), self.store.memory().current_usage());
        stats
    }

    // == Sweep Expired ==
    /// Removes every expired entry, and with weak values every entry whose
    /// value was released. Returns how many were removed.
    ///
    /// Lazy expiry in `get`/`put` keeps the cache correct without this; a
    /// sweep only reclaims space earlier.
    pub fn sweep_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired = self.reclaim_expired(now);
        let released = self.reclaim_released();
        if expired + released > 0 {
            debug!(
                "Sweep removed {} expired and {} released entries",
                expired, released
            );
        }
        expired + released
    }

    // == Value Released ==
    /// Handles notice that the last owner of `key`'s value dropped it.
    ///
    /// Treated as an out-of-band delete, counted as an invalidation.
    pub fn on_value_released<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.remove_entry(key).is_some() {
            self.stats.record_invalidation();
            debug!("Entry invalidated after its value was released");
            true
        } else {
            false
        }
    }

    // == Contains ==
    /// Checks for a live entry without touching statistics or policy order.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let now = self.clock.now_ms();
        match self.store.get(key) {
            Some(entry) => !self.expiry.is_expired(key, now) && !entry.value.is_released(),
            None => false,
        }
    }

    // == Export ==
    /// Iterates over live, non-expired entries for a persistence layer.
    pub fn export(&self) -> impl Iterator<Item = (&K, Arc<V>, EntryMetadata)> + '_ {
        let now = self.clock.now_ms();
        self.store
            .iter()
            .filter(move |(_, entry)| !entry.is_expired(now))
            .filter_map(|(key, entry)| {
                entry
                    .value
                    .upgrade()
                    .map(|value| (key, value, entry.metadata()))
            })
    }

    // == Import ==
    /// Re-inserts exported entries, keeping their size and absolute deadline.
    ///
    /// Records already past their deadline are skipped. Returns the number
    /// of entries inserted. If any record is larger than the memory ceiling
    /// nothing is inserted.
    pub fn import<I>(&mut self, entries: I) -> Result<usize>
    where
        I: IntoIterator<Item = (K, Arc<V>, EntryMetadata)>,
    {
        let records: Vec<_> = entries.into_iter().collect();
        for (_, _, meta) in &records {
            self.check_fits(meta.size_bytes)?;
        }

        let mut imported = 0;
        for (key, value, meta) in records {
            let now = self.clock.now_ms();
            let ttl_ms = match meta.expires_at {
                Some(deadline) if deadline <= now => continue,
                Some(deadline) => Some(deadline - now),
                None => None,
            };
            self.insert_at(key, value, meta.size_bytes, ttl_ms, now)?;
            imported += 1;
        }
        debug!("Imported {} entries", imported);
        Ok(imported)
    }

    // == Length ==
    /// Returns the current number of entries, including not-yet-reclaimed expired ones.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn memory_usage(&self) -> usize {
        self.store.memory().current_usage()
    }

    pub fn policy_kind(&self) -> PolicyKind {
        self.policy.kind()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Removes `key` from the store, the policy and the expiry tracker.
    fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, CacheEntry<V>)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (key, entry) = self.store.remove(key)?;
        let tracked = self.policy.on_remove::<K>(&key);
        debug_assert!(tracked, "stored key missing from eviction policy");
        self.expiry.clear::<K>(&key);
        Some((key, entry))
    }

    /// Fails when `size_bytes` could not fit even in an empty cache.
    fn check_fits(&self, size_bytes: usize) -> Result<()> {
        if self.store.memory().fits_when_empty(size_bytes) {
            return Ok(());
        }
        let ceiling = self.store.memory().ceiling().unwrap_or(usize::MAX);
        warn!(
            "Rejected entry of {} bytes: exceeds memory ceiling of {} bytes",
            size_bytes, ceiling
        );
        Err(CacheError::EntryTooLarge {
            size: size_bytes,
            ceiling,
        })
    }

    /// Checks whether inserting `size_bytes` needs an entry freed first.
    fn needs_room(&self, size_bytes: usize) -> bool {
        let at_capacity = self
            .config
            .capacity
            .map_or(false, |capacity| self.store.len() >= capacity);
        at_capacity || self.store.memory().would_exceed(size_bytes)
    }

    /// Removes every entry whose deadline has passed.
    fn reclaim_expired(&mut self, now: u64) -> usize {
        let mut removed = 0;
        for key in self.expiry.sweep(now) {
            if self.remove_entry(&key).is_some() {
                self.stats.record_expiration();
                removed += 1;
            }
        }
        removed
    }

    /// Removes every weak entry whose value has no owner left.
    fn reclaim_released(&mut self) -> usize {
        if !self.config.weak_values {
            return 0;
        }
        let released: Vec<K> = self
            .store
            .iter()
            .filter(|(_, entry)| entry.value.is_released())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &released {
            self.remove_entry(key);
            self.stats.record_invalidation();
        }
        released.len()
    }

    /// Evicts the policy's chosen victim.
    ///
    /// # Panics
    /// Panics if the policy and the store disagree about which keys exist;
    /// continuing would evict from a key space the store no longer has.
    fn evict_one(&mut self) {
        let key = match self.policy.evict_one() {
            Ok(key) => key,
            Err(err) => panic!(
                "eviction policy out of sync with {} stored entries: {err}",
                self.store.len()
            ),
        };
        let Some((_, entry)) = self.store.remove(&key) else {
            panic!("eviction policy chose a key missing from the entry store");
        };
        self.expiry.clear(&key);
        // A victim whose value is already gone was never live
        if entry.value.is_released() {
            self.stats.record_invalidation();
            debug!("Evicted released weak entry of {} bytes", entry.size_bytes);
        } else {
            self.stats.record_eviction();
            debug!(
                "Evicted entry of {} bytes ({} entries remain)",
                entry.size_bytes,
                self.store.len()
            );
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
