//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support and
//! optional non-owning value references.

use std::sync::{Arc, Weak};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// == Cached Value ==
/// How the store holds a value.
#[derive(Debug)]
pub enum CachedValue<V> {
    /// The store shares ownership of the value
    Strong(Arc<V>),
    /// The store observes a value owned elsewhere
    Weak(Weak<V>),
}

impl<V> CachedValue<V> {
    /// Wraps `value` according to the cache's ownership mode.
    pub fn new(value: Arc<V>, weak: bool) -> Self {
        if weak {
            CachedValue::Weak(Arc::downgrade(&value))
        } else {
            CachedValue::Strong(value)
        }
    }

    /// Returns a strong handle, or None once a weak referent is gone.
    pub fn upgrade(&self) -> Option<Arc<V>> {
        match self {
            CachedValue::Strong(value) => Some(Arc::clone(value)),
            CachedValue::Weak(value) => value.upgrade(),
        }
    }

    /// Returns true if the value can no longer be reached.
    pub fn is_released(&self) -> bool {
        match self {
            CachedValue::Strong(_) => false,
            CachedValue::Weak(value) => value.strong_count() == 0,
        }
    }
}

// == Cache Entry ==
/// Represents a single cache entry with value and metadata.
#[derive(Debug)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: CachedValue<V>,
    /// Estimated size in bytes, fixed at insert time
    pub size_bytes: usize,
    /// Insertion timestamp (Unix milliseconds)
    pub inserted_at: u64,
    /// Last hit timestamp (Unix milliseconds)
    pub last_accessed_at: u64,
    /// Starts at 1 on insert, incremented on every hit
    pub access_frequency: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry inserted at `now`.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `size_bytes` - Estimated size of the value
    /// * `now` - Insertion time in Unix milliseconds
    /// * `ttl_ms` - Optional TTL in milliseconds
    pub fn new(value: CachedValue<V>, size_bytes: usize, now: u64, ttl_ms: Option<u64>) -> Self {
        Self {
            value,
            size_bytes,
            inserted_at: now,
            last_accessed_at: now,
            access_frequency: 1,
            expires_at: ttl_ms.map(|ttl| now.saturating_add(ttl)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry is expired once `now >= expires_at`, so a TTL that has fully
    /// elapsed never yields a hit.
    pub fn is_expired(&self, now: u64) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Record Access ==
    /// Updates recency and frequency metadata after a hit.
    pub fn record_access(&mut self, now: u64) {
        self.last_accessed_at = now;
        self.access_frequency = self.access_frequency.saturating_add(1);
    }

    /// Returns remaining TTL in milliseconds, or None if no expiration is set.
    pub fn ttl_remaining_ms(&self, now: u64) -> Option<u64> {
        self.expires_at.map(|expires| expires.saturating_sub(now))
    }

    /// Snapshot of the entry's bookkeeping for export.
    pub fn metadata(&self) -> EntryMetadata {
        EntryMetadata {
            size_bytes: self.size_bytes,
            inserted_at: self.inserted_at,
            last_accessed_at: self.last_accessed_at,
            access_frequency: self.access_frequency,
            expires_at: self.expires_at,
        }
    }
}

// == Entry Metadata ==
/// Serializable entry bookkeeping handed to persistence layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub size_bytes: usize,
    pub inserted_at: u64,
    pub last_accessed_at: u64,
    pub access_frequency: u64,
    pub expires_at: Option<u64>,
}

impl EntryMetadata {
    /// Insertion time as a UTC timestamp.
    pub fn inserted_at_utc(&self) -> Option<DateTime<Utc>> {
        millis_to_utc(self.inserted_at)
    }

    /// Expiry deadline as a UTC timestamp.
    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        self.expires_at.and_then(millis_to_utc)
    }
}

fn millis_to_utc(ms: u64) -> Option<DateTime<Utc>> {
    let ms = i64::try_from(ms).ok()?;
    Utc.timestamp_millis_opt(ms).single()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn strong(value: &str) -> CachedValue<String> {
        CachedValue::new(Arc::new(value.to_string()), false)
    }

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = CacheEntry::new(strong("test_value"), 10, 1_000, None);

        assert_eq!(entry.value.upgrade().as_deref(), Some(&"test_value".to_string()));
        assert!(entry.expires_at.is_none());
        assert!(!entry.is_expired(u64::MAX));
        assert_eq!(entry.access_frequency, 1);
        assert_eq!(entry.inserted_at, entry.last_accessed_at);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new(strong("test_value"), 10, 1_000, Some(500));

        assert!(!entry.is_expired(1_499));
        assert!(entry.is_expired(1_501));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::new(strong("test"), 4, 1_000, Some(0));

        // Entry should be expired when current time >= expires_at
        assert!(entry.is_expired(1_000), "Entry should be expired at boundary");
    }

    #[test]
    fn test_record_access() {
        let mut entry = CacheEntry::new(strong("v"), 1, 1_000, None);
        entry.record_access(1_200);
        entry.record_access(1_300);

        assert_eq!(entry.access_frequency, 3);
        assert_eq!(entry.last_accessed_at, 1_300);
        assert_eq!(entry.inserted_at, 1_000);
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = CacheEntry::new(strong("v"), 1, 1_000, Some(10_000));

        assert_eq!(entry.ttl_remaining_ms(4_000), Some(7_000));
        assert_eq!(entry.ttl_remaining_ms(20_000), Some(0));

        let forever = CacheEntry::new(strong("v"), 1, 1_000, None);
        assert!(forever.ttl_remaining_ms(4_000).is_none());
    }

    #[test]
    fn test_weak_value_released_when_owner_drops() {
        let owner = Arc::new("shared".to_string());
        let value = CachedValue::new(Arc::clone(&owner), true);

        assert!(!value.is_released());
        assert_eq!(value.upgrade().as_deref(), Some(&"shared".to_string()));

        drop(owner);
        assert!(value.is_released());
        assert!(value.upgrade().is_none());
    }

    #[test]
    fn test_metadata_snapshot() {
        let mut entry = CacheEntry::new(strong("v"), 32, 1_000, Some(60_000));
        entry.record_access(2_000);

        let meta = entry.metadata();
        assert_eq!(meta.size_bytes, 32);
        assert_eq!(meta.access_frequency, 2);
        assert_eq!(meta.expires_at, Some(61_000));
        assert_eq!(
            meta.inserted_at_utc().map(|t| t.timestamp_millis()),
            Some(1_000)
        );
    }
}
