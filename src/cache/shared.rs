//! Shared Cache Module
//!
//! Thread-safe handle around a [`Cache`]. One lock guards the store, the
//! policy, the expiry tracker and the memory accountant together, since an
//! eviction mutates all four as a single step.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};

use crate::cache::{Cache, CacheStats};
use crate::config::CacheConfig;
use crate::error::Result;

// == Shared Cache ==
/// Cloneable async handle to one cache instance.
pub struct SharedCache<K, V> {
    inner: Arc<Mutex<Cache<K, V>>>,
}

impl<K, V> Clone for SharedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Wraps an existing cache.
    pub fn new(cache: Cache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Builds a cache from configuration and wraps it.
    pub fn from_config(config: CacheConfig) -> Result<Self> {
        Ok(Self::new(Cache::new(config)?))
    }

    /// Locks the cache for a batch of operations.
    ///
    /// Do not hold the guard across unrelated awaits.
    pub async fn lock(&self) -> MutexGuard<'_, Cache<K, V>> {
        self.inner.lock().await
    }

    pub async fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.get(key)
    }

    pub async fn put(&self, key: K, value: Arc<V>, ttl: Option<Duration>) -> Result<()> {
        self.inner.lock().await.put(key, value, ttl)
    }

    pub async fn put_with_size(
        &self,
        key: K,
        value: Arc<V>,
        size_bytes: usize,
        ttl: Option<Duration>,
    ) -> Result<()> {
        self.inner
            .lock()
            .await
            .put_with_size(key, value, size_bytes, ttl)
    }

    pub async fn delete<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.delete(key)
    }

    pub async fn clear(&self) {
        self.inner.lock().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        self.inner.lock().await.stats()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn sweep_expired(&self) -> usize {
        self.inner.lock().await.sweep_expired()
    }

    /// Out-of-band invalidation from the owner of a weakly held value.
    pub async fn on_value_released<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().await.on_value_released(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{ManualClock, PolicyKind};

    fn shared(capacity: usize) -> SharedCache<String, u64> {
        let config = CacheConfig::default()
            .with_capacity(Some(capacity))
            .with_policy(PolicyKind::Lfu);
        SharedCache::new(Cache::with_clock(config, ManualClock::new(0)).unwrap())
    }

    #[tokio::test]
    async fn test_shared_put_get_delete() {
        let cache = shared(4);
        cache.put("a".to_string(), Arc::new(1), None).await.unwrap();

        assert_eq!(cache.get("a").await.as_deref(), Some(&1));
        assert!(cache.delete("a").await);
        assert!(cache.get("a").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_shared_concurrent_writers_respect_capacity() {
        let cache = shared(16);
        let mut handles = Vec::new();

        for worker in 0..8u64 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..50u64 {
                    let key = format!("w{worker}-k{i}");
                    cache.put(key.clone(), Arc::new(i), None).await.unwrap();
                    cache.get(&key).await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let stats = cache.stats().await;
        assert_eq!(stats.current_size, 16);
        assert_eq!(stats.evictions, 8 * 50 - 16);
        assert_eq!(stats.hits + stats.misses, 8 * 50);
    }

    #[tokio::test]
    async fn test_shared_release_notification() {
        let cache = shared(4);
        cache.put("k".to_string(), Arc::new(7), None).await.unwrap();

        assert!(cache.on_value_released("k").await);
        assert_eq!(cache.stats().await.invalidations, 1);
    }

    #[tokio::test]
    async fn test_shared_lock_batch() {
        let cache = shared(4);
        {
            let mut guard = cache.lock().await;
            guard.put("x".to_string(), Arc::new(1), None).unwrap();
            guard.put("y".to_string(), Arc::new(2), None).unwrap();
        }
        cache.clear().await;
        assert_eq!(cache.stats().await.current_size, 0);
    }
}
