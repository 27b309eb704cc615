//! Expiry Sweep Task
//!
//! Background task that periodically removes expired cache entries.

use std::hash::Hash;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that periodically sweeps expired cache entries.
///
/// The task runs in an infinite loop, sleeping for the specified interval
/// between sweeps. Each sweep takes the cache lock for exactly one pass over
/// the expired keys and releases it before sleeping again.
///
/// # Arguments
/// * `cache` - Shared handle to the cache
/// * `interval` - Time between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during shutdown.
///
/// # Example
/// ```ignore
/// let cache = SharedCache::from_config(config.clone())?;
/// let sweep_handle = spawn_sweep_task(cache.clone(), config.sweep_interval);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task<K, V>(cache: SharedCache<K, V>, interval: Duration) -> JoinHandle<()>
where
    K: Hash + Eq + Clone + Send + 'static,
    V: Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting expiry sweep task with interval of {:?}", interval);

        loop {
            // Sleep for the configured interval
            tokio::time::sleep(interval).await;

            let removed = cache.sweep_expired().await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, ManualClock};
    use crate::config::CacheConfig;
    use std::sync::Arc;

    fn shared_with_clock() -> (SharedCache<String, String>, ManualClock) {
        let clock = ManualClock::new(0);
        let cache = Cache::with_clock(CacheConfig::default(), clock.clone()).unwrap();
        (SharedCache::new(cache), clock)
    }

    #[tokio::test]
    async fn test_sweep_task_removes_expired_entries() {
        let (cache, clock) = shared_with_clock();
        cache
            .put(
                "expire_soon".to_string(),
                Arc::new("value".to_string()),
                Some(Duration::from_secs(1)),
            )
            .await
            .unwrap();

        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(20));
        clock.advance(Duration::from_secs(2));

        // Wait for at least one sweep to run
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Reclaimed by the sweep, not by a lazy get
        let stats = cache.stats().await;
        assert_eq!(stats.current_size, 0);
        assert_eq!(stats.expirations, 1);
        assert_eq!(stats.misses, 0);

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_preserves_valid_entries() {
        let (cache, clock) = shared_with_clock();
        cache
            .put(
                "long_lived".to_string(),
                Arc::new("value".to_string()),
                Some(Duration::from_secs(3600)),
            )
            .await
            .unwrap();

        let handle = spawn_sweep_task(cache.clone(), Duration::from_millis(20));
        clock.advance(Duration::from_secs(60));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let value = cache.get("long_lived").await;
        assert_eq!(value.as_deref().map(String::as_str), Some("value"));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let (cache, _) = shared_with_clock();

        let handle = spawn_sweep_task(cache, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
