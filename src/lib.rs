//! Mini Cache - A memory-bounded in-process cache
//!
//! Provides LRU, LFU and FIFO eviction, TTL expiration, memory accounting
//! and optional weak value semantics, with O(1) amortized operations.
//!
//! ```
//! use std::sync::Arc;
//! use mini_cache::{Cache, CacheConfig, PolicyKind};
//!
//! let config = CacheConfig::default()
//!     .with_capacity(Some(2))
//!     .with_policy(PolicyKind::Lru);
//! let mut cache: Cache<&str, u32> = Cache::new(config).unwrap();
//!
//! cache.put("a", Arc::new(1), None).unwrap();
//! cache.put("b", Arc::new(2), None).unwrap();
//! cache.get("a");
//! cache.put("c", Arc::new(3), None).unwrap();
//!
//! assert!(cache.get("b").is_none());
//! assert_eq!(cache.stats().evictions, 1);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use cache::{Cache, CacheStats, Clock, ManualClock, PolicyKind, SharedCache, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use tasks::spawn_sweep_task;
