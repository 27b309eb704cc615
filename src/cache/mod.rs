//! Cache Module
//!
//! Provides a memory-bounded cache with pluggable eviction (LRU, LFU, FIFO),
//! TTL expiration and hit/miss/eviction statistics.

mod clock;
mod engine;
mod entry;
mod expiry;
mod memory;
mod policy;
mod shared;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::Cache;
pub use entry::{CacheEntry, CachedValue, EntryMetadata};
pub use expiry::ExpiryTracker;
pub use memory::{MemoryAccountant, ShallowSize, SizeEstimator};
pub use policy::{EvictionPolicy, FifoPolicy, LfuPolicy, LruPolicy, Policy, PolicyKind};
pub use shared::SharedCache;
pub use stats::CacheStats;
pub use store::EntryStore;
