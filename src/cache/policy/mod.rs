//! Eviction Policy Module
//!
//! Every discipline implements [`EvictionPolicy`]; [`Policy`] is the closed
//! set of disciplines a cache can be built with, chosen once at construction.

mod fifo;
mod lfu;
mod list;
mod lru;

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

pub use fifo::FifoPolicy;
pub use lfu::LfuPolicy;
pub use lru::LruPolicy;

// == Eviction Policy Trait ==
/// Ordering bookkeeping that picks the next key to evict.
///
/// Implementations track exactly the keys registered through `on_insert`
/// and not yet removed through `on_remove` or `evict_one`. All operations
/// are O(1) amortized.
pub trait EvictionPolicy<K> {
    /// Registers a newly inserted key.
    fn on_insert(&mut self, key: K);

    /// Records a hit on `key`. Unknown keys are ignored.
    fn on_access<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Deregisters `key`, returning whether it was tracked.
    fn on_remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    /// Chooses, deregisters and returns one key.
    ///
    /// Fails with [`CacheError::EmptyPolicy`] when no keys are tracked.
    fn evict_one(&mut self) -> Result<K>;

    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every tracked key.
    fn clear(&mut self);
}

// == Policy Kind ==
/// Names the eviction discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used, least recently used within a frequency
    Lfu,
    /// Insertion order, accesses ignored
    Fifo,
}

impl FromStr for PolicyKind {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(PolicyKind::Lru),
            "lfu" => Ok(PolicyKind::Lfu),
            "fifo" => Ok(PolicyKind::Fifo),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown eviction policy: {other}"
            ))),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Lru => "lru",
            PolicyKind::Lfu => "lfu",
            PolicyKind::Fifo => "fifo",
        };
        f.write_str(name)
    }
}

// == Policy ==
/// The eviction policy selected for a cache instance.
#[derive(Debug)]
pub enum Policy<K> {
    Lru(LruPolicy<K>),
    Lfu(LfuPolicy<K>),
    Fifo(FifoPolicy<K>),
}

impl<K> Policy<K>
where
    K: Hash + Eq + Clone,
{
    /// Builds an empty policy of the given kind.
    pub fn new(kind: PolicyKind) -> Self {
        match kind {
            PolicyKind::Lru => Policy::Lru(LruPolicy::new()),
            PolicyKind::Lfu => Policy::Lfu(LfuPolicy::new()),
            PolicyKind::Fifo => Policy::Fifo(FifoPolicy::new()),
        }
    }

    pub fn kind(&self) -> PolicyKind {
        match self {
            Policy::Lru(_) => PolicyKind::Lru,
            Policy::Lfu(_) => PolicyKind::Lfu,
            Policy::Fifo(_) => PolicyKind::Fifo,
        }
    }
}

impl<K> EvictionPolicy<K> for Policy<K>
where
    K: Hash + Eq + Clone,
{
    fn on_insert(&mut self, key: K) {
        match self {
            Policy::Lru(p) => p.on_insert(key),
            Policy::Lfu(p) => p.on_insert(key),
            Policy::Fifo(p) => p.on_insert(key),
        }
    }

    fn on_access<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self {
            Policy::Lru(p) => p.on_access(key),
            Policy::Lfu(p) => p.on_access(key),
            Policy::Fifo(p) => p.on_access(key),
        }
    }

    fn on_remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self {
            Policy::Lru(p) => p.on_remove(key),
            Policy::Lfu(p) => p.on_remove(key),
            Policy::Fifo(p) => p.on_remove(key),
        }
    }

    fn evict_one(&mut self) -> Result<K> {
        match self {
            Policy::Lru(p) => p.evict_one(),
            Policy::Lfu(p) => p.evict_one(),
            Policy::Fifo(p) => p.evict_one(),
        }
    }

    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self {
            Policy::Lru(p) => p.contains(key),
            Policy::Lfu(p) => p.contains(key),
            Policy::Fifo(p) => p.contains(key),
        }
    }

    fn len(&self) -> usize {
        match self {
            Policy::Lru(p) => p.len(),
            Policy::Lfu(p) => p.len(),
            Policy::Fifo(p) => p.len(),
        }
    }

    fn clear(&mut self) {
        match self {
            Policy::Lru(p) => p.clear(),
            Policy::Lfu(p) => p.clear(),
            Policy::Fifo(p) => p.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_kind_from_str() {
        assert_eq!("lru".parse::<PolicyKind>().unwrap(), PolicyKind::Lru);
        assert_eq!(" LFU ".parse::<PolicyKind>().unwrap(), PolicyKind::Lfu);
        assert_eq!("Fifo".parse::<PolicyKind>().unwrap(), PolicyKind::Fifo);
        assert!(matches!(
            "arc".parse::<PolicyKind>(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_policy_kind_display_round_trips() {
        for kind in [PolicyKind::Lru, PolicyKind::Lfu, PolicyKind::Fifo] {
            assert_eq!(kind.to_string().parse::<PolicyKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_policy_kind_serde_lowercase() {
        assert_eq!(serde_json::to_string(&PolicyKind::Fifo).unwrap(), "\"fifo\"");
        let kind: PolicyKind = serde_json::from_str("\"lfu\"").unwrap();
        assert_eq!(kind, PolicyKind::Lfu);
    }

    #[test]
    fn test_every_policy_reports_empty() {
        for kind in [PolicyKind::Lru, PolicyKind::Lfu, PolicyKind::Fifo] {
            let mut policy: Policy<u32> = Policy::new(kind);
            assert_eq!(policy.kind(), kind);
            assert!(policy.is_empty());
            assert_eq!(policy.evict_one(), Err(CacheError::EmptyPolicy));
        }
    }

    #[test]
    fn test_every_policy_forgets_removed_keys() {
        for kind in [PolicyKind::Lru, PolicyKind::Lfu, PolicyKind::Fifo] {
            let mut policy = Policy::new(kind);
            policy.on_insert(1u32);
            policy.on_insert(2);
            policy.on_insert(3);
            policy.on_access(&2);

            assert!(policy.on_remove(&1));
            assert!(!policy.on_remove(&1));
            assert_eq!(policy.len(), 2);

            let mut evicted = vec![policy.evict_one().unwrap(), policy.evict_one().unwrap()];
            evicted.sort_unstable();
            assert_eq!(evicted, vec![2, 3], "{kind} evicted a removed key");
            assert!(policy.is_empty());
        }
    }

    #[test]
    fn test_every_policy_clear() {
        for kind in [PolicyKind::Lru, PolicyKind::Lfu, PolicyKind::Fifo] {
            let mut policy = Policy::new(kind);
            policy.on_insert("a");
            policy.on_insert("b");
            policy.clear();

            assert!(policy.is_empty());
            assert!(!policy.contains(&"a"));

            policy.on_insert("c");
            assert_eq!(policy.evict_one().unwrap(), "c");
        }
    }
}
