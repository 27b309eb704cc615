//! FIFO Policy Module
//!
//! First-In-First-Out eviction. Accesses never change the order.
//!
//! Removals are lazy: a removed key stays in the queue as a tombstone until
//! eviction pops past it, or until tombstones outnumber live keys and the
//! queue is compacted.

use std::borrow::Borrow;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use super::EvictionPolicy;
use crate::error::{CacheError, Result};

/// Tombstones tolerated beyond the live key count before compacting.
const COMPACT_SLACK: usize = 32;

// == FIFO Policy ==
/// Tracks insertion order for FIFO eviction strategy.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest insertion
/// - Back = Newest insertion
#[derive(Debug)]
pub struct FifoPolicy<K> {
    /// Insertion order, tagged with the stamp current at insertion
    queue: VecDeque<(K, u64)>,
    /// Live keys and their current stamp
    members: HashMap<K, u64>,
    /// Next insertion stamp
    next_stamp: u64,
    /// Queue slots whose stamp no longer matches `members`
    tombstones: usize,
}

impl<K> FifoPolicy<K>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            members: HashMap::new(),
            next_stamp: 0,
            tombstones: 0,
        }
    }

    // == Peek Oldest ==
    /// Returns the oldest live key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.queue
            .iter()
            .find(|(key, stamp)| self.is_live(key, *stamp))
            .map(|(key, _)| key)
    }

    fn is_live(&self, key: &K, stamp: u64) -> bool {
        self.members.get(key) == Some(&stamp)
    }

    /// Drops tombstones once they dominate the queue.
    fn maybe_compact(&mut self) {
        if self.tombstones <= self.members.len() + COMPACT_SLACK {
            return;
        }
        let members = &self.members;
        self.queue
            .retain(|(key, stamp)| members.get(key) == Some(stamp));
        self.tombstones = 0;
    }

    #[cfg(test)]
    fn queue_len(&self) -> usize {
        self.queue.len()
    }
}

impl<K> Default for FifoPolicy<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EvictionPolicy<K> for FifoPolicy<K>
where
    K: Hash + Eq + Clone,
{
    fn on_insert(&mut self, key: K) {
        let stamp = self.next_stamp;
        self.next_stamp += 1;

        if self.members.insert(key.clone(), stamp).is_some() {
            // The earlier queue slot for this key is now stale
            self.tombstones += 1;
        }
        self.queue.push_back((key, stamp));
        self.maybe_compact();
    }

    fn on_access<Q>(&mut self, _key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
    }

    fn on_remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.members.remove(key).is_none() {
            return false;
        }
        self.tombstones += 1;
        self.maybe_compact();
        true
    }

    fn evict_one(&mut self) -> Result<K> {
        while let Some((key, stamp)) = self.queue.pop_front() {
            if self.is_live(&key, stamp) {
                self.members.remove(&key);
                return Ok(key);
            }
            self.tombstones = self.tombstones.saturating_sub(1);
        }
        Err(CacheError::EmptyPolicy)
    }

    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.members.contains_key(key)
    }

    fn len(&self) -> usize {
        self.members.len()
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.members.clear();
        self.tombstones = 0;
    }
}
