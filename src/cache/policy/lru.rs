//! LRU Policy Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use super::list::{Links, NodeArena, NodeId};
use super::EvictionPolicy;
use crate::error::{CacheError, Result};

// == LRU Policy ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys are threaded through an arena-backed list where:
/// - Front = Most recently used
/// - Back = Least recently used
///
/// The index map gives direct node access, so no operation walks the list.
#[derive(Debug)]
pub struct LruPolicy<K> {
    /// Key to list node
    index: HashMap<K, NodeId>,
    /// Node storage
    arena: NodeArena<K>,
    /// Recency order
    order: Links,
}

impl<K> LruPolicy<K>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            arena: NodeArena::new(),
            order: Links::new(),
        }
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&K> {
        self.arena.back(&self.order)
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.arena.keys(&self.order)
    }
}

impl<K> Default for LruPolicy<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EvictionPolicy<K> for LruPolicy<K>
where
    K: Hash + Eq + Clone,
{
    fn on_insert(&mut self, key: K) {
        if let Some(&id) = self.index.get(&key) {
            self.arena.move_to_front(&mut self.order, id);
            return;
        }
        let id = self.arena.push_front(&mut self.order, key.clone());
        self.index.insert(key, id);
    }

    fn on_access<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if let Some(&id) = self.index.get(key) {
            self.arena.move_to_front(&mut self.order, id);
        }
    }

    fn on_remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.remove(key) {
            Some(id) => {
                self.arena.remove(&mut self.order, id);
                true
            }
            None => false,
        }
    }

    fn evict_one(&mut self) -> Result<K> {
        let key = self
            .arena
            .pop_back(&mut self.order)
            .ok_or(CacheError::EmptyPolicy)?;
        self.index.remove(&key);
        Ok(key)
    }

    fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn clear(&mut self) {
        self.index.clear();
        self.arena.clear();
        self.order = Links::new();
    }
}
