//! Entry Store Module
//!
//! Hash-based key to entry storage. Holds no eviction or expiry logic; it
//! only keeps the memory accountant in step with what it stores.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::cache::{CacheEntry, MemoryAccountant};

// == Entry Store ==
/// Owns every live entry and reports size deltas to the memory accountant.
#[derive(Debug)]
pub struct EntryStore<K, V> {
    /// Key-entry storage
    entries: HashMap<K, CacheEntry<V>>,
    /// Aggregate size of `entries`
    memory: MemoryAccountant,
}

impl<K, V> EntryStore<K, V>
where
    K: Hash + Eq,
{
    // == Constructor ==
    /// Creates an empty store bounded by an optional memory ceiling.
    pub fn new(memory_ceiling: Option<usize>) -> Self {
        Self {
            entries: HashMap::new(),
            memory: MemoryAccountant::new(memory_ceiling),
        }
    }

    // == Insert ==
    /// Stores an entry, returning any entry it displaced.
    pub fn insert(&mut self, key: K, entry: CacheEntry<V>) -> Option<CacheEntry<V>> {
        self.memory.add(entry.size_bytes);
        let displaced = self.entries.insert(key, entry);
        if let Some(old) = &displaced {
            self.memory.remove(old.size_bytes);
        }
        displaced
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut CacheEntry<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get_mut(key)
    }

    // == Remove ==
    /// Removes an entry and its size contribution, returning the owned key.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<(K, CacheEntry<V>)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let (key, entry) = self.entries.remove_entry(key)?;
        self.memory.remove(entry.size_bytes);
        Some((key, entry))
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Iterates over every stored entry, expired or not.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &CacheEntry<V>)> {
        self.entries.iter()
    }

    /// Drops all entries and zeroes memory usage.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.memory.reset();
    }

    pub fn memory(&self) -> &MemoryAccountant {
        &self.memory
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
