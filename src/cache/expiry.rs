//! Expiry Tracker Module
//!
//! Associates optional deadlines with keys. Point lookups go through a hash
//! map; active sweeps pop a lazily-maintained min-heap ordered by deadline,
//! so a sweep costs time proportional to the keys it reclaims.

use std::borrow::Borrow;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};
use std::hash::Hash;

/// Slack kept before stale heap items trigger a rebuild.
const COMPACT_SLACK: usize = 32;

// == Heap Item ==
/// Deadline record; superseded or cleared records stay in the heap until popped.
#[derive(Debug)]
struct HeapItem<K> {
    deadline: u64,
    seq: u64,
    key: K,
}

impl<K> PartialEq for HeapItem<K> {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl<K> Eq for HeapItem<K> {}

impl<K> PartialOrd for HeapItem<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K> Ord for HeapItem<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.deadline, self.seq).cmp(&(other.deadline, other.seq))
    }
}

// == Expiry Tracker ==
/// Deadline bookkeeping for entries with a TTL.
#[derive(Debug)]
pub struct ExpiryTracker<K> {
    /// Authoritative deadline and heap sequence per key
    deadlines: HashMap<K, (u64, u64)>,
    /// Min-heap of deadlines, may hold stale items
    heap: BinaryHeap<Reverse<HeapItem<K>>>,
    /// Monotonic sequence distinguishing live heap items from stale ones
    next_seq: u64,
}

impl<K> ExpiryTracker<K>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            deadlines: HashMap::new(),
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    // == Set Expiry ==
    /// Registers or replaces the deadline for `key`.
    pub fn set_expiry(&mut self, key: K, deadline: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;

        self.deadlines.insert(key.clone(), (deadline, seq));
        self.heap.push(Reverse(HeapItem { deadline, seq, key }));
        self.maybe_compact();
    }

    /// Returns the deadline registered for `key`.
    pub fn deadline<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.deadlines.get(key).map(|(deadline, _)| *deadline)
    }

    // == Is Expired ==
    /// Checks whether `key` has a deadline at or before `now`.
    pub fn is_expired<Q>(&self, key: &Q, now: u64) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.deadline(key).map_or(false, |deadline| now >= deadline)
    }

    // == Clear ==
    /// Forgets the deadline for `key`. The heap item goes stale.
    pub fn clear<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.deadlines.remove(key).is_some() {
            self.maybe_compact();
        }
    }

    // == Sweep ==
    /// Removes and returns every key whose deadline is at or before `now`.
    ///
    /// Keys come back in deadline order.
    pub fn sweep(&mut self, now: u64) -> Vec<K> {
        let mut expired = Vec::new();

        while let Some(Reverse(top)) = self.heap.peek() {
            if top.deadline > now {
                break;
            }
            let Some(Reverse(item)) = self.heap.pop() else {
                break;
            };
            let live = self.deadlines.get(&item.key) == Some(&(item.deadline, item.seq));
            if live {
                self.deadlines.remove(&item.key);
                expired.push(item.key);
            }
        }

        expired
    }

    /// Number of keys with a live deadline.
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }

    /// Drops all deadlines.
    pub fn clear_all(&mut self) {
        self.deadlines.clear();
        self.heap.clear();
    }

    /// Rebuilds the heap once stale items outnumber live ones.
    fn maybe_compact(&mut self) {
        if self.heap.len() <= self.deadlines.len() * 2 + COMPACT_SLACK {
            return;
        }
        self.heap = self
            .deadlines
            .iter()
            .map(|(key, &(deadline, seq))| {
                Reverse(HeapItem {
                    deadline,
                    seq,
                    key: key.clone(),
                })
            })
            .collect();
    }

    #[cfg(test)]
    fn heap_len(&self) -> usize {
        self.heap.len()
    }
}

impl<K> Default for ExpiryTracker<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
