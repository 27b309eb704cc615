//! LFU Policy Module
//!
//! Least Frequently Used eviction with least-recently-used tie-breaking
//! inside each frequency band.
//!
//! Bands are kept in a frequency-ordered chain (each band knows its lower
//! and higher neighbour), so the minimum frequency stays correct after any
//! insert, access or removal without scanning.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use super::list::{Links, NodeArena, NodeId};
use super::EvictionPolicy;
use crate::error::{CacheError, Result};

/// One frequency level.
#[derive(Debug)]
struct Band {
    /// Keys at this frequency, most recent first
    members: Links,
    /// Next lower frequency with members
    lower: Option<u64>,
    /// Next higher frequency with members
    higher: Option<u64>,
}

// == LFU Policy ==
#[derive(Debug)]
pub struct LfuPolicy<K> {
    /// Key to (frequency, list node)
    index: HashMap<K, (u64, NodeId)>,
    /// Node storage shared by all bands
    arena: NodeArena<K>,
    /// Frequency to band
    bands: HashMap<u64, Band>,
    /// Lowest frequency with members
    min_freq: Option<u64>,
}

impl<K> LfuPolicy<K>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            arena: NodeArena::new(),
            bands: HashMap::new(),
            min_freq: None,
        }
    }

    /// Current frequency of `key`.
    pub fn frequency<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|(freq, _)| *freq)
    }

    /// Lowest frequency currently tracked.
    pub fn min_frequency(&self) -> Option<u64> {
        self.min_freq
    }

    /// Returns the next eviction candidate without removing it.
    pub fn peek_victim(&self) -> Option<&K> {
        let band = self.bands.get(&self.min_freq?)?;
        self.arena.back(&band.members)
    }

    /// Creates an empty band for `freq` directly above `lower` in the chain.
    fn open_band(&mut self, freq: u64, lower: Option<u64>) {
        let higher = match lower {
            Some(lower) => self.band_mut(lower).higher.replace(freq),
            None => self.min_freq.replace(freq),
        };
        if let Some(higher) = higher {
            self.band_mut(higher).lower = Some(freq);
        }
        self.bands.insert(
            freq,
            Band {
                members: Links::new(),
                lower,
                higher,
            },
        );
    }

    /// Drops `freq` from the chain if it has no members left.
    fn close_band_if_empty(&mut self, freq: u64) {
        if !self.band_mut(freq).members.is_empty() {
            return;
        }
        let Some(band) = self.bands.remove(&freq) else {
            return;
        };
        match band.lower {
            Some(lower) => self.band_mut(lower).higher = band.higher,
            None => self.min_freq = band.higher,
        }
        if let Some(higher) = band.higher {
            self.band_mut(higher).lower = band.lower;
        }
    }

    fn band_mut(&mut self, freq: u64) -> &mut Band {
        band_in(&mut self.bands, freq)
    }
}

/// Looks up a band that the chain guarantees exists.
fn band_in(bands: &mut HashMap<u64, Band>, freq: u64) -> &mut Band {
    match bands.get_mut(&freq) {
        Some(band) => band,
        None => unreachable!("frequency band {freq} missing from chain"),
    }
}

impl<K> Default for LfuPolicy<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> EvictionPolicy<K> for LfuPolicy<K>
where
    K: Hash + Eq + Clone,
{
    fn on_insert(&mut self, key: K) {
        if self.index.contains_key(&key) {
            self.on_remove(&key);
        }
        if !self.bands.contains_key(&1) {
            self.open_band(1, None);
        }
        let id = self
            .arena
            .push_front(&mut band_in(&mut self.bands, 1).members, key.clone());
        self.index.insert(key, (1, id));
    }

    fn on_access<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(&(freq, id)) = self.index.get(key) else {
            return;
        };

        let Some(next) = freq.checked_add(1) else {
            // Saturated: only refresh recency
            self.arena
                .move_to_front(&mut band_in(&mut self.bands, freq).members, id);
            return;
        };

        if !self.bands.contains_key(&next) {
            self.open_band(next, Some(freq));
        }

        self.arena
            .unlink(&mut band_in(&mut self.bands, freq).members, id);
        self.arena
            .link_front(&mut band_in(&mut self.bands, next).members, id);

        if let Some(slot) = self.index.get_mut(key) {
            slot.0 = next;
        }
        self.close_band_if_empty(freq);
    }

    fn on_remove<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some((freq, id)) = self.index.remove(key) else {
            return false;
        };
        self.arena
            .remove(&mut band_in(&mut self.bands, freq).members, id);
        self.close_band_if_empty(freq);
        true
    }

    fn evict_one(&mut self) -> Result<K> {
        let freq = self.min_freq.ok_or(CacheError::EmptyPolicy)?;
        let key = self
            .arena
            .pop_back(&mut band_in(&mut self.bands, freq).members)
            .ok_or(CacheError::EmptyPolicy)?;
        self.index.remove(&key);
        self.close_band_if_empty(freq);
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
        self.bands.clear();
        self.min_freq = None;
    }
}
