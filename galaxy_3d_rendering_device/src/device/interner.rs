/// Value-based interning of structural descriptors
///
/// Maps a canonical key to the handle first registered for it. Entries live
/// as long as the device.

use std::hash::Hash;
use rustc_hash::FxHashMap;
use crate::device::Handle;

pub struct Interner<K: Eq + Hash> {
    map: FxHashMap<K, Handle>,
}

impl<K: Eq + Hash> Interner<K> {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    /// Handle previously interned for `key`
    pub fn get(&self, key: &K) -> Option<Handle> {
        self.map.get(key).copied()
    }

    /// Record `handle` as the canonical handle of `key`
    pub fn insert(&mut self, key: K, handle: Handle) {
        self.map.insert(key, handle);
    }

    /// Returns true if `handle` was produced by this interner
    pub fn contains_handle(&self, handle: Handle) -> bool {
        self.map.values().any(|h| *h == handle)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}

impl<K: Eq + Hash> Default for Interner<K> {
    fn default() -> Self {
        Self::new()
    }
}
