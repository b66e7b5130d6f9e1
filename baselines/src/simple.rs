//! Simple BTreeMap-based implementation as a baseline.
//!
//! Every key owns a `Vec` of its values. It's not what we are measuring, but
//! it's obviously correct and gives the other structures something to be
//! checked against.

use std::collections::BTreeMap;

use rb_multimap::MultiMap;

/// A multi-map on `BTreeMap<K, Vec<V>>`.
pub struct SimpleMultiMap<K, V> {
    map: BTreeMap<K, Vec<V>>,
    value_count: usize,
}

impl<K: Ord, V> SimpleMultiMap<K, V> {
    /// Create a new empty map.
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
            value_count: 0,
        }
    }

    /// Append `value` under `key`. Returns `true` if the key was new.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.value_count += 1;
        let values = self.map.entry(key).or_default();
        values.push(value);
        values.len() == 1
    }

    /// All values for `key`, in insertion order.
    pub fn find(&self, key: &K) -> Option<&[V]> {
        self.map.get(key).map(Vec::as_slice)
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Total number of values.
    pub fn value_count(&self) -> usize {
        self.value_count
    }

    /// Ascending `(key, values)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[V])> {
        self.map.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

impl<K: Ord, V> MultiMap<K, V> for SimpleMultiMap<K, V> {
    fn insert(&mut self, key: K, value: V) -> bool {
        SimpleMultiMap::insert(self, key, value)
    }

    fn find(&self, key: &K) -> Option<&[V]> {
        SimpleMultiMap::find(self, key)
    }
}

impl<K: Ord, V> Default for SimpleMultiMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
