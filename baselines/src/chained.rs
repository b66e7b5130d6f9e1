//! Separate-chaining hash table.
//!
//! A fixed number of buckets, each a vector of `(key, values)` entries. The
//! table never resizes, so chains grow linearly once the key count passes the
//! bucket count.

use std::collections::hash_map::RandomState;
use std::hash::{BuildHasher, Hash};

use rb_multimap::MultiMap;

use crate::error::{ConfigError, Result};

/// Configuration for a `ChainedHashTable`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of buckets; must be non-zero.
    pub buckets: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self { buckets: 1024 }
    }
}

impl Config {
    /// Check the configuration before a table is built from it.
    pub fn validate(&self) -> Result<()> {
        if self.buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }
        Ok(())
    }
}

/// A hash table with separate chaining and per-key value collections.
pub struct ChainedHashTable<K, V, S = RandomState> {
    buckets: Vec<Vec<(K, Vec<V>)>>,
    hasher: S,
    len: usize,
}

impl<K: Hash + Eq, V> ChainedHashTable<K, V> {
    /// Create a table with the default bucket count.
    pub fn new() -> Self {
        Self::build(Config::default().buckets, RandomState::new())
    }

    /// Create a table from `config`.
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config.buckets, RandomState::new()))
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> ChainedHashTable<K, V, S> {
    /// Create a table from `config` hashing with `hasher`.
    pub fn with_config_and_hasher(config: Config, hasher: S) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config.buckets, hasher))
    }

    fn build(buckets: usize, hasher: S) -> Self {
        tracing::trace!(buckets, "building chained hash table");
        Self {
            buckets: (0..buckets).map(|_| Vec::new()).collect(),
            hasher,
            len: 0,
        }
    }

    fn bucket_of(&self, key: &K) -> usize {
        (self.hasher.hash_one(key) % self.buckets.len() as u64) as usize
    }

    /// Append `value` under `key`. Returns `true` if the key was new.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let index = self.bucket_of(&key);
        let bucket = &mut self.buckets[index];
        if let Some((_, values)) = bucket.iter_mut().find(|(k, _)| *k == key) {
            values.push(value);
            return false;
        }
        bucket.push((key, vec![value]));
        self.len += 1;
        true
    }

    /// All values for `key`, in insertion order.
    pub fn find(&self, key: &K) -> Option<&[V]> {
        self.buckets[self.bucket_of(key)]
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Length of the longest chain.
    pub fn longest_chain(&self) -> usize {
        self.buckets.iter().map(Vec::len).max().unwrap_or(0)
    }
}

impl<K: Hash + Eq, V, S: BuildHasher> MultiMap<K, V> for ChainedHashTable<K, V, S> {
    fn insert(&mut self, key: K, value: V) -> bool {
        ChainedHashTable::insert(self, key, value)
    }

    fn find(&self, key: &K) -> Option<&[V]> {
        ChainedHashTable::find(self, key)
    }
}

impl<K: Hash + Eq, V> Default for ChainedHashTable<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
