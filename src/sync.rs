//! Shared access behind a single lock.
//!
//! Rotations rewrite several links at once, so no partial state of a map may
//! be observed. `SharedMultiMap` treats the whole structure as the unit of
//! mutual exclusion: writers take the lock exclusively, readers share it.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::MultiMap;

/// Any `MultiMap` behind one `RwLock`.
pub struct SharedMultiMap<M> {
    inner: RwLock<M>,
}

impl<M> SharedMultiMap<M> {
    pub fn new(map: M) -> Self {
        Self {
            inner: RwLock::new(map),
        }
    }

    /// Insert under the write lock. Returns `true` if `key` was new.
    pub fn insert<K, V>(&self, key: K, value: V) -> bool
    where
        M: MultiMap<K, V>,
    {
        self.inner.write().insert(key, value)
    }

    /// Copy out the values for `key` under the read lock.
    pub fn find_cloned<K, V: Clone>(&self, key: &K) -> Option<Vec<V>>
    where
        M: MultiMap<K, V>,
    {
        self.inner.read().find(key).map(<[V]>::to_vec)
    }

    /// Run `f` over the values for `key` while the read lock is held.
    pub fn with_values<K, V, R>(&self, key: &K, f: impl FnOnce(Option<&[V]>) -> R) -> R
    where
        M: MultiMap<K, V>,
    {
        f(self.inner.read().find(key))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, M> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, M> {
        self.inner.write()
    }

    pub fn into_inner(self) -> M {
        self.inner.into_inner()
    }
}

impl<M: Default> Default for SharedMultiMap<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}
