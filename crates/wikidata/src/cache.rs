//! Memoization for remote lookups.
//!
//! Two flavours share the [`ResultCache`] interface: [`RunCache`] lives for one
//! run and never evicts (lookups are treated as stable within a run), and
//! [`BoundedCache`] keeps the most recently used entries for long-lived
//! processes such as the HTTP server.

use dashmap::DashMap;
use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::Mutex;

pub trait ResultCache<K, V>: Send + Sync {
    fn get(&self, key: &K) -> Option<V>;
    fn put(&self, key: K, value: V);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Append-only cache scoped to a single run. Safe to share between workers.
#[derive(Debug)]
pub struct RunCache<K: Eq + Hash, V> {
    entries: DashMap<K, V>,
}

impl<K: Eq + Hash, V> RunCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash, V> Default for RunCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ResultCache<K, V> for RunCache<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    fn put(&self, key: K, value: V) {
        // First writer wins; a later write for the same key carries the
        // same answer anyway.
        self.entries.entry(key).or_insert(value);
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Size-bounded LRU cache.
#[derive(Debug)]
pub struct BoundedCache<K: Eq + Hash, V> {
    entries: Mutex<LruCache<K, V>>,
}

impl<K: Eq + Hash, V> BoundedCache<K, V> {
    /// `capacity` of zero is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl<K, V> ResultCache<K, V> for BoundedCache<K, V>
where
    K: Eq + Hash + Send,
    V: Clone + Send,
{
    fn get(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.get(key).cloned()
    }

    fn put(&self, key: K, value: V) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.put(key, value);
    }

    fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
