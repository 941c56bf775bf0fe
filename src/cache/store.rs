//! Cache Store Module
//!
//! Thread-safe LRU cache combining a HashMap index with a recency list.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, RecencyList};

// == Inner State ==
#[derive(Debug)]
struct Inner<V> {
    /// Key → slot in `recency`
    index: HashMap<String, usize>,
    /// Entries ordered by access time
    recency: RecencyList<V>,
    stats: CacheStats,
}

// == LRU Cache ==
/// Fixed-capacity cache evicting the least recently used entry on overflow.
///
/// Every operation, `get` included, takes the same exclusive lock: a read
/// moves the entry to the front of the recency list, so it mutates shared
/// state just like a write does.
///
/// A capacity of zero is accepted and yields a cache that acknowledges every
/// `add` but never retains anything.
#[derive(Debug)]
pub struct LruCache<V> {
    inner: Mutex<Inner<V>>,
    capacity: usize,
}

impl<V: Clone> LruCache<V> {
    // == Constructor ==
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                index: HashMap::with_capacity(capacity),
                recency: RecencyList::with_capacity(capacity),
                stats: CacheStats::new(capacity),
            }),
            capacity,
        }
    }

    // == Add ==
    /// Inserts or updates `key`, making it the most recently used entry.
    ///
    /// When inserting a new key into a full cache, exactly one entry (the
    /// least recently used) is evicted first. Always returns `true`.
    pub fn add(&self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        let mut inner = self.lock();

        if let Some(&slot) = inner.index.get(&key) {
            if let Some(entry) = inner.recency.get_mut(slot) {
                entry.value = value;
            }
            inner.recency.move_to_front(slot);
            return true;
        }

        if self.capacity == 0 {
            inner.stats.record_eviction();
            return true;
        }

        if inner.recency.len() >= self.capacity {
            if let Some(evicted) = inner.recency.pop_back() {
                inner.index.remove(&evicted.key);
                inner.stats.record_eviction();
                debug!(key = %evicted.key, "Evicted least recently used entry");
            }
        }

        let slot = inner.recency.push_front(CacheEntry::new(key.clone(), value));
        inner.index.insert(key, slot);
        true
    }

    // == Get ==
    /// Returns a copy of the value stored under `key`, refreshing its recency.
    ///
    /// Returns `None` if the key is absent; other entries are left untouched.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.lock();

        let Some(&slot) = inner.index.get(key) else {
            inner.stats.record_miss();
            return None;
        };

        inner.recency.move_to_front(slot);
        inner.stats.record_hit();
        inner.recency.get(slot).map(|entry| entry.value.clone())
    }

    // == Remove ==
    /// Deletes `key` from the cache. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.lock();

        match inner.index.remove(key) {
            Some(slot) => {
                inner.recency.remove(slot);
                true
            }
            None => false,
        }
    }

    // == Contains ==
    /// Checks for `key` without touching its recency.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().index.contains_key(key)
    }

    // == Length ==
    /// Returns the current number of entries.
    pub fn len(&self) -> usize {
        self.lock().recency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Snapshot ==
    /// Copies every entry, ordered from most to least recently used.
    ///
    /// The lock is held only while copying, so the result is a consistent
    /// point-in-time view that can be written out without blocking callers.
    pub fn snapshot(&self) -> Vec<CacheEntry<V>> {
        self.lock().recency.iter().cloned().collect()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut stats = inner.stats.clone();
        stats.total_entries = inner.recency.len();
        stats
    }

    // Poisoning only means another caller panicked mid-operation; every
    // mutation above leaves index and list consistent before it can panic.
    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
