//! Per-run memoization of repository queries
//!
//! Repository state is treated as immutable for the duration of a run, so
//! entries are never invalidated or evicted. Failures are not stored: a
//! later lookup for the same key computes again.
//!
//! Concurrent lookups for one key are coalesced. The first caller marks the
//! key pending and computes outside the lock; later callers block on a
//! condition variable until the value lands (or the computation fails, in
//! which case one of them takes over).

use crate::domain::{CommitRef, TagRef};
use crate::error::Result;
use git2::Oid;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

enum Slot<V> {
    Pending,
    Ready(V),
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// A memoizing map with at-most-one computation per key
pub struct QueryCache<K, V> {
    slots: Mutex<HashMap<K, Slot<V>>>,
    settled: Condvar,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> Default for QueryCache<K, V> {
    fn default() -> Self {
        QueryCache {
            slots: Mutex::new(HashMap::new()),
            settled: Condvar::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored value for `key`, or run `compute` exactly once
    pub fn get_or_compute<F>(&self, key: K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        let mut slots = self.lock();
        loop {
            match slots.get(&key) {
                Some(Slot::Ready(value)) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(value.clone());
                }
                Some(Slot::Pending) => {}
                None => break,
            }
            slots = self
                .settled
                .wait(slots)
                .unwrap_or_else(PoisonError::into_inner);
        }
        slots.insert(key.clone(), Slot::Pending);
        drop(slots);
        self.misses.fetch_add(1, Ordering::Relaxed);

        let mut pending = PendingGuard {
            cache: self,
            key: Some(key),
        };
        let result = compute();
        if let Ok(value) = &result {
            pending.fulfil(value.clone());
        }
        result
    }

    /// Whether a computed value is stored for `key`
    pub fn contains(&self, key: &K) -> bool {
        matches!(self.lock().get(key), Some(Slot::Ready(_)))
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the pending marker if the computation fails or panics
struct PendingGuard<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    cache: &'a QueryCache<K, V>,
    key: Option<K>,
}

impl<K, V> PendingGuard<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn fulfil(&mut self, value: V) {
        if let Some(key) = self.key.take() {
            self.cache.lock().insert(key, Slot::Ready(value));
            self.cache.settled.notify_all();
        }
    }
}

impl<K, V> Drop for PendingGuard<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.cache.lock().remove(&key);
            self.cache.settled.notify_all();
        }
    }
}

/// The three memoized repository queries of one resolution run
#[derive(Default)]
pub struct RepositoryQueryCache {
    pub commits: QueryCache<Oid, CommitRef>,
    pub tags: QueryCache<Oid, Vec<TagRef>>,
    /// Keyed by the ordered pair so `(a, b)` and `(b, a)` share an entry
    pub merge_bases: QueryCache<(Oid, Oid), Option<Oid>>,
}

impl RepositoryQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalise a merge-base key
    pub fn merge_base_key(a: Oid, b: Oid) -> (Oid, Oid) {
        if a <= b {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn stats(&self) -> CacheStats {
        [
            self.commits.stats(),
            self.tags.stats(),
            self.merge_bases.stats(),
        ]
        .iter()
        .fold(CacheStats::default(), |acc, s| CacheStats {
            hits: acc.hits + s.hits,
            misses: acc.misses + s.misses,
        })
    }
}
