//! Structural compute-once cache
//!
//! "Lock on write, lock-free on read": reads of populated entries never
//! contend with in-flight computations for other keys; only callers racing
//! on the *same* unresolved key block, on that key's cell. Entries are
//! never evicted — cached values are process-lifetime artifacts.

use std::hash::Hash;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;

/// A concurrent map whose values are computed at most once per key.
///
/// The computed value is cached verbatim — storing a `Result` makes a
/// failed computation the definitive outcome for its key, re-raised to
/// every racer and every later caller rather than retried.
pub struct LockOnWriteCache<K, V> {
    entries: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K, V> LockOnWriteCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Look up an already-computed value
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries
            .get(key)
            .and_then(|entry| entry.value().get().cloned())
    }

    /// Return the value for the key, computing it if absent.
    ///
    /// For a fixed key the init function runs at most once even under
    /// concurrent access; all racers observe the single computed value.
    pub fn get_or_add(&self, key: &K, init: impl FnOnce(&K) -> V) -> V {
        // Fast path: populated entries are read without touching the
        // write side.
        if let Some(value) = self.get(key) {
            return value;
        }

        let cell = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .value()
            .clone();
        // The shard lock is released here; racers on this key serialize
        // on the cell alone.
        cell.get_or_init(|| init(key)).clone()
    }

    /// Number of entries (including in-flight ones)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> Default for LockOnWriteCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
