//! Pluggable map backends.
//!
//! The in-memory store adapter keeps its blobs in one of these and the
//! lookaside cache keeps its rows in one. Implement [`MapBackend`] to bring
//! your own concurrent map.

use std::collections::HashMap;

/// String-keyed map that can sit behind a shared reference.
///
/// Every method works with owned values so callers stay uniform regardless
/// of how the backend stores things internally. Backends that keep values
/// behind an `Arc` (like ShardMap) clone on read.
pub trait MapBackend<V>: Send + Sync
where
    V: Clone + Send + Sync,
{
    /// Insert a value, returning the previous one if any.
    fn insert(&self, key: String, value: V) -> Option<V>;

    /// Look up a value.
    fn get(&self, key: &str) -> Option<V>;

    /// Remove a key, returning its value if it was present.
    fn remove(&self, key: &str) -> Option<V>;

    /// Snapshot of all keys. Must not hold locks once returned.
    fn keys(&self) -> Vec<String>;

    /// Number of entries.
    fn map_len(&self) -> usize;

    /// Check if a key exists without cloning the value. Override for
    /// backends that can do this cheaply (most can).
    fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Drop all entries. The default walks the key snapshot; override with
    /// the backend's native clear when available.
    fn clear(&self) {
        for k in self.keys() {
            self.remove(&k);
        }
    }
}

// ---- ShardMap ----------------------------------------------------------------

impl<V> MapBackend<V> for shardmap::ShardMap<String, V>
where
    V: Clone + Send + Sync + 'static,
{
    fn insert(&self, key: String, value: V) -> Option<V> {
        self.insert(key, value).map(|arc| (*arc).clone())
    }

    fn get(&self, key: &str) -> Option<V> {
        self.get(&key.to_owned()).map(|arc| (*arc).clone())
    }

    fn remove(&self, key: &str) -> Option<V> {
        self.remove(&key.to_owned()).map(|arc| (*arc).clone())
    }

    fn keys(&self) -> Vec<String> {
        self.iter_snapshot().map(|(k, _)| k).collect()
    }

    fn map_len(&self) -> usize {
        self.len()
    }

    // ShardMap::get hands back an Arc, so this is a refcount bump, no clone.
    fn contains_key(&self, key: &str) -> bool {
        shardmap::ShardMap::get(self, &key.to_owned()).is_some()
    }
}

// ---- RwLock<HashMap> ---------------------------------------------------------

impl<V> MapBackend<V> for parking_lot::RwLock<HashMap<String, V>>
where
    V: Clone + Send + Sync,
{
    fn insert(&self, key: String, value: V) -> Option<V> {
        self.write().insert(key, value)
    }

    fn get(&self, key: &str) -> Option<V> {
        self.read().get(key).cloned()
    }

    fn remove(&self, key: &str) -> Option<V> {
        self.write().remove(key)
    }

    fn keys(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    fn map_len(&self) -> usize {
        self.read().len()
    }

    fn contains_key(&self, key: &str) -> bool {
        self.read().contains_key(key)
    }

    fn clear(&self) {
        self.write().clear()
    }
}

// ---- DashMap (feature-gated) -------------------------------------------------

#[cfg(feature = "dashmap")]
impl<V> MapBackend<V> for dashmap::DashMap<String, V>
where
    V: Clone + Send + Sync + 'static,
{
    fn insert(&self, key: String, value: V) -> Option<V> {
        self.insert(key, value)
    }

    fn get(&self, key: &str) -> Option<V> {
        self.get(key).map(|r| r.value().clone())
    }

    fn remove(&self, key: &str) -> Option<V> {
        self.remove(key).map(|(_, v)| v)
    }

    fn keys(&self) -> Vec<String> {
        self.iter().map(|r| r.key().clone()).collect()
    }

    fn map_len(&self) -> usize {
        self.len()
    }

    fn contains_key(&self, key: &str) -> bool {
        dashmap::DashMap::contains_key(self, key)
    }

    fn clear(&self) {
        dashmap::DashMap::clear(self)
    }
}
