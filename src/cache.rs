//! Per-jar lookaside cache.
//!
//! Saves re-parsing a jar's file every time a single key is read. There is
//! no TTL, size bound or eviction: entries live until the jar overwrites,
//! deletes or empties them, or the process exits.

use crate::backend::MapBackend;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Key → last-known value for one jar.
pub trait Cache: Send + Sync {
    /// Cached value for `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Remember `value` for `key`.
    fn set(&self, key: &str, value: Value);

    /// Forget `key`.
    fn remove(&self, key: &str);

    /// Forget everything.
    fn clear(&self);

    /// Whether `get`/`set` do anything.
    fn is_enabled(&self) -> bool;

    /// Number of cached entries.
    fn len(&self) -> usize;

    /// `true` when nothing is cached.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Bypassable cache over a [`MapBackend`].
///
/// When disabled, `get` always misses and `set` is a no-op. `remove` and
/// `clear` are honored either way.
pub struct LookasideCache<M = RwLock<HashMap<String, Value>>> {
    enabled: bool,
    map: M,
}

impl LookasideCache {
    /// Cache on the default `RwLock<HashMap>` backend.
    pub fn new(enabled: bool) -> Self {
        Self::with_backend(enabled, RwLock::default())
    }
}

impl<M: MapBackend<Value>> LookasideCache<M> {
    /// Cache on a caller-supplied backend.
    pub fn with_backend(enabled: bool, map: M) -> Self {
        Self { enabled, map }
    }
}

impl Default for LookasideCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl<M: MapBackend<Value>> Cache for LookasideCache<M> {
    fn get(&self, key: &str) -> Option<Value> {
        if !self.enabled {
            return None;
        }
        self.map.get(key)
    }

    fn set(&self, key: &str, value: Value) {
        if self.enabled {
            self.map.insert(key.to_owned(), value);
        }
    }

    fn remove(&self, key: &str) {
        self.map.remove(key);
    }

    fn clear(&self) {
        self.map.clear();
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn len(&self) -> usize {
        self.map.map_len()
    }
}

impl<M: MapBackend<Value>> std::fmt::Debug for LookasideCache<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookasideCache")
            .field("enabled", &self.enabled)
            .field("entries", &self.map.map_len())
            .finish()
    }
}
