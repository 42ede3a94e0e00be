//! Jars: row-level CRUD over one table.
//!
//! There is no partial-write primitive underneath, so every mutation reads
//! the whole table, changes it and writes the whole table back. Tables are
//! expected to be small.
//!
//! **Single writer per table.** Two jars over the same table (or two
//! processes) race on read-modify-write and the last write wins. Each jar
//! has its own cache, so they can also see each other's data go stale.

use crate::cache::Cache;
use crate::error::{Error, Result};
use crate::serializer::Serializer;
use crate::store::StoreAdapter;
use crate::validator::Validator;
use crate::Table;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// The strategies a jar type binds together. Shared by every jar the type
/// opens.
pub(crate) struct Parts<S, A> {
    pub(crate) validator: Box<dyn Validator>,
    pub(crate) serializer: S,
    pub(crate) adapter: A,
}

/// Object-safe view of a jar, so jars of different types can live in one
/// registry.
pub trait AnyJar: Send + Sync {
    /// Jar (table) name.
    fn name(&self) -> &str;

    /// Value for `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write `value` under `key`. With `allow_overwrite == false` an existing
    /// key is an [`Error::DuplicateKey`]. Returns the previous value.
    fn put(&self, key: &str, value: Value, allow_overwrite: bool) -> Result<Option<Value>>;

    /// Strict insert: fails if `key` exists.
    fn insert(&self, key: &str, value: Value) -> Result<()> {
        self.put(key, value, false).map(|_| ())
    }

    /// Insert or overwrite, returning the previous value.
    fn upsert(&self, key: &str, value: Value) -> Result<Option<Value>> {
        self.put(key, value, true)
    }

    /// Remove `key`. `false` if it wasn't there.
    fn delete(&self, key: &str) -> Result<bool>;

    /// `true` if `key` exists.
    fn contains_key(&self, key: &str) -> Result<bool>;

    /// Whole table as currently persisted. Never served from cache.
    fn get_all(&self) -> Result<Table>;

    /// Upsert many rows with a single write. Every key is checked first.
    fn extend(&self, entries: Vec<(String, Value)>) -> Result<()>;

    /// Truncate the table to `{}` (creating it if needed) and drop the cache.
    fn empty(&self) -> Result<()>;

    /// Delete the backing blob and drop the cache. Returns where it lived.
    fn destroy(&self) -> Result<String>;
}

/// One table: validator, serializer, store adapter and a private cache.
///
/// Created by a [`JarType`](crate::JarType).
pub struct Jar<S, A> {
    name: String,
    parts: Arc<Parts<S, A>>,
    cache: Box<dyn Cache>,
    /// Last table this jar decoded or wrote. Lets one logical operation reuse
    /// a parse instead of reading the file twice.
    decoded: Mutex<Option<Table>>,
}

impl<S, A> Jar<S, A>
where
    S: Serializer,
    A: StoreAdapter<Blob = S::Blob>,
{
    pub(crate) fn new(name: String, parts: Arc<Parts<S, A>>, cache: Box<dyn Cache>) -> Self {
        Self {
            name,
            parts,
            cache,
            decoded: Mutex::new(None),
        }
    }

    /// Jar (table) name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// This jar's cache.
    #[must_use]
    pub fn cache(&self) -> &dyn Cache {
        self.cache.as_ref()
    }

    /// Last table this jar read or wrote, without touching the store. `None`
    /// before the first operation.
    #[must_use]
    pub fn snapshot(&self) -> Option<Table> {
        self.decoded.lock().clone()
    }

    /// Check `key` against the jar type's validator.
    pub fn check_key(&self, key: &str) -> Result<()> {
        self.parts.validator.validate_key(key)
    }

    // ---- reads ----

    /// Value for `key`, from cache if possible, otherwise from the table.
    /// A table hit is cached.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        self.check_key(key)?;
        if let Some(value) = self.cache.get(key) {
            trace!(jar = %self.name, key, "cache hit");
            return Ok(Some(value));
        }
        trace!(jar = %self.name, key, "cache miss");
        let table = self.read_table(Refresh::Always)?;
        match table.get(key) {
            Some(value) => {
                self.cache.set(key, value.clone());
                Ok(Some(value.clone()))
            }
            None => Ok(None),
        }
    }

    /// `true` if `key` exists. Answered from cache when possible.
    pub fn contains_key(&self, key: &str) -> Result<bool> {
        self.check_key(key)?;
        if self.cache.get(key).is_some() {
            return Ok(true);
        }
        Ok(self.read_table(Refresh::Always)?.contains_key(key))
    }

    /// Whole table as currently persisted. Bypasses the cache.
    pub fn get_all(&self) -> Result<Table> {
        self.read_table(Refresh::Always)
    }

    /// All keys currently persisted.
    pub fn keys(&self) -> Result<Vec<String>> {
        Ok(self.get_all()?.keys().cloned().collect())
    }

    /// Number of rows currently persisted.
    pub fn len(&self) -> Result<usize> {
        Ok(self.get_all()?.len())
    }

    /// `true` when the table has no rows.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // ---- writes ----

    /// Write `value` under `key`. With `allow_overwrite == false` an existing
    /// key fails with [`Error::DuplicateKey`] and nothing is written. Returns
    /// the previous value.
    pub fn put(&self, key: &str, value: Value, allow_overwrite: bool) -> Result<Option<Value>> {
        self.check_key(key)?;
        let mut table = self.read_table(Refresh::Always)?;
        if !allow_overwrite && table.contains_key(key) {
            return Err(Error::DuplicateKey(key.to_owned()));
        }
        let previous = table.insert(key.to_owned(), value.clone());
        self.write_table(&table)?;
        self.cache.set(key, value);
        Ok(previous)
    }

    /// Strict insert: fails with [`Error::DuplicateKey`] if `key` exists.
    pub fn insert(&self, key: &str, value: Value) -> Result<()> {
        self.put(key, value, false).map(|_| ())
    }

    /// Insert or overwrite, returning the previous value.
    pub fn upsert(&self, key: &str, value: Value) -> Result<Option<Value>> {
        self.put(key, value, true)
    }

    /// Remove `key`. Returns `false` (and writes nothing) if it wasn't there.
    pub fn delete(&self, key: &str) -> Result<bool> {
        self.check_key(key)?;
        let mut table = self.read_table(Refresh::Always)?;
        if table.remove(key).is_none() {
            self.cache.remove(key);
            return Ok(false);
        }
        self.write_table(&table)?;
        self.cache.remove(key);
        Ok(true)
    }

    /// Upsert many rows with one read and one write. All keys are validated
    /// before any I/O, so a bad key leaves the table untouched.
    pub fn extend<I>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let entries: Vec<(String, Value)> = entries.into_iter().collect();
        for (key, _) in &entries {
            self.check_key(key)?;
        }
        let mut table = self.read_table(Refresh::Always)?;
        for (key, value) in &entries {
            table.insert(key.clone(), value.clone());
        }
        self.write_table(&table)?;
        for (key, value) in entries {
            self.cache.set(&key, value);
        }
        Ok(())
    }

    /// Mutate the row at `key` in place. Returns `false` if the key doesn't
    /// exist (nothing is written in that case).
    pub fn update_with<F>(&self, key: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&mut Value),
    {
        self.check_key(key)?;
        let mut table = self.read_table(Refresh::Always)?;
        let Some(value) = table.get_mut(key) else {
            return Ok(false);
        };
        f(value);
        let value = value.clone();
        self.write_table(&table)?;
        self.cache.set(key, value);
        Ok(true)
    }

    /// Existing value for `key`, or write `default` and return it.
    pub fn get_or_insert(&self, key: &str, default: Value) -> Result<Value> {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }
        // get just decoded the table on its miss, reuse that parse
        let mut table = self.read_table(Refresh::Reuse)?;
        table.insert(key.to_owned(), default.clone());
        self.write_table(&table)?;
        self.cache.set(key, default.clone());
        Ok(default)
    }

    /// Truncate the table to `{}` (creating it if absent) and clear the cache.
    /// Running it twice changes nothing.
    pub fn empty(&self) -> Result<()> {
        let empty = Table::new();
        let blob = self.parts.serializer.encode(&empty)?;
        self.parts.adapter.empty(&self.name, blob)?;
        self.cache.clear();
        *self.decoded.lock() = Some(empty);
        debug!(jar = %self.name, "emptied jar");
        Ok(())
    }

    /// Delete the backing blob and clear the cache. Returns where the data
    /// used to live.
    pub fn destroy(&self) -> Result<String> {
        let location = self.parts.adapter.locate(&self.name);
        self.parts.adapter.remove(&self.name)?;
        self.cache.clear();
        *self.decoded.lock() = None;
        debug!(jar = %self.name, %location, "destroyed jar");
        Ok(location)
    }

    // ---- internal ----

    fn read_table(&self, refresh: Refresh) -> Result<Table> {
        let mut decoded = self.decoded.lock();
        if let (Refresh::Reuse, Some(table)) = (refresh, decoded.as_ref()) {
            return Ok(table.clone());
        }
        let blob = self.parts.adapter.read(&self.name)?;
        let table = self.parts.serializer.decode(blob)?;
        *decoded = Some(table.clone());
        Ok(table)
    }

    fn write_table(&self, table: &Table) -> Result<usize> {
        let blob = self.parts.serializer.encode(table)?;
        let written = self.parts.adapter.write(&self.name, blob, true)?;
        *self.decoded.lock() = Some(table.clone());
        trace!(jar = %self.name, rows = table.len(), written, "persisted table");
        Ok(written)
    }
}

/// Whether a read may reuse the table decoded earlier in the same operation.
#[derive(Debug, Clone, Copy)]
enum Refresh {
    Always,
    Reuse,
}

impl<S, A> AnyJar for Jar<S, A>
where
    S: Serializer,
    A: StoreAdapter<Blob = S::Blob>,
{
    fn name(&self) -> &str {
        Jar::name(self)
    }

    fn get(&self, key: &str) -> Result<Option<Value>> {
        Jar::get(self, key)
    }

    fn put(&self, key: &str, value: Value, allow_overwrite: bool) -> Result<Option<Value>> {
        Jar::put(self, key, value, allow_overwrite)
    }

    fn delete(&self, key: &str) -> Result<bool> {
        Jar::delete(self, key)
    }

    fn contains_key(&self, key: &str) -> Result<bool> {
        Jar::contains_key(self, key)
    }

    fn get_all(&self) -> Result<Table> {
        Jar::get_all(self)
    }

    fn extend(&self, entries: Vec<(String, Value)>) -> Result<()> {
        Jar::extend(self, entries)
    }

    fn empty(&self) -> Result<()> {
        Jar::empty(self)
    }

    fn destroy(&self) -> Result<String> {
        Jar::destroy(self)
    }
}

impl<S, A> std::fmt::Debug for Jar<S, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jar")
            .field("name", &self.name)
            .field("caching", &self.cache.is_enabled())
            .finish_non_exhaustive()
    }
}
