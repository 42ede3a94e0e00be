//! Jar types: strategy bundles that open jars.
//!
//! A jar type fixes one validator, one serializer, one store adapter and a
//! cache factory. Every jar it opens shares the first three and gets a fresh
//! cache of its own.

use crate::cache::{Cache, LookasideCache};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::jar::{AnyJar, Jar, Parts};
use crate::serializer::{JsonSerializer, PassThruSerializer, Serializer};
use crate::store::{FileStoreAdapter, MemoryStoreAdapter, StoreAdapter};
use crate::validator::{JsonValidator, Validator};
use crate::Table;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds the cache for each newly opened jar.
pub type CacheFactory = Arc<dyn Fn() -> Box<dyn Cache> + Send + Sync>;

/// Object-safe jar type, as stored in the [`KeyParty`](crate::KeyParty)
/// registry.
pub trait JarType: Send + Sync {
    /// Validator shared by this type's jars.
    fn validator(&self) -> &dyn Validator;

    /// `true` if a jar called `name` already has a backing blob.
    fn jar_exists(&self, name: &str) -> Result<bool>;

    /// Open the jar called `name`. A missing backing blob is an
    /// [`Error::NotFound`] unless `create` is set, in which case an empty
    /// table is written first.
    fn open_jar(&self, name: &str, create: bool) -> Result<Box<dyn AnyJar>>;
}

/// A jar type assembled from concrete strategies.
///
/// ```rust,no_run
/// use keyparty::{BasicJarType, JsonSerializer, store::FileStoreAdapter};
///
/// let jar_type = BasicJarType::new(JsonSerializer::new(), FileStoreAdapter::new("data"))
///     .caching(false);
/// let jar = jar_type.jar("settings", true).unwrap();
/// jar.upsert("theme", "dark".into()).unwrap();
/// ```
pub struct BasicJarType<S, A> {
    parts: Arc<Parts<S, A>>,
    cache_factory: CacheFactory,
}

/// Pretty JSON files on local disk.
pub type JsonJarType = BasicJarType<JsonSerializer, FileStoreAdapter>;

/// Structured tables kept in memory, no encoding at all.
pub type MemoryJarType = BasicJarType<PassThruSerializer, MemoryStoreAdapter<Table>>;

impl<S, A> BasicJarType<S, A>
where
    S: Serializer,
    A: StoreAdapter<Blob = S::Blob>,
{
    /// Bind `serializer` and `adapter` with the JSON validator and an
    /// enabled lookaside cache.
    pub fn new(serializer: S, adapter: A) -> Self {
        Self {
            parts: Arc::new(Parts {
                validator: Box::new(JsonValidator::new()),
                serializer,
                adapter,
            }),
            cache_factory: Arc::new(|| Box::new(LookasideCache::new(true)) as Box<dyn Cache>),
        }
    }

    /// Replace the validator.
    ///
    /// Must be called before any jar is opened: jars keep the strategies
    /// they were opened with.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        match Arc::get_mut(&mut self.parts) {
            Some(parts) => parts.validator = Box::new(validator),
            None => warn!("validator not replaced, jars already share this type's strategies"),
        }
        self
    }

    /// Turn the lookaside cache on or off for jars opened from now on.
    pub fn caching(mut self, enabled: bool) -> Self {
        self.cache_factory =
            Arc::new(move || Box::new(LookasideCache::new(enabled)) as Box<dyn Cache>);
        self
    }

    /// Build each jar's cache with `factory`.
    pub fn cache_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Cache> + Send + Sync + 'static,
    {
        self.cache_factory = Arc::new(factory);
        self
    }

    /// The store adapter.
    #[must_use]
    pub fn adapter(&self) -> &A {
        &self.parts.adapter
    }

    /// The serializer.
    #[must_use]
    pub fn serializer(&self) -> &S {
        &self.parts.serializer
    }

    /// Open the jar called `name` as a concrete [`Jar`].
    pub fn jar(&self, name: &str, create: bool) -> Result<Jar<S, A>> {
        self.parts.validator.validate_name(name)?;
        if !self.parts.adapter.exists(name)? {
            if !create {
                return Err(Error::NotFound(format!(
                    "invalid jar `{name}` requested, do you need to create this jar?"
                )));
            }
            let blob = self.parts.serializer.encode(&Table::new())?;
            self.parts.adapter.create(name, blob)?;
            debug!(jar = name, location = %self.parts.adapter.locate(name), "created jar");
        }
        Ok(Jar::new(
            name.to_owned(),
            Arc::clone(&self.parts),
            (self.cache_factory)(),
        ))
    }
}

impl JsonJarType {
    /// Pretty (or compact, per `config.pretty`) JSON files under
    /// `config.data_dir`, cache per `config.cache`.
    pub fn json(config: &Config) -> Self {
        let serializer = if config.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::new()
        };
        let adapter = FileStoreAdapter::new(&config.data_dir).with_extension(&config.extension);
        BasicJarType::new(serializer, adapter).caching(config.cache)
    }
}

impl MemoryJarType {
    /// In-memory structured tables with caching on.
    pub fn memory() -> Self {
        BasicJarType::new(PassThruSerializer, MemoryStoreAdapter::new())
    }
}

impl<S, A> JarType for BasicJarType<S, A>
where
    S: Serializer + 'static,
    A: StoreAdapter<Blob = S::Blob> + 'static,
{
    fn validator(&self) -> &dyn Validator {
        self.parts.validator.as_ref()
    }

    fn jar_exists(&self, name: &str) -> Result<bool> {
        self.parts.validator.validate_name(name)?;
        self.parts.adapter.exists(name)
    }

    fn open_jar(&self, name: &str, create: bool) -> Result<Box<dyn AnyJar>> {
        Ok(Box::new(self.jar(name, create)?))
    }
}

impl<S, A> std::fmt::Debug for BasicJarType<S, A>
where
    S: std::fmt::Debug,
    A: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicJarType")
            .field("serializer", &self.parts.serializer)
            .field("adapter", &self.parts.adapter)
            .finish_non_exhaustive()
    }
}
