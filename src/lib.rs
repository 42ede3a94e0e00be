//! Embedded flat-file key/value store with pluggable storage back-ends.
//!
//! Each named jar (table) is one JSON document, addressed by string keys.
//! A jar type picks the validator, serializer, store adapter and cache; the
//! [`KeyParty`] facade keeps a registry of jar types and open jars.
//!
//! ```rust,no_run
//! use keyparty::{KeyParty, DEFAULT_JAR_TYPE};
//! use serde_json::json;
//!
//! let mut kp = KeyParty::new("data");
//! kp.add_jar("test", DEFAULT_JAR_TYPE, true).unwrap();
//! kp.set("test", "a", json!({"integer": 1})).unwrap();
//! assert_eq!(kp.get("test", "a").unwrap(), Some(json!({"integer": 1})));
//! ```
//!
//! **Single writer per table.** Every write rewrites the whole table and
//! nothing is locked across the read-modify-write, so two writers (two jars,
//! two processes) clobber each other. Use a real database for that.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod cache;
pub mod config;
pub mod converter;
pub mod error;
pub mod jar;
pub mod jar_type;
pub mod persist;
pub mod registry;
pub mod serializer;
pub mod store;
pub mod validator;

pub use cache::{Cache, LookasideCache};
pub use config::{Config, ConfigBuilder};
pub use converter::{Convertible, ObjectConverter, Restored, StoredObject, CLASS_NAME_FIELD};
pub use error::{Error, Result, SerializationErrorKind};
pub use jar::{AnyJar, Jar};
pub use jar_type::{BasicJarType, CacheFactory, JarType, JsonJarType, MemoryJarType};
pub use registry::{KeyParty, DEFAULT_JAR_TYPE};
pub use serializer::{JsonSerializer, PassThruSerializer, Serializer};
pub use store::{FileStoreAdapter, MemoryStoreAdapter, StoreAdapter};
pub use validator::{JsonValidator, Validator};

/// A jar's rows: key → JSON value.
pub type Table = serde_json::Map<String, serde_json::Value>;

/// Default map backend for in-memory stores: ShardMap.
pub type DefaultBackend<V> = shardmap::ShardMap<String, V>;
