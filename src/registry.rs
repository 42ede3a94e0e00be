//! The [`KeyParty`] facade: a registry of jar types and open jars.

use crate::config::Config;
use crate::converter::{Convertible, ObjectConverter, Restored};
use crate::error::{Error, Result};
use crate::jar::AnyJar;
use crate::jar_type::{JarType, JsonJarType};
use crate::Table;
use serde_json::Value;
use std::collections::HashMap;
use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Name the stock JSON jar type is registered under.
pub const DEFAULT_JAR_TYPE: &str = "json";

/// Maps jar names to open jars and jar-type names to jar types.
///
/// ```rust,no_run
/// use keyparty::{KeyParty, DEFAULT_JAR_TYPE};
/// use serde_json::json;
///
/// let mut kp = KeyParty::new("data");
/// kp.add_jar("users", DEFAULT_JAR_TYPE, true).unwrap();
/// kp.set("users", "alice", json!({"admin": true})).unwrap();
/// assert_eq!(kp.get("users", "alice").unwrap(), Some(json!({"admin": true})));
/// ```
pub struct KeyParty {
    config: Config,
    jar_types: HashMap<String, Arc<dyn JarType>>,
    jars: HashMap<String, OpenJar>,
    converter: ObjectConverter,
}

/// A registered jar and the name of the jar type that opened it.
struct OpenJar {
    jar_type: String,
    jar: Box<dyn AnyJar>,
}

impl KeyParty {
    /// Store jar files under `data_dir` with default settings.
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self::with_config(Config::with_data_dir(data_dir))
    }

    /// Store with explicit settings. Registers the `"json"` jar type.
    pub fn with_config(config: Config) -> Self {
        let mut kp = Self {
            jar_types: HashMap::new(),
            jars: HashMap::new(),
            converter: ObjectConverter::new(),
            config,
        };
        let json = JsonJarType::json(&kp.config);
        kp.register_jar_type(DEFAULT_JAR_TYPE, json);
        kp
    }

    /// Settings this store was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- jar types ----

    /// Register (or replace) a jar type under `name`.
    pub fn register_jar_type(
        &mut self,
        name: impl Into<String>,
        jar_type: impl JarType + 'static,
    ) -> &mut Self {
        let name = name.into();
        debug!(jar_type = %name, "registered jar type");
        self.jar_types.insert(name, Arc::new(jar_type));
        self
    }

    /// Jar type registered under `name`.
    #[must_use]
    pub fn jar_type(&self, name: &str) -> Option<&Arc<dyn JarType>> {
        self.jar_types.get(name)
    }

    /// Names of all registered jar types, sorted.
    #[must_use]
    pub fn jar_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jar_types.keys().cloned().collect();
        names.sort();
        names
    }

    // ---- jars ----

    /// Open the jar `name` using the jar type `type_name` and keep it in the
    /// registry. An already-open jar of the same type is reused; one opened
    /// with another type is an [`Error::AlreadyExists`]. With `create`, a
    /// missing backing blob is created empty; without it, that's an
    /// [`Error::NotFound`].
    pub fn add_jar(&mut self, name: &str, type_name: &str, create: bool) -> Result<&dyn AnyJar> {
        let jar_type = self
            .jar_types
            .get(type_name)
            .ok_or_else(|| Error::NotFound(format!("no jar type registered as `{type_name}`")))?;
        match self.jar_type_of(name).map(str::to_owned) {
            Some(open_as) if open_as != type_name => {
                return Err(Error::AlreadyExists(format!(
                    "jar `{name}` is already open as a `{open_as}` jar, not `{type_name}`"
                )));
            }
            Some(_) => {}
            None => {
                let jar = jar_type.open_jar(name, create)?;
                debug!(jar = name, jar_type = type_name, "opened jar");
                self.jars.insert(
                    name.to_owned(),
                    OpenJar {
                        jar_type: type_name.to_owned(),
                        jar,
                    },
                );
            }
        }
        self.jar(name)
    }

    /// An open jar.
    pub fn jar(&self, name: &str) -> Result<&dyn AnyJar> {
        self.jars
            .get(name)
            .map(|open| open.jar.as_ref())
            .ok_or_else(|| Error::NotFound(format!("jar `{name}` has not been added")))
    }

    /// Name of the jar type an open jar was opened with.
    #[must_use]
    pub fn jar_type_of(&self, name: &str) -> Option<&str> {
        self.jars.get(name).map(|open| open.jar_type.as_str())
    }

    /// Names of all open jars, sorted.
    #[must_use]
    pub fn jar_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.jars.keys().cloned().collect();
        names.sort();
        names
    }

    // ---- rows ----

    /// Value for `key` in `jar`.
    pub fn get(&self, jar: &str, key: &str) -> Result<Option<Value>> {
        self.jar(jar)?.get(key)
    }

    /// Insert or overwrite `key` in `jar`.
    pub fn set(&self, jar: &str, key: &str, value: Value) -> Result<()> {
        self.jar(jar)?.upsert(key, value).map(|_| ())
    }

    /// Insert `key` into `jar`, failing with [`Error::DuplicateKey`] if present.
    pub fn insert(&self, jar: &str, key: &str, value: Value) -> Result<()> {
        self.jar(jar)?.insert(key, value)
    }

    /// Overwrite `key` in `jar`, returning the previous value. Creates the
    /// row if it's missing, same as [`set`](Self::set).
    pub fn update(&self, jar: &str, key: &str, value: Value) -> Result<Option<Value>> {
        self.jar(jar)?.upsert(key, value)
    }

    /// Remove `key` from `jar`. `false` if it wasn't there.
    pub fn remove(&self, jar: &str, key: &str) -> Result<bool> {
        self.jar(jar)?.delete(key)
    }

    /// Every row in `jar`.
    pub fn get_all(&self, jar: &str) -> Result<Table> {
        self.jar(jar)?.get_all()
    }

    /// Truncate `jar` to `{}`.
    pub fn empty_jar(&self, jar: &str) -> Result<()> {
        self.jar(jar)?.empty()
    }

    /// Delete `jar` and its backing blob, and drop it from the registry.
    ///
    /// This never returns `Ok`: success comes back as
    /// `Err(Error::JarRemoved { .. })` so deleting data can't pass
    /// unnoticed. Anything else is a real failure.
    ///
    /// ```rust,no_run
    /// # use keyparty::{KeyParty, DEFAULT_JAR_TYPE};
    /// let mut kp = KeyParty::new("data");
    /// kp.add_jar("scratch", DEFAULT_JAR_TYPE, true).unwrap();
    /// match kp.delete_jar("scratch") {
    ///     Err(e) if e.is_jar_removed() => {}
    ///     Err(e) => panic!("delete failed: {e}"),
    ///     Ok(never) => match never {},
    /// }
    /// ```
    pub fn delete_jar(&mut self, jar: &str) -> Result<Infallible> {
        let location = self.jar(jar)?.destroy()?;
        self.jars.remove(jar);
        debug!(jar, %location, "deleted jar");
        Err(Error::JarRemoved {
            name: jar.to_owned(),
            location,
        })
    }

    // ---- typed values ----

    /// The object converter, for registering types.
    pub fn converter_mut(&mut self) -> &mut ObjectConverter {
        &mut self.converter
    }

    /// The object converter.
    #[must_use]
    pub fn converter(&self) -> &ObjectConverter {
        &self.converter
    }

    /// Store a convertible value under `key`, tagged with its type name.
    pub fn set_object<T: Convertible>(&self, jar: &str, key: &str, value: &T) -> Result<()> {
        self.set(jar, key, self.converter.to_store(value))
    }

    /// Read `key` and rebuild it as a typed value if its tag is registered.
    pub fn get_object(&self, jar: &str, key: &str) -> Result<Option<Restored>> {
        match self.get(jar, key)? {
            Some(value) => self.converter.from_store(value).map(Some),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for KeyParty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyParty")
            .field("config", &self.config)
            .field("jar_types", &self.jar_type_names())
            .field("jars", &self.jar_names())
            .finish_non_exhaustive()
    }
}
