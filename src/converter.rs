//! Type-preserving conversion between Rust values and storable rows.
//!
//! A converted row is a JSON object with one extra field,
//! [`CLASS_NAME_FIELD`], naming the type it came from. On the way back the
//! tag is looked up in an explicit registry: types have to be registered up
//! front, nothing is resolved by name at runtime. An unknown tag is not an
//! error, the row simply comes back as plain data.
//!
//! ```
//! use keyparty::{Convertible, ObjectConverter, Table};
//! use serde_json::json;
//!
//! #[derive(Default)]
//! struct Point { x: i64, y: i64 }
//!
//! impl Convertible for Point {
//!     const TYPE_NAME: &'static str = "demo::Point";
//!
//!     fn export_data(&self) -> Table {
//!         let mut t = Table::new();
//!         t.insert("x".into(), json!(self.x));
//!         t.insert("y".into(), json!(self.y));
//!         t
//!     }
//!
//!     fn import_data(&mut self, data: Table) -> keyparty::Result<()> {
//!         self.x = data.get("x").and_then(|v| v.as_i64()).unwrap_or_default();
//!         self.y = data.get("y").and_then(|v| v.as_i64()).unwrap_or_default();
//!         Ok(())
//!     }
//! }
//!
//! let mut converter = ObjectConverter::new();
//! converter.register::<Point>();
//!
//! let row = converter.to_store(&Point { x: 1, y: 2 });
//! let back: Point = converter.from_store(row).unwrap().into_typed().unwrap();
//! assert_eq!((back.x, back.y), (1, 2));
//! ```

use crate::error::{Error, Result};
use crate::Table;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use tracing::warn;

/// Reserved field holding the originating type's name.
pub const CLASS_NAME_FIELD: &str = "_class_name";

/// A type that knows how to export itself to a plain mapping and import
/// itself back.
pub trait Convertible: Default + Send + 'static {
    /// Fully-qualified name written into [`CLASS_NAME_FIELD`].
    const TYPE_NAME: &'static str;

    /// Field mapping for this value. Must not use [`CLASS_NAME_FIELD`].
    fn export_data(&self) -> Table;

    /// Fill a freshly defaulted instance from a stored mapping.
    fn import_data(&mut self, data: Table) -> Result<()>;
}

type Decoder = Box<dyn Fn(Table) -> Result<Box<dyn Any + Send>> + Send + Sync>;

/// What [`ObjectConverter::from_store`] hands back.
#[derive(Debug)]
pub enum Restored {
    /// The tag named a registered type and a new instance was built.
    Object(StoredObject),
    /// Plain data: no tag, or a tag nobody registered. Returned unchanged.
    Data(Value),
}

impl Restored {
    /// Take the typed instance out, or fail with [`Error::Conversion`] if
    /// this is plain data or a different type.
    pub fn into_typed<T: 'static>(self) -> Result<T> {
        match self {
            Restored::Object(obj) => obj.downcast::<T>().map_err(|obj| {
                Error::Conversion(format!(
                    "stored object is a `{}`, not a `{}`",
                    obj.type_name,
                    std::any::type_name::<T>()
                ))
            }),
            Restored::Data(_) => Err(Error::Conversion(format!(
                "stored row is plain data, not a `{}`",
                std::any::type_name::<T>()
            ))),
        }
    }

    /// The plain data, if that's what this is.
    #[must_use]
    pub fn as_data(&self) -> Option<&Value> {
        match self {
            Restored::Data(v) => Some(v),
            Restored::Object(_) => None,
        }
    }

    /// `true` if a typed instance was rebuilt.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Restored::Object(_))
    }
}

/// A rebuilt instance together with the tag it was stored under.
pub struct StoredObject {
    type_name: String,
    inner: Box<dyn Any + Send>,
}

impl StoredObject {
    /// Tag the instance was stored under.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Borrow the instance as `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    /// Take the instance as `T`, handing `self` back on a type mismatch.
    pub fn downcast<T: 'static>(self) -> std::result::Result<T, Self> {
        let StoredObject { type_name, inner } = self;
        match inner.downcast::<T>() {
            Ok(boxed) => Ok(*boxed),
            Err(inner) => Err(StoredObject { type_name, inner }),
        }
    }
}

impl std::fmt::Debug for StoredObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredObject")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Registry of type tags plus the to/from conversions.
#[derive(Default)]
pub struct ObjectConverter {
    decoders: HashMap<String, Decoder>,
}

impl ObjectConverter {
    /// Converter with nothing registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `T` restorable from rows tagged with `T::TYPE_NAME`.
    pub fn register<T: Convertible>(&mut self) -> &mut Self {
        self.decoders.insert(
            T::TYPE_NAME.to_owned(),
            Box::new(|data| {
                let mut value = T::default();
                value.import_data(data)?;
                Ok(Box::new(value) as Box<dyn Any + Send>)
            }),
        );
        self
    }

    /// Make a plain serde type restorable from rows tagged `type_name`.
    /// Fields are assigned by name.
    pub fn register_fields<T>(&mut self, type_name: impl Into<String>) -> &mut Self
    where
        T: DeserializeOwned + Send + 'static,
    {
        let type_name = type_name.into();
        let tag = type_name.clone();
        self.decoders.insert(
            type_name,
            Box::new(move |data| {
                let value: T = serde_json::from_value(Value::Object(data)).map_err(|e| {
                    Error::Conversion(format!("unable to create `{tag}` from stored fields: {e}"))
                })?;
                Ok(Box::new(value) as Box<dyn Any + Send>)
            }),
        );
        self
    }

    /// `true` if rows tagged `type_name` can be rebuilt.
    #[must_use]
    pub fn is_registered(&self, type_name: &str) -> bool {
        self.decoders.contains_key(type_name)
    }

    /// Export a convertible value and tag it with its type name.
    #[must_use]
    pub fn to_store<T: Convertible>(&self, value: &T) -> Value {
        let mut data = value.export_data();
        data.insert(CLASS_NAME_FIELD.to_owned(), Value::from(T::TYPE_NAME));
        Value::Object(data)
    }

    /// Map a serde value to its fields and tag it with `type_name`. Values
    /// that don't serialize to an object (numbers, strings, lists) pass
    /// through untagged.
    pub fn to_store_fields<T: Serialize>(&self, value: &T, type_name: &str) -> Result<Value> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::Conversion(format!("unable to convert `{type_name}`: {e}")))?;
        Ok(match value {
            Value::Object(mut data) => {
                data.insert(CLASS_NAME_FIELD.to_owned(), Value::from(type_name));
                Value::Object(data)
            }
            other => other,
        })
    }

    /// Rebuild a typed value from a stored row if its tag is registered,
    /// otherwise return the row as it was.
    pub fn from_store(&self, value: Value) -> Result<Restored> {
        let mut data = match value {
            Value::Object(data) => data,
            other => return Ok(Restored::Data(other)),
        };
        let tag = match data.get(CLASS_NAME_FIELD).and_then(Value::as_str) {
            Some(tag) if !tag.is_empty() => tag.to_owned(),
            _ => return Ok(Restored::Data(Value::Object(data))),
        };
        let Some(decoder) = self.decoders.get(&tag) else {
            warn!(type_name = %tag, "no type registered for stored tag, returning plain data");
            return Ok(Restored::Data(Value::Object(data)));
        };
        data.remove(CLASS_NAME_FIELD);
        let inner = decoder(data)?;
        Ok(Restored::Object(StoredObject {
            type_name: tag,
            inner,
        }))
    }
}

impl std::fmt::Debug for ObjectConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.decoders.keys().collect();
        names.sort();
        f.debug_struct("ObjectConverter")
            .field("registered", &names)
            .finish()
    }
}
