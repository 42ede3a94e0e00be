//! Key and jar-name validation.
//!
//! Every check here runs before the store is touched, so a bad key never
//! costs a file read and never ends up on disk.

use crate::error::{Error, Result};
use serde_json::Value;

/// Gatekeeper for row keys and jar names.
pub trait Validator: Send + Sync {
    /// Check a row key.
    fn validate_key(&self, key: &str) -> Result<()>;

    /// Check a jar (table) name.
    fn validate_name(&self, name: &str) -> Result<()>;

    /// Check a key that arrived as a loosely-typed JSON value, e.g. from a
    /// config file or a wire message. Only strings can be keys.
    fn validate_key_value(&self, key: &Value) -> Result<()> {
        match key {
            Value::String(s) => self.validate_key(s),
            Value::Array(_) | Value::Object(_) => Err(Error::InvalidKey(
                "objects and arrays cannot be used as keys".into(),
            )),
            Value::Number(_) => Err(Error::InvalidKey(
                "JSON does not support integer keys".into(),
            )),
            Value::Null | Value::Bool(_) => Err(Error::InvalidKey("keys must be strings".into())),
        }
    }
}

/// Rules for jars stored as JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonValidator;

impl JsonValidator {
    /// Shortest accepted key, in characters.
    pub const MIN_KEY_LENGTH: usize = 1;
    /// Longest accepted key, in characters (inclusive).
    pub const MAX_KEY_LENGTH: usize = 50;

    /// Create the validator.
    pub fn new() -> Self {
        Self
    }
}

impl Validator for JsonValidator {
    fn validate_key(&self, key: &str) -> Result<()> {
        let len = key.chars().count();
        if len < Self::MIN_KEY_LENGTH {
            return Err(Error::InvalidKey(
                "no key has been set, or provided key is empty".into(),
            ));
        }
        if len > Self::MAX_KEY_LENGTH {
            return Err(Error::InvalidKey(format!(
                "key exceeds maximum key length of {} characters",
                Self::MAX_KEY_LENGTH
            )));
        }
        // An object key like "12" can't be told apart from an array index.
        if is_integer(key) {
            return Err(Error::InvalidKey(format!(
                "JSON does not support integer keys (got `{key}`)"
            )));
        }
        Ok(())
    }

    fn validate_name(&self, name: &str) -> Result<()> {
        if is_valid_name(name) {
            Ok(())
        } else {
            Err(Error::InvalidName(format!(
                "invalid characters in jar name `{name}`"
            )))
        }
    }
}

/// `true` if `name` matches `^[A-Za-z0-9_]+$`.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// Optional sign followed by ASCII digits, ignoring surrounding whitespace.
fn is_integer(key: &str) -> bool {
    let trimmed = key.trim();
    let digits = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('+'))
        .unwrap_or(trimmed);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
