//! Serialization layer. Converts a jar's table to and from whatever its
//! store adapter persists.
//!
//! [`JsonSerializer`] turns tables into JSON bytes. [`PassThruSerializer`]
//! hands tables through untouched for adapters that keep structured values
//! natively. Implement [`Serializer`] for anything else.

use crate::error::{Error, Result, SerializationErrorKind};
use crate::store::Blob;
use crate::Table;
use serde_json::Value;

/// Converts whole tables to/from the blob type of a store adapter.
pub trait Serializer: Send + Sync {
    /// What the matching store adapter persists.
    type Blob: Blob;

    /// Encode a table.
    fn encode(&self, table: &Table) -> Result<Self::Blob>;

    /// Decode a blob back into a table.
    fn decode(&self, blob: Self::Blob) -> Result<Table>;

    /// Normalize `value` to a table and encode it. Typed values must already
    /// have gone through the [`ObjectConverter`](crate::ObjectConverter).
    fn encode_value(&self, value: &Value) -> Result<Self::Blob> {
        self.encode(&normalize(value)?)
    }
}

/// Coerce a value into a table: objects as-is, `null` as `{}`.
pub fn normalize(value: &Value) -> Result<Table> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Table::new()),
        other => Err(Error::serialization(
            SerializationErrorKind::StateMismatch,
            format!("expected a JSON object for a table, got {}", kind_of(other)),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// JSON serializer with optional pretty-printing.
#[derive(Debug, Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Deepest nesting that decodes again, counting the table itself as one
    /// level. serde_json refuses a 128th nested container on the way in.
    pub const MAX_DEPTH: usize = 127;

    /// Compact JSON (single line, no extra whitespace).
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretty-printed JSON with indentation, easier to read by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Whether output is indented.
    #[must_use]
    pub fn is_pretty(&self) -> bool {
        self.pretty
    }
}

impl Serializer for JsonSerializer {
    type Blob = Vec<u8>;

    fn encode(&self, table: &Table) -> Result<Vec<u8>> {
        check_depth(table, Self::MAX_DEPTH)?;
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(table)
        } else {
            serde_json::to_vec(table)
        };
        bytes.map_err(Error::from)
    }

    fn decode(&self, blob: Vec<u8>) -> Result<Table> {
        let text = std::str::from_utf8(&blob)
            .map_err(|e| Error::serialization(SerializationErrorKind::Encoding, e.to_string()))?;
        // a zero-length file is an empty jar, not a syntax error
        if text.trim().is_empty() {
            return Ok(Table::new());
        }
        serde_json::from_str(text).map_err(Error::from)
    }
}

/// Fail with [`SerializationErrorKind::Depth`] if `table` nests deeper than
/// `limit` containers. Walks with an explicit stack.
fn check_depth(table: &Table, limit: usize) -> Result<()> {
    let mut stack: Vec<(&Value, usize)> = table.values().map(|v| (v, 2)).collect();
    while let Some((value, depth)) = stack.pop() {
        if !(value.is_array() || value.is_object()) {
            continue;
        }
        if depth > limit {
            return Err(Error::serialization(
                SerializationErrorKind::Depth,
                format!("maximum stack depth exceeded, value nests deeper than {limit} levels"),
            ));
        }
        match value {
            Value::Array(items) => stack.extend(items.iter().map(|v| (v, depth + 1))),
            Value::Object(map) => stack.extend(map.values().map(|v| (v, depth + 1))),
            _ => {}
        }
    }
    Ok(())
}

/// No-op serializer for adapters that store tables as structured values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThruSerializer;

impl Serializer for PassThruSerializer {
    type Blob = Table;

    fn encode(&self, table: &Table) -> Result<Table> {
        Ok(table.clone())
    }

    fn decode(&self, blob: Table) -> Result<Table> {
        Ok(blob)
    }
}
