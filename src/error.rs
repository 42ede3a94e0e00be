//! Unified error type for all store operations.

use thiserror::Error;

/// Why the JSON engine refused a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializationErrorKind {
    /// Nesting went past the engine's recursion limit.
    Depth,
    /// Malformed or truncated JSON text.
    Syntax,
    /// Bytes that are not valid UTF-8.
    Encoding,
    /// Well-formed input of the wrong shape (e.g. a top-level array where a
    /// table object was expected).
    StateMismatch,
}

impl std::fmt::Display for SerializationErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            SerializationErrorKind::Depth => "maximum stack depth exceeded",
            SerializationErrorKind::Syntax => "syntax error, malformed JSON",
            SerializationErrorKind::Encoding => "malformed UTF-8 characters",
            SerializationErrorKind::StateMismatch => "state mismatch",
        };
        f.write_str(text)
    }
}

/// Things that can go wrong when using the store.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// A row key failed validation. Raised before any I/O.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// A jar name failed validation. Raised before any I/O.
    #[error("invalid jar name: {0}")]
    InvalidName(String),
    /// Strict insert hit a key that is already present.
    #[error("cannot insert, key `{0}` exists")]
    DuplicateKey(String),
    /// A blob, jar or jar type that was asked for does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// Strict create hit a blob that is already there.
    #[error("already exists: {0}")]
    AlreadyExists(String),
    /// Encoding or decoding a table failed.
    #[error("invalid JSON detected ({kind}): {message}")]
    Serialization {
        /// Classification of the failure.
        kind: SerializationErrorKind,
        /// Engine diagnostic.
        message: String,
    },
    /// The backing store could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
    /// A stored record could not be turned back into a typed value.
    #[error("conversion error: {0}")]
    Conversion(String),
    /// Bad configuration (empty directory, odd extension, etc.).
    #[error("config error: {0}")]
    Config(String),
    /// Not a failure: the jar and its backing blob were deleted. Reported as
    /// an error so that a destructive call can't go by unnoticed.
    #[error("deleted jar `{name}` and its backing store {location}; if you can see this message, this is probably an error")]
    JarRemoved {
        /// Jar that was removed.
        name: String,
        /// Where its data used to live.
        location: String,
    },
}

impl Error {
    /// Shorthand for a serialization error of the given kind.
    pub fn serialization(kind: SerializationErrorKind, message: impl Into<String>) -> Self {
        Error::Serialization {
            kind,
            message: message.into(),
        }
    }

    /// `true` for the delete-jar acknowledgement.
    #[must_use]
    pub fn is_jar_removed(&self) -> bool {
        matches!(self, Error::JarRemoved { .. })
    }

    /// `true` for validation failures, which never touch the store.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidKey(_) | Error::InvalidName(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(err.to_string()),
            std::io::ErrorKind::AlreadyExists => Error::AlreadyExists(err.to_string()),
            _ => Error::Storage(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        let message = err.to_string();
        let kind = match err.classify() {
            Category::Io => return Error::Storage(message),
            // serde_json reports its recursion limit as a syntax error
            Category::Syntax if message.contains("recursion limit") => {
                SerializationErrorKind::Depth
            }
            Category::Syntax | Category::Eof => SerializationErrorKind::Syntax,
            Category::Data => SerializationErrorKind::StateMismatch,
        };
        Error::Serialization { kind, message }
    }
}

/// Result alias using our [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
