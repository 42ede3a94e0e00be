//! Store configuration.

use crate::error::{Error, Result};
use crate::store::DEFAULT_EXTENSION;
use std::path::{Path, PathBuf};

/// Settings for a [`KeyParty`](crate::KeyParty) store and its stock
/// `"json"` jar type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one file per jar.
    pub data_dir: PathBuf,
    /// File extension for jar files, with or without the leading dot.
    pub extension: String,
    /// Whether jars keep a lookaside cache.
    pub cache: bool,
    /// Whether jar files are written as indented JSON.
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            extension: DEFAULT_EXTENSION.to_owned(),
            cache: true,
            pretty: true,
        }
    }
}

impl Config {
    /// Start from the defaults.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Defaults, with `data_dir` replaced.
    pub fn with_data_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Reject settings the store can't work with.
    pub fn validate(&self) -> Result<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(Error::Config("data directory must not be empty".into()));
        }
        if self.extension.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "extension `{}` must not contain a path separator",
                self.extension
            )));
        }
        Ok(())
    }
}

/// Configures a [`Config`].
///
/// ```rust
/// use keyparty::Config;
///
/// let config = Config::builder()
///     .data_dir("/tmp/keyparty")
///     .extension("db")
///     .cache(false)
///     .build()
///     .unwrap();
/// assert!(!config.cache);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Directory for jar files (default: `data`).
    pub fn data_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.config.data_dir = path.as_ref().to_path_buf();
        self
    }

    /// Jar file extension (default: `json`).
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.config.extension = extension.into();
        self
    }

    /// Turn the per-jar lookaside cache on or off (default: on).
    pub fn cache(mut self, yes: bool) -> Self {
        self.config.cache = yes;
        self
    }

    /// Write human-readable JSON with indentation (default: on).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.config.pretty = yes;
        self
    }

    /// Validate and return the config.
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
