//! Store adapters: the byte-blob persistence boundary.
//!
//! An adapter knows nothing about keys, rows or JSON. It keeps one named
//! blob per jar and can tell whether a blob exists, read it, write it and
//! remove it. [`FileStoreAdapter`] puts each blob in its own file under a
//! root directory; [`MemoryStoreAdapter`] keeps blobs in a
//! [`MapBackend`](crate::backend::MapBackend).

use crate::backend::MapBackend;
use crate::error::{Error, Result};
use crate::persist::{atomic_write, create_new, read_file, remove_file};
use crate::{DefaultBackend, Table};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Default file extension for jar files.
pub const DEFAULT_EXTENSION: &str = "json";

/// Something a store adapter can persist.
pub trait Blob: Clone + Send + Sync + 'static {
    /// Size reported back from writes: bytes for byte blobs, entries for
    /// structured ones.
    fn size(&self) -> usize;
}

impl Blob for Vec<u8> {
    fn size(&self) -> usize {
        self.len()
    }
}

impl Blob for Table {
    fn size(&self) -> usize {
        self.len()
    }
}

/// Persists whole-table blobs by name.
pub trait StoreAdapter: Send + Sync {
    /// What this adapter stores.
    type Blob: Blob;

    /// `true` if a blob called `name` exists.
    fn exists(&self, name: &str) -> Result<bool>;

    /// Fetch the blob called `name`. Fails with [`Error::NotFound`] when absent.
    fn read(&self, name: &str) -> Result<Self::Blob>;

    /// Store `blob` under `name` and report how much was written. With
    /// `overwrite == false` an existing blob is an [`Error::AlreadyExists`].
    fn write(&self, name: &str, blob: Self::Blob, overwrite: bool) -> Result<usize>;

    /// Delete the blob called `name`. Fails with [`Error::NotFound`] when absent.
    fn remove(&self, name: &str) -> Result<()>;

    /// Human-readable location of `name`, for messages and logs.
    fn locate(&self, name: &str) -> String {
        name.to_owned()
    }

    /// Strict create: fails if `name` already exists.
    fn create(&self, name: &str, blob: Self::Blob) -> Result<usize> {
        self.write(name, blob, false)
    }

    /// Create `name` if absent, otherwise truncate it to `blob`. Idempotent.
    fn empty(&self, name: &str, blob: Self::Blob) -> Result<usize> {
        self.write(name, blob, true)
    }
}

/// Build `<name><extension>`, adding the leading dot if it's missing.
/// An empty extension leaves the name bare.
///
/// ```
/// use keyparty::store::table_file_name;
///
/// assert_eq!(table_file_name("bar", "json"), "bar.json");
/// assert_eq!(table_file_name("bar", ".json"), "bar.json");
/// ```
pub fn table_file_name(name: &str, extension: &str) -> String {
    if extension.is_empty() {
        name.to_owned()
    } else if extension.starts_with('.') {
        format!("{name}{extension}")
    } else {
        format!("{name}.{extension}")
    }
}

// ---------------------------------------------------------------------------
// Local disk
// ---------------------------------------------------------------------------

/// One file per jar under a root directory.
///
/// The directory is created on the first write. Overwrites go through a
/// temp file and a rename; strict creates refuse to clobber.
#[derive(Debug, Clone)]
pub struct FileStoreAdapter {
    root: PathBuf,
    extension: String,
}

impl FileStoreAdapter {
    /// Store files under `root` with the default `.json` extension.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            extension: DEFAULT_EXTENSION.to_owned(),
        }
    }

    /// Use a different file extension (with or without the leading dot).
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configured extension, as given.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Full path of the file backing `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(table_file_name(name, &self.extension))
    }

    fn ensure_root(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            Error::Storage(format!(
                "unable to use filesystem at {}: {e}",
                self.root.display()
            ))
        })
    }
}

impl StoreAdapter for FileStoreAdapter {
    type Blob = Vec<u8>;

    fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name);
        match std::fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(Error::Storage(format!("checking {}: {e}", path.display()))),
        }
    }

    fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name);
        let bytes = read_file(&path)?;
        trace!(path = %path.display(), bytes = bytes.len(), "read jar file");
        Ok(bytes)
    }

    fn write(&self, name: &str, blob: Vec<u8>, overwrite: bool) -> Result<usize> {
        self.ensure_root()?;
        let path = self.path_for(name);
        if overwrite {
            atomic_write(&path, &blob)?;
        } else {
            create_new(&path, &blob)?;
        }
        debug!(path = %path.display(), bytes = blob.len(), overwrite, "wrote jar file");
        Ok(blob.len())
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        remove_file(&path)?;
        debug!(path = %path.display(), "removed jar file");
        Ok(())
    }

    fn locate(&self, name: &str) -> String {
        self.path_for(name).display().to_string()
    }
}

// ---------------------------------------------------------------------------
// In memory
// ---------------------------------------------------------------------------

/// Keeps blobs in a concurrent map. Nothing survives the process.
///
/// With `B = Vec<u8>` it behaves like a disk without the disk; with
/// `B = Table` it pairs with [`PassThruSerializer`](crate::PassThruSerializer)
/// and skips encoding entirely.
pub struct MemoryStoreAdapter<B, M = DefaultBackend<B>> {
    map: M,
    _marker: PhantomData<B>,
}

impl<B, M> MemoryStoreAdapter<B, M>
where
    B: Blob,
    M: MapBackend<B>,
{
    /// Empty store on a default-constructed backend.
    pub fn new() -> Self
    where
        M: Default,
    {
        Self::with_backend(M::default())
    }

    /// Empty store on the given backend.
    pub fn with_backend(map: M) -> Self {
        Self {
            map,
            _marker: PhantomData,
        }
    }

    /// Names of all stored blobs.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.map.keys()
    }
}

impl<B, M> Default for MemoryStoreAdapter<B, M>
where
    B: Blob,
    M: MapBackend<B> + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

/// In-memory adapter on a plain `RwLock<HashMap>`.
pub type LockedMemoryStoreAdapter<B> =
    MemoryStoreAdapter<B, parking_lot::RwLock<HashMap<String, B>>>;

impl<B, M> StoreAdapter for MemoryStoreAdapter<B, M>
where
    B: Blob,
    M: MapBackend<B>,
{
    type Blob = B;

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.map.contains_key(name))
    }

    fn read(&self, name: &str) -> Result<B> {
        self.map
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("store `{name}` does not exist")))
    }

    fn write(&self, name: &str, blob: B, overwrite: bool) -> Result<usize> {
        if !overwrite && self.map.contains_key(name) {
            return Err(Error::AlreadyExists(format!("store `{name}` already exists")));
        }
        let size = blob.size();
        self.map.insert(name.to_owned(), blob);
        trace!(store = name, size, overwrite, "wrote in-memory blob");
        Ok(size)
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.map
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("store `{name}` does not exist")))
    }

    fn locate(&self, name: &str) -> String {
        format!("memory://{name}")
    }
}

impl<B, M> std::fmt::Debug for MemoryStoreAdapter<B, M>
where
    B: Blob,
    M: MapBackend<B>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStoreAdapter")
            .field("blobs", &self.map.map_len())
            .finish()
    }
}
