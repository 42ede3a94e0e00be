//! Disk I/O helpers for the file store adapter: read, strict create and
//! atomic overwrite.
//!
//! The rename-over approach is close to atomic on most platforms. On NTFS
//! (Windows) it's reliable; on FAT32 or network shares there are no hard
//! guarantees. If that matters to you, keep backups or use a real database.

use crate::error::{Error, Result};
use std::io::Write;
use std::path::Path;

/// Read the whole file at `path`. A missing file is [`Error::NotFound`].
pub fn read_file(path: &Path) -> Result<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::NotFound(format!("{} does not exist", path.display())))
        }
        Err(e) => Err(Error::Storage(format!("reading {}: {e}", path.display()))),
    }
}

/// Create `path` and write `bytes` to it, failing with
/// [`Error::AlreadyExists`] if the file is already there.
pub fn create_new(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
    {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
            return Err(Error::AlreadyExists(format!(
                "{} already exists",
                path.display()
            )))
        }
        Err(e) => return Err(Error::Storage(format!("creating {}: {e}", path.display()))),
    };
    file.write_all(bytes)
        .and_then(|()| file.sync_all())
        .map_err(|e| Error::Storage(format!("writing {}: {e}", path.display())))
}

/// Write `bytes` to `<path>.tmp` and then rename over `path`. This avoids
/// leaving a half-written file if the process crashes mid-write.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    let tmp = path.with_extension(format!("{ext}.tmp"));
    std::fs::write(&tmp, bytes)
        .map_err(|e| Error::Storage(format!("writing {}: {e}", tmp.display())))?;
    std::fs::rename(&tmp, path)
        .map_err(|e| Error::Storage(format!("renaming over {}: {e}", path.display())))?;
    Ok(())
}

/// Delete the file at `path`. A missing file is [`Error::NotFound`].
pub fn remove_file(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::NotFound(format!("{} does not exist", path.display())))
        }
        Err(e) => Err(Error::Storage(format!("removing {}: {e}", path.display()))),
    }
}
