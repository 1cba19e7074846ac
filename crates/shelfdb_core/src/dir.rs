//! Storage directory utilities and single-owner locking.
//!
//! Directory creation is idempotent and is the only filesystem side effect
//! outside the record files themselves. The `LOCK` file guards against two
//! contexts pointing at one physical directory; shelfdb has no cross-process
//! coordination beyond refusing to start.

use crate::error::{StoreError, StoreResult};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "LOCK";

/// Creates `path` (and parents) when absent. Returns the path unchanged.
pub fn ensure_dir(path: &Path) -> StoreResult<PathBuf> {
    std::fs::create_dir_all(path)?;
    Ok(path.to_path_buf())
}

/// Creates an empty file at `path` when absent, preserving existing
/// contents. Returns the path unchanged.
pub fn ensure_file(path: &Path) -> StoreResult<PathBuf> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)?;
    Ok(path.to_path_buf())
}

/// Flushes the directory entry after a rename, so the new name is durable.
#[cfg(unix)]
pub(crate) fn sync_parent_dir(path: &Path) -> StoreResult<()> {
    if let Some(parent) = path.parent() {
        File::open(parent)?.sync_all()?;
    }
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn sync_parent_dir(_path: &Path) -> StoreResult<()> {
    Ok(())
}

/// An advisory exclusive lock on a storage directory.
///
/// Held for the lifetime of the owning context; released when dropped.
#[derive(Debug)]
pub struct DirLock {
    _lock_file: File,
}

impl DirLock {
    /// Acquires the directory lock, creating the directory if needed.
    ///
    /// Fails with [`StoreError::DirectoryLocked`] when another context
    /// already holds it.
    pub fn acquire(dir: &Path) -> StoreResult<Self> {
        ensure_dir(dir)?;

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(dir.join(LOCK_FILE))?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::DirectoryLocked);
        }

        Ok(Self {
            _lock_file: lock_file,
        })
    }
}
