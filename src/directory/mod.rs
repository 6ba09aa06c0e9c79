//! Pluggable storage backends
//!
//! A [`Directory`] exposes a flat namespace of named byte files plus an
//! atomic rename-style write used for manifest commits, and the exclusive
//! writer lock. Two implementations ship: [`FsDirectory`] (durable, on-disk)
//! and [`RamDirectory`] (ephemeral, for tests).

mod fs;
mod memory;

pub use fs::FsDirectory;
pub use memory::RamDirectory;

use std::sync::Arc;

use crate::error::Result;

/// Name of the writer lock file/slot.
pub const LOCK_NAME: &str = "write.lock";

/// Storage backend over a flat set of named files
pub trait Directory: Send + Sync {
    /// Read the full contents of a file.
    fn read(&self, name: &str) -> Result<Vec<u8>>;

    /// Write a file, replacing any previous contents.
    fn write(&self, name: &str, data: &[u8]) -> Result<()>;

    /// Write a file so that readers observe either the old or the new
    /// contents, never a partial write.
    fn atomic_write(&self, name: &str, data: &[u8]) -> Result<()>;

    fn exists(&self, name: &str) -> bool;

    /// Delete a file. Deleting a missing file is not an error.
    fn delete(&self, name: &str) -> Result<()>;

    /// List all file names, excluding the lock.
    fn list(&self) -> Result<Vec<String>>;

    /// Acquire the exclusive writer lock. Fails immediately with
    /// `LockConflict` when another writer holds it; never blocks.
    fn acquire_lock(&self) -> Result<DirLock>;
}

/// Shared directory handle
pub type DirectoryRef = Arc<dyn Directory>;

/// Writer lock guard; the lock is released on drop, on every exit path.
pub struct DirLock {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl DirLock {
    pub(crate) fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for DirLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirLock").finish()
    }
}
