use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{DirLock, Directory};
use crate::error::{Result, SearchError};

/// In-memory directory
///
/// Ephemeral storage for tests and throwaway indexes. Cloning yields a
/// handle to the same underlying files, so a clone sees the same data and
/// contends for the same writer lock.
#[derive(Clone, Default)]
pub struct RamDirectory {
    files: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    locked: Arc<AtomicBool>,
}

impl RamDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Directory for RamDirectory {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        self.files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| SearchError::Storage(format!("missing file: {}", name)))
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        self.files.write().insert(name.to_string(), data.to_vec());
        Ok(())
    }

    fn atomic_write(&self, name: &str, data: &[u8]) -> Result<()> {
        // A single map insert under the write lock is already atomic.
        self.write(name, data)
    }

    fn exists(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.files.write().remove(name);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.files.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn acquire_lock(&self) -> Result<DirLock> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SearchError::LockConflict(PathBuf::from("<ram>")));
        }
        let locked = self.locked.clone();
        Ok(DirLock::new(move || {
            locked.store(false, Ordering::SeqCst);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_handle_sees_writes() {
        let dir = RamDirectory::new();
        let other = dir.clone();

        dir.write("a", b"1").unwrap();
        assert_eq!(other.read("a").unwrap(), b"1");

        other.delete("a").unwrap();
        assert!(!dir.exists("a"));
    }

    #[test]
    fn test_lock_is_shared_across_clones() {
        let dir = RamDirectory::new();
        let other = dir.clone();

        let guard = dir.acquire_lock().unwrap();
        assert!(matches!(
            other.acquire_lock().unwrap_err(),
            SearchError::LockConflict(_)
        ));
        drop(guard);
        let _guard = other.acquire_lock().unwrap();
    }

    #[test]
    fn test_read_missing() {
        let dir = RamDirectory::new();
        assert!(dir.read("missing").unwrap_err().is_storage());
    }
}
