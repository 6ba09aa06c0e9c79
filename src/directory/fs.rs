use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{DirLock, Directory, LOCK_NAME};
use crate::error::{Result, SearchError};

/// On-disk directory
///
/// Files live flat inside one filesystem directory. Atomic writes go through
/// a `<name>.tmp` sibling followed by a rename. The writer lock is a
/// `write.lock` file created with `create_new`, so a second writer fails
/// instead of blocking.
pub struct FsDirectory {
    path: PathBuf,
}

impl FsDirectory {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        fs::create_dir_all(&path)?;
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Directory for FsDirectory {
    fn read(&self, name: &str) -> Result<Vec<u8>> {
        fs::read(self.file_path(name)).map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                SearchError::Storage(format!("missing file: {}", name))
            } else {
                SearchError::Io(e)
            }
        })
    }

    fn write(&self, name: &str, data: &[u8]) -> Result<()> {
        let mut file = fs::File::create(self.file_path(name))?;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    fn atomic_write(&self, name: &str, data: &[u8]) -> Result<()> {
        let tmp_path = self.file_path(&format!("{}.tmp", name));
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, self.file_path(name))?;
        Ok(())
    }

    fn exists(&self, name: &str) -> bool {
        self.file_path(name).exists()
    }

    fn delete(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.file_path(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SearchError::Io(e)),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if name != LOCK_NAME {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn acquire_lock(&self) -> Result<DirLock> {
        let lock_path = self.file_path(LOCK_NAME);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_) => {
                debug!(path = %lock_path.display(), "acquired write lock");
                let release_path = lock_path.clone();
                Ok(DirLock::new(move || {
                    let _ = fs::remove_file(&release_path);
                }))
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(SearchError::LockConflict(self.path.clone()))
            }
            Err(e) => Err(SearchError::Io(e)),
        }
    }
}
