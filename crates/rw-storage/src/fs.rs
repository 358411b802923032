//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`] for listing, reading and writing documentation
//! trees on the local filesystem.

use std::fs;
use std::path::Path;

use crate::storage::{DirEntry, EntryKind, Storage, StorageError};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem storage implementation.
///
/// Paths are used as given: relative paths resolve against the process
/// working directory. Writes and copies create missing parent directories.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use rw_storage::{FsStorage, Storage};
///
/// let storage = FsStorage::new();
/// let content = storage.read(Path::new("docs/index.md"))?;
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct FsStorage;

impl FsStorage {
    /// Create a new filesystem storage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn io_error(err: std::io::Error, path: &Path) -> StorageError {
        StorageError::io(err, Some(path.to_path_buf())).with_backend(BACKEND)
    }

    fn create_parent(path: &Path) -> Result<(), StorageError> {
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                fs::create_dir_all(parent).map_err(|e| Self::io_error(e, parent))
            }
            _ => Ok(()),
        }
    }
}

impl Storage for FsStorage {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>, StorageError> {
        let read_dir = fs::read_dir(dir).map_err(|e| Self::io_error(e, dir))?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|e| Self::io_error(e, dir))?;
            let path = entry.path();
            let file_type = entry.file_type().map_err(|e| Self::io_error(e, &path))?;
            // Symlinks are classified by their target.
            let is_dir = if file_type.is_symlink() {
                path.is_dir()
            } else {
                file_type.is_dir()
            };

            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                path,
                kind: if is_dir {
                    EntryKind::Directory
                } else {
                    EntryKind::File
                },
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> Result<String, StorageError> {
        fs::read_to_string(path).map_err(|e| Self::io_error(e, path))
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        fs::read(path).map_err(|e| Self::io_error(e, path))
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), StorageError> {
        Self::create_parent(path)?;
        fs::write(path, content).map_err(|e| Self::io_error(e, path))
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        Self::create_parent(to)?;
        fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| Self::io_error(e, from))
    }

    fn ensure_dir(&self, path: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(path).map_err(|e| Self::io_error(e, path))
    }
}
