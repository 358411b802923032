//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::storage::{DirEntry, EntryKind, Storage, StorageError, StorageErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores files in memory. Every ancestor of a stored file is an implicit
/// directory; empty directories can be added with [`MockStorage::with_dir`].
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use rw_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_file("docs/index.md", "# Home")
///     .with_dir("docs/2.0");
///
/// let entries = storage.list(Path::new("docs")).unwrap();
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    dirs: RwLock<BTreeSet<PathBuf>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.with_bytes(path, content.into().into_bytes())
    }

    /// Add a binary file.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_bytes(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.insert_file(path.into(), content.into());
        self
    }

    /// Add an (empty) directory.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.insert_dir(&path.into());
        self
    }

    /// All stored file paths, sorted.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn files(&self) -> Vec<PathBuf> {
        self.files.read().unwrap().keys().cloned().collect()
    }

    fn insert_file(&self, path: PathBuf, content: Vec<u8>) {
        if let Some(parent) = path.parent() {
            self.insert_dir(parent);
        }
        self.files.write().unwrap().insert(path, content);
    }

    fn insert_dir(&self, path: &Path) {
        let mut dirs = self.dirs.write().unwrap();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    fn not_found(path: &Path) -> StorageError {
        StorageError::not_found(path).with_backend(BACKEND)
    }
}

impl Storage for MockStorage {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>, StorageError> {
        if !self.is_dir(dir) {
            return Err(Self::not_found(dir));
        }

        let mut entries: BTreeMap<String, DirEntry> = BTreeMap::new();
        let mut push = |path: &Path, kind: EntryKind| {
            if path.parent() != Some(dir) {
                return;
            }
            if let Some(name) = path.file_name() {
                let name = name.to_string_lossy().into_owned();
                entries.insert(
                    name.clone(),
                    DirEntry {
                        name,
                        path: path.to_path_buf(),
                        kind,
                    },
                );
            }
        };

        for path in self.dirs.read().unwrap().iter() {
            push(path, EntryKind::Directory);
        }
        for path in self.files.read().unwrap().keys() {
            push(path, EntryKind::File);
        }

        Ok(entries.into_values().collect())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.read().unwrap().contains_key(path) || self.is_dir(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.read().unwrap().contains(path)
    }

    fn read(&self, path: &Path) -> Result<String, StorageError> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidData)
                .with_path(path)
                .with_backend(BACKEND)
                .with_source(e)
        })
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, StorageError> {
        self.files
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Self::not_found(path))
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), StorageError> {
        self.insert_file(path.to_path_buf(), content.as_bytes().to_vec());
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError> {
        let content = self.read_bytes(from)?;
        self.insert_file(to.to_path_buf(), content);
        Ok(())
    }

    fn ensure_dir(&self, path: &Path) -> Result<(), StorageError> {
        self.insert_dir(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_mock_storage_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MockStorage>();
    }

    #[test]
    fn test_list_implicit_dirs() {
        let storage = MockStorage::new()
            .with_file("docs/index.md", "# Home")
            .with_file("docs/guides/example.md", "# Example")
            .with_dir("docs/2.0");

        let entries = storage.list(Path::new("docs")).unwrap();

        let listed: Vec<_> = entries
            .iter()
            .map(|e| (e.name.as_str(), e.kind))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("2.0", EntryKind::Directory),
                ("guides", EntryKind::Directory),
                ("index.md", EntryKind::File),
            ]
        );
        assert_eq!(entries[1].path, PathBuf::from("docs/guides"));
    }

    #[test]
    fn test_list_missing_dir() {
        let storage = MockStorage::new();

        let err = storage.list(Path::new("docs")).unwrap_err();

        assert_eq!(err.kind(), StorageErrorKind::NotFound);
        assert_eq!(err.backend(), Some("Mock"));
    }

    #[test]
    fn test_read_not_found() {
        let storage = MockStorage::new();

        let err = storage.read(Path::new("missing.md")).unwrap_err();

        assert_eq!(err.kind(), StorageErrorKind::NotFound);
        assert_eq!(err.path(), Some(Path::new("missing.md")));
    }

    #[test]
    fn test_read_invalid_utf8() {
        let storage = MockStorage::new().with_bytes("logo.png", vec![0xff, 0xfe]);

        let err = storage.read(Path::new("logo.png")).unwrap_err();

        assert_eq!(err.kind(), StorageErrorKind::InvalidData);
    }

    #[test]
    fn test_write_then_read() {
        let storage = MockStorage::new();

        storage
            .write(Path::new("docs/2.0/index.md"), "# Home")
            .unwrap();

        assert_eq!(storage.read(Path::new("docs/2.0/index.md")).unwrap(), "# Home");
        assert!(storage.is_dir(Path::new("docs/2.0")));
        assert!(storage.exists(Path::new("docs")));
    }

    #[test]
    fn test_copy() {
        let storage = MockStorage::new().with_bytes("public/logo.png", vec![1, 2, 3]);

        storage
            .copy(Path::new("public/logo.png"), Path::new("public/2.0/logo.png"))
            .unwrap();

        assert_eq!(
            storage.read_bytes(Path::new("public/2.0/logo.png")).unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(
            storage.files(),
            vec![
                PathBuf::from("public/2.0/logo.png"),
                PathBuf::from("public/logo.png"),
            ]
        );
    }

    #[test]
    fn test_copy_missing_source() {
        let storage = MockStorage::new();

        let err = storage
            .copy(Path::new("a.png"), Path::new("b.png"))
            .unwrap_err();

        assert_eq!(err.kind(), StorageErrorKind::NotFound);
        assert!(!storage.exists(Path::new("b.png")));
    }
}
