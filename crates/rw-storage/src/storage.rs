//! Storage trait and error types.
//!
//! Provides the core [`Storage`] trait for abstracting directory listing, file
//! reads and writes, along with [`StorageError`] for unified error handling
//! across backends.
//!
//! # Path Convention
//!
//! All path parameters are backend paths (for [`FsStorage`](crate::FsStorage),
//! regular filesystem paths). Directory listings are returned sorted by name so
//! that callers walking a tree observe a deterministic order on every backend.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Kind of a directory entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// A single entry returned by [`Storage::list`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name (last path component).
    pub name: String,
    /// Full path of the entry (listed directory joined with `name`).
    pub path: PathBuf,
    /// Whether the entry is a file or a directory.
    pub kind: EntryKind,
}

impl DirEntry {
    /// Check if the entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Semantic error categories (inspired by Object Store + `OpenDAL`).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum StorageErrorKind {
    /// Resource does not exist.
    NotFound,
    /// Permission denied.
    PermissionDenied,
    /// Resource already exists (for create operations).
    AlreadyExists,
    /// Invalid path or identifier.
    InvalidPath,
    /// Content could not be decoded (invalid UTF-8, malformed JSON).
    InvalidData,
    /// Other/unknown error category.
    Other,
}

/// Storage error with semantic kind and backend-specific source.
#[derive(Debug)]
pub struct StorageError {
    kind: StorageErrorKind,
    path: Option<PathBuf>,
    backend: Option<&'static str>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    /// Create a new storage error.
    #[must_use]
    pub fn new(kind: StorageErrorKind) -> Self {
        Self {
            kind,
            path: None,
            backend: None,
            source: None,
        }
    }

    /// Attach path context.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Attach backend identifier.
    #[must_use]
    pub fn with_backend(mut self, backend: &'static str) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Semantic error category.
    #[must_use]
    pub fn kind(&self) -> StorageErrorKind {
        self.kind
    }

    /// Path context, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Backend identifier (e.g., "Fs", "Mock").
    #[must_use]
    pub fn backend(&self) -> Option<&'static str> {
        self.backend
    }

    /// Downcast the source error to a concrete type.
    #[must_use]
    pub fn downcast_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.source.as_ref()?.downcast_ref()
    }

    /// Create a not found error with path.
    #[must_use]
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::new(StorageErrorKind::NotFound).with_path(path)
    }

    /// Create a storage error from an I/O error.
    #[must_use]
    pub fn io(err: std::io::Error, path: Option<PathBuf>) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => StorageErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => StorageErrorKind::PermissionDenied,
            std::io::ErrorKind::AlreadyExists => StorageErrorKind::AlreadyExists,
            std::io::ErrorKind::InvalidData => StorageErrorKind::InvalidData,
            _ => StorageErrorKind::Other,
        };
        let mut error = Self::new(kind).with_source(err);
        if let Some(p) = path {
            error = error.with_path(p);
        }
        error
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "[Backend] Kind: message (path: /foo/bar)"
        if let Some(backend) = self.backend {
            write!(f, "[{backend}] ")?;
        }

        let kind_str = match self.kind {
            StorageErrorKind::NotFound => "Not found",
            StorageErrorKind::PermissionDenied => "Permission denied",
            StorageErrorKind::AlreadyExists => "Already exists",
            StorageErrorKind::InvalidPath => "Invalid path",
            StorageErrorKind::InvalidData => "Invalid data",
            StorageErrorKind::Other => "Error",
        };

        write!(f, "{kind_str}")?;

        if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }

        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.display())?;
        }

        Ok(())
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Storage abstraction for the file operations used by snapshotting.
///
/// Implementations must be safe to share across threads: document rewrites
/// read their sources concurrently.
pub trait Storage: Send + Sync {
    /// List the entries of a directory, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory doesn't exist or can't be read.
    fn list(&self, dir: &Path) -> Result<Vec<DirEntry>, StorageError>;

    /// Check if a file or directory exists at the given path.
    ///
    /// Returns `false` on errors (treats errors as "doesn't exist").
    fn exists(&self, path: &Path) -> bool;

    /// Check if a directory exists at the given path.
    fn is_dir(&self, path: &Path) -> bool;

    /// Read a UTF-8 text file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file doesn't exist or isn't valid UTF-8.
    fn read(&self, path: &Path) -> Result<String, StorageError>;

    /// Read a file as raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file doesn't exist or can't be read.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, StorageError>;

    /// Write a text file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the file can't be written.
    fn write(&self, path: &Path, content: &str) -> Result<(), StorageError>;

    /// Copy a file byte-for-byte, creating parent directories of `to` as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the source doesn't exist or the copy fails.
    fn copy(&self, from: &Path, to: &Path) -> Result<(), StorageError>;

    /// Create a directory and all of its missing parents.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the directory can't be created.
    fn ensure_dir(&self, path: &Path) -> Result<(), StorageError>;
}

/// JSON helpers available on every [`Storage`] backend.
pub trait StorageExt: Storage {
    /// Read and deserialize a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] with [`StorageErrorKind::InvalidData`] if the
    /// content isn't valid JSON for `T`, or the read error otherwise.
    fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T, StorageError> {
        let content = self.read(path)?;
        serde_json::from_str(&content).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidData)
                .with_path(path)
                .with_source(e)
        })
    }

    /// Serialize a value as pretty-printed JSON and write it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if serialization or the write fails.
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> Result<(), StorageError> {
        let mut content = serde_json::to_string_pretty(value).map_err(|e| {
            StorageError::new(StorageErrorKind::InvalidData)
                .with_path(path)
                .with_source(e)
        })?;
        content.push('\n');
        self.write(path, &content)
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}
