//! Storage abstraction for RW documentation engine.
//!
//! This crate provides a [`Storage`] trait for abstracting the file operations
//! used when snapshotting documentation versions. This enables:
//!
//! - **Unit testing** without touching the real filesystem
//! - **Clean separation** between versioning logic and I/O operations
//!
//! # Architecture
//!
//! The crate provides:
//! - [`Storage`] trait with `list()`, `read()`, `write()`, `copy()` and `ensure_dir()` methods
//! - [`StorageExt`] with JSON helpers available on every backend
//! - [`FsStorage`] implementation for the local filesystem
//! - [`MockStorage`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use rw_storage::{FsStorage, Storage};
//!
//! let storage = FsStorage::new();
//! for entry in storage.list(Path::new("docs"))? {
//!     println!("{} ({:?})", entry.name, entry.kind);
//! }
//! ```

mod fs;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod storage;

pub use fs::FsStorage;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockStorage;
pub use storage::{DirEntry, EntryKind, Storage, StorageError, StorageErrorKind, StorageExt};
