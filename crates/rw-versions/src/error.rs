//! Versioning error types.

use std::path::PathBuf;

use rw_storage::StorageError;

/// Error produced by the versioning engine.
///
/// Every variant is fatal to the current snapshot or request.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    /// Invalid version configuration (e.g., empty version list).
    #[error("Invalid versions configuration: {0}")]
    Config(String),

    /// More than one declared version has no directory yet.
    #[error("Only one new version can be configured at a time (missing: {})", slugs.join(", "))]
    AmbiguousSnapshot {
        /// Slugs of every declared version without a directory.
        slugs: Vec<String>,
    },

    /// The docs root holds nothing to snapshot.
    #[error("Failed to copy the empty directory '{}'", path.display())]
    EmptySourceTree {
        /// Docs root that was walked.
        path: PathBuf,
    },

    /// Frozen sidebar of a version can't be read.
    #[error("Failed to read the version '{slug}' configuration file")]
    MissingVersionConfig {
        /// Slug of the version.
        slug: String,
        /// Underlying read or decode error.
        #[source]
        source: StorageError,
    },

    /// Composed sidebar has no group for a known version.
    #[error("Failed to find a sidebar group for the {group}")]
    InternalConsistency {
        /// Human-readable group name ("current version" or "version '2.0'").
        group: String,
    },

    /// Frontmatter block is not valid YAML.
    #[error("Invalid frontmatter: {message}")]
    Frontmatter {
        /// Parser message.
        message: String,
    },

    /// Storage operation failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A document failed to rewrite.
    #[error("Failed to version '{}': {source}", path.display())]
    Rewrite {
        /// Source path of the document.
        path: PathBuf,
        /// Rewrite failure.
        source: Box<VersionError>,
    },
}
