//! Documentation versioning for RW.
//!
//! This crate provides:
//! - [`SnapshotBuilder`]: freezes the live docs tree into a new version
//! - [`rewrite_document`]: versions one document's links, assets and frontmatter
//! - [`compose_sidebar`]: merges the live sidebar with every frozen one
//! - [`VersionResolver`]: maps slugs and URLs to versions and rewrites URLs
//!   between versions
//! - [`RouteVersioning`] and [`version_switcher`]: per-page versioning
//!
//! # Quick Start
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::path::PathBuf;
//! use rw_storage::FsStorage;
//! use rw_versions::{
//!     ArchivedVersion, CurrentVersion, SiteConfig, SnapshotBuilder, SnapshotConfig, Version,
//!     VersionResolver, VersionSet,
//! };
//!
//! let versions = VersionSet::new(vec![ArchivedVersion::new("2.0")], CurrentVersion::default())?;
//! let config = SnapshotConfig {
//!     docs_dir: PathBuf::from("src/content/docs"),
//!     public_dir: PathBuf::from("public"),
//!     versions_dir: PathBuf::from("src/content/versions"),
//!     locales: Vec::new(),
//!     base: None,
//! };
//!
//! // Create the snapshot of the new version, if any
//! let storage = FsStorage::new();
//! SnapshotBuilder::new(&storage, &versions, &config).build(None)?;
//!
//! // Switch a page to another version
//! let resolver = VersionResolver::new(versions, SiteConfig::default());
//! let url = resolver.rewrite_url("/guides/example/", &Version::Current);
//! # Ok(())
//! # }
//! ```

mod asset;
mod document;
mod error;
mod path;
mod resolver;
mod rewrite;
mod route;
mod sidebar;
mod snapshot;
mod version;

pub use asset::{Asset, AssetRegistry};
pub use document::{
    Attribute, Document, Element, ElementContext, Field, Node, NodeKind, Syntax, Visit,
};
pub use error::VersionError;
pub use resolver::{OutputFormat, SiteConfig, VersionResolver};
pub use rewrite::{ContentRewriter, DocumentContext, RewriteOutput, rewrite_document};
pub use route::{
    Pagination, PaginationLink, RouteData, RouteVersioning, VersionOption, VersionedRoute,
    find_option, version_switcher,
};
pub use sidebar::{
    Autogenerate, ComposedSidebar, FrozenSidebar, FrozenSidebarStore, SidebarGroup,
    SidebarGroupKey, SidebarNode, compose_sidebar,
};
pub use snapshot::{SnapshotBuilder, SnapshotConfig, SnapshotReport};
pub use version::{
    ArchivedVersion, CURRENT_IDENTIFIER, CurrentVersion, RedirectPolicy, Version, VersionSet,
};
