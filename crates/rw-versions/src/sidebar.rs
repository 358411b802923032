//! Sidebar composition across versions.
//!
//! The live sidebar is frozen into `<versions_dir>/<slug>.json` when a
//! version is created. At serve time the live sidebar and every frozen one
//! are composed into one list of groups, one per version, and the group of
//! the page's version is selected.

use std::path::{Path, PathBuf};

use rw_storage::{Storage, StorageExt};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::VersionError;
use crate::path::join_segments;
use crate::version::{Version, VersionSet};

/// Directory settings of an autogenerated sidebar section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Autogenerate {
    /// Directory whose documents are listed.
    pub directory: String,
    /// Other settings, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A sidebar entry as accepted by the host framework.
///
/// Fields not modelled here are kept in `extra` and written back unchanged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SidebarNode {
    /// Group of nested entries.
    Group {
        /// Group label.
        label: String,
        /// Nested entries.
        items: Vec<SidebarNode>,
        /// Other fields (e.g., `collapsed`, `badge`).
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Section generated from a directory.
    Autogenerate {
        /// Section label.
        label: String,
        /// Directory settings.
        autogenerate: Autogenerate,
        /// Other fields.
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Explicit link.
    Link {
        /// Link label.
        label: String,
        /// Link target.
        link: String,
        /// Other fields (e.g., `attrs`, `badge`).
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Reference to a document by slug.
    Slug {
        /// Document slug.
        slug: String,
        /// Other fields (e.g., `label`).
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    /// Bare document slug.
    Entry(String),
}

impl SidebarNode {
    /// Create a link entry.
    #[must_use]
    pub fn link(label: impl Into<String>, link: impl Into<String>) -> Self {
        Self::Link {
            label: label.into(),
            link: link.into(),
            extra: Map::new(),
        }
    }

    /// Create a group entry.
    #[must_use]
    pub fn group(label: impl Into<String>, items: Vec<SidebarNode>) -> Self {
        Self::Group {
            label: label.into(),
            items,
            extra: Map::new(),
        }
    }

    /// Create an autogenerated section.
    #[must_use]
    pub fn autogenerate(label: impl Into<String>, directory: impl Into<String>) -> Self {
        Self::Autogenerate {
            label: label.into(),
            autogenerate: Autogenerate {
                directory: directory.into(),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Copy of this entry with every target moved under `prefix`.
    ///
    /// Groups recurse, autogenerate directories and slugs are joined with the
    /// prefix, and links get the prefix as their first path segment. Links
    /// with an `http(s)` scheme are left unchanged.
    #[must_use]
    pub fn with_prefix(&self, prefix: &str) -> Self {
        match self {
            Self::Group { label, items, extra } => Self::Group {
                label: label.clone(),
                items: items.iter().map(|item| item.with_prefix(prefix)).collect(),
                extra: extra.clone(),
            },
            Self::Autogenerate {
                label,
                autogenerate,
                extra,
            } => Self::Autogenerate {
                label: label.clone(),
                autogenerate: Autogenerate {
                    directory: join_segments([prefix, autogenerate.directory.as_str()]),
                    extra: autogenerate.extra.clone(),
                },
                extra: extra.clone(),
            },
            Self::Link { label, link, extra } => Self::Link {
                label: label.clone(),
                link: prefix_link(link, prefix),
                extra: extra.clone(),
            },
            Self::Slug { slug, extra } => Self::Slug {
                slug: join_segments([prefix, slug.as_str()]),
                extra: extra.clone(),
            },
            Self::Entry(slug) => Self::Entry(join_segments([prefix, slug.as_str()])),
        }
    }
}

fn prefix_link(link: &str, prefix: &str) -> String {
    if link.starts_with("http://") || link.starts_with("https://") {
        return link.to_owned();
    }
    let mut segments: Vec<&str> = link.split('/').collect();
    segments.insert(1.min(segments.len()), prefix);
    segments.join("/")
}

/// Sidebar captured when a version is created.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrozenSidebar {
    /// Live sidebar at snapshot time; absent when the site had none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sidebar: Option<Vec<SidebarNode>>,
}

/// Reads and writes frozen sidebars in the versions directory.
pub struct FrozenSidebarStore<'a, S: Storage + ?Sized> {
    storage: &'a S,
    dir: PathBuf,
}

impl<'a, S: Storage + ?Sized> FrozenSidebarStore<'a, S> {
    /// Create a store rooted at `dir`.
    pub fn new(storage: &'a S, dir: impl Into<PathBuf>) -> Self {
        Self {
            storage,
            dir: dir.into(),
        }
    }

    /// Location of a version's frozen sidebar.
    #[must_use]
    pub fn path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.json"))
    }

    /// Directory holding frozen sidebars.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a version's frozen sidebar.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::MissingVersionConfig`] if the file is missing
    /// or malformed.
    pub fn read(&self, slug: &str) -> Result<FrozenSidebar, VersionError> {
        self.storage
            .read_json(&self.path(slug))
            .map_err(|source| VersionError::MissingVersionConfig {
                slug: slug.to_owned(),
                source,
            })
    }

    /// Persist a version's frozen sidebar.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Storage`] if the file can't be written.
    pub fn write(&self, slug: &str, sidebar: &FrozenSidebar) -> Result<(), VersionError> {
        self.storage.ensure_dir(&self.dir)?;
        self.storage.write_json(&self.path(slug), sidebar)?;
        Ok(())
    }
}

/// Identifies a group of the composed sidebar.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SidebarGroupKey {
    /// Live content.
    Current,
    /// A declared version, by slug.
    Version(String),
}

impl SidebarGroupKey {
    /// Group key of a version.
    #[must_use]
    pub fn of(version: &Version) -> Self {
        match version {
            Version::Current => Self::Current,
            Version::Archived(version) => Self::Version(version.slug.clone()),
        }
    }
}

/// A group of the composed sidebar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SidebarGroup {
    /// Which version the group belongs to.
    pub key: SidebarGroupKey,
    /// Group label (current version label or version slug).
    pub label: String,
    /// Entries of the group.
    pub entries: Vec<SidebarNode>,
}

/// Live and frozen sidebars merged into one structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComposedSidebar {
    /// Current group first, then one group per version in declaration order.
    pub groups: Vec<SidebarGroup>,
}

impl ComposedSidebar {
    /// Entries of a version's group.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InternalConsistency`] if the group is missing.
    pub fn select_group(&self, version: &Version) -> Result<&[SidebarNode], VersionError> {
        let key = SidebarGroupKey::of(version);
        self.groups
            .iter()
            .find(|group| group.key == key)
            .map(|group| group.entries.as_slice())
            .ok_or_else(|| VersionError::InternalConsistency {
                group: version.to_string(),
            })
    }
}

/// Compose the live sidebar with every version's frozen sidebar.
///
/// Versions without a recorded sidebar get a single autogenerated section
/// rooted at their slug.
///
/// # Errors
///
/// Returns [`VersionError::MissingVersionConfig`] if a frozen sidebar can't
/// be read.
pub fn compose_sidebar<S: Storage + ?Sized>(
    live: &[SidebarNode],
    versions: &VersionSet,
    store: &FrozenSidebarStore<'_, S>,
) -> Result<ComposedSidebar, VersionError> {
    let mut groups = Vec::with_capacity(versions.versions().len() + 1);
    groups.push(SidebarGroup {
        key: SidebarGroupKey::Current,
        label: versions.current().label.clone(),
        entries: live.to_vec(),
    });

    for version in versions.versions() {
        let slug = version.slug.as_str();
        let entries = match store.read(slug)?.sidebar {
            Some(sidebar) => sidebar.iter().map(|node| node.with_prefix(slug)).collect(),
            None => vec![SidebarNode::autogenerate(slug, slug)],
        };
        groups.push(SidebarGroup {
            key: SidebarGroupKey::Version(slug.to_owned()),
            label: slug.to_owned(),
            entries,
        });
    }

    Ok(ComposedSidebar { groups })
}
