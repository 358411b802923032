//! Version data model.
//!
//! Archived versions are declared in configuration, in order. The live
//! content is the [`Version::Current`] case and is never snapshotted.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VersionError;

/// Identifier of the current version in URLs, selects and logs.
pub const CURRENT_IDENTIFIER: &str = "current";

/// How a URL is mapped when switching to a version.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectPolicy {
    /// Land on the index page of the target version.
    Root,
    /// Keep the page path and swap the version segment.
    #[default]
    SamePage,
}

impl fmt::Display for RedirectPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("root"),
            Self::SamePage => f.write_str("same-page"),
        }
    }
}

/// A frozen, slug-identified snapshot of the documentation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedVersion {
    /// URL segment identifying the version (e.g., `2.0`).
    pub slug: String,
    /// Label shown in the UI. Falls back to the slug.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Redirect policy used when switching to this version.
    #[serde(default)]
    pub redirect: RedirectPolicy,
}

impl ArchivedVersion {
    /// Create a version with the default redirect policy and no label.
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            label: None,
            redirect: RedirectPolicy::default(),
        }
    }

    /// Set the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the redirect policy.
    #[must_use]
    pub fn with_redirect(mut self, redirect: RedirectPolicy) -> Self {
        self.redirect = redirect;
        self
    }

    /// Display label, falling back to the slug.
    #[must_use]
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.slug)
    }
}

fn default_current_label() -> String {
    "Latest".to_owned()
}

/// Settings of the live, unversioned content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentVersion {
    /// Label shown in the UI.
    #[serde(default = "default_current_label")]
    pub label: String,
    /// Redirect policy used when switching back to the current version.
    #[serde(default)]
    pub redirect: RedirectPolicy,
}

impl Default for CurrentVersion {
    fn default() -> Self {
        Self {
            label: default_current_label(),
            redirect: RedirectPolicy::default(),
        }
    }
}

/// The version a page belongs to or a URL is rewritten to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Version {
    /// Live content.
    Current,
    /// A declared snapshot.
    Archived(ArchivedVersion),
}

impl Version {
    /// Stable identifier: `current` or the slug.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Current => CURRENT_IDENTIFIER,
            Self::Archived(version) => &version.slug,
        }
    }

    /// Slug of an archived version, `None` for the current one.
    #[must_use]
    pub fn slug(&self) -> Option<&str> {
        match self {
            Self::Current => None,
            Self::Archived(version) => Some(&version.slug),
        }
    }

    /// Check if this is the current version.
    #[must_use]
    pub fn is_current(&self) -> bool {
        matches!(self, Self::Current)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Current => f.write_str("current version"),
            Self::Archived(version) => write!(f, "version '{}'", version.slug),
        }
    }
}

/// Declared versions plus the current-version settings.
///
/// Declaration order is preserved; lookups by slug are constant time.
#[derive(Clone, Debug)]
pub struct VersionSet {
    versions: Vec<ArchivedVersion>,
    by_slug: HashMap<String, usize>,
    current: CurrentVersion,
}

impl VersionSet {
    /// Build a version set.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Config`] if the list is empty or a slug is
    /// declared twice.
    pub fn new(
        versions: Vec<ArchivedVersion>,
        current: CurrentVersion,
    ) -> Result<Self, VersionError> {
        if versions.is_empty() {
            return Err(VersionError::Config(
                "at least one version must be configured".to_owned(),
            ));
        }

        let mut by_slug = HashMap::with_capacity(versions.len());
        for (index, version) in versions.iter().enumerate() {
            if by_slug.insert(version.slug.clone(), index).is_some() {
                return Err(VersionError::Config(format!(
                    "version '{}' is declared more than once",
                    version.slug
                )));
            }
        }

        Ok(Self {
            versions,
            by_slug,
            current,
        })
    }

    /// Declared versions in declaration order.
    #[must_use]
    pub fn versions(&self) -> &[ArchivedVersion] {
        &self.versions
    }

    /// Current-version settings.
    #[must_use]
    pub fn current(&self) -> &CurrentVersion {
        &self.current
    }

    /// Find a declared version by slug.
    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&ArchivedVersion> {
        self.by_slug.get(slug).map(|&index| &self.versions[index])
    }

    /// Check if a slug names a declared version.
    #[must_use]
    pub fn contains(&self, slug: &str) -> bool {
        self.by_slug.contains_key(slug)
    }

    /// Resolve an identifier (`current` or a slug) to a version.
    ///
    /// A declared slug wins over the `current` keyword.
    #[must_use]
    pub fn resolve(&self, identifier: &str) -> Option<Version> {
        match self.get(identifier) {
            Some(version) => Some(Version::Archived(version.clone())),
            None if identifier == CURRENT_IDENTIFIER => Some(Version::Current),
            None => None,
        }
    }

    /// Redirect policy applied when switching to `target`.
    #[must_use]
    pub fn policy_for(&self, target: &Version) -> RedirectPolicy {
        match target {
            Version::Current => self.current.redirect,
            Version::Archived(version) => version.redirect,
        }
    }

    /// Display label of a version.
    #[must_use]
    pub fn label_for<'a>(&'a self, version: &'a Version) -> &'a str {
        match version {
            Version::Current => &self.current.label,
            Version::Archived(version) => version.display_label(),
        }
    }
}
