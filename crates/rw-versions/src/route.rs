//! Per-page versioning of route data.
//!
//! The host framework hands over the page slug, locale and pagination. The
//! page gets the sidebar of its own version, and pagination links leading
//! into another version are dropped.

use serde::{Deserialize, Serialize};

use crate::error::VersionError;
use crate::resolver::VersionResolver;
use crate::sidebar::{ComposedSidebar, SidebarNode};
use crate::version::{CURRENT_IDENTIFIER, Version};

/// A prev/next pagination link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationLink {
    /// Link target.
    pub href: String,
    /// Link label.
    pub label: String,
}

/// Pagination of a page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prev: Option<PaginationLink>,
    /// Next page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PaginationLink>,
}

/// Route data of a page, as provided by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteData {
    /// Page slug (e.g., `fr/2.0/guides/example`).
    pub slug: String,
    /// Page locale, when not the root locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    /// Pagination links.
    #[serde(default)]
    pub pagination: Pagination,
}

/// Route data with versioning applied.
#[derive(Clone, Debug, PartialEq)]
pub struct VersionedRoute {
    /// Version of the page.
    pub version: Version,
    /// Sidebar entries of the page's version.
    pub sidebar: Vec<SidebarNode>,
    /// Pagination restricted to the page's version.
    pub pagination: Pagination,
}

/// Applies versioning to route data.
pub struct RouteVersioning<'a> {
    resolver: &'a VersionResolver,
    sidebar: &'a ComposedSidebar,
}

impl<'a> RouteVersioning<'a> {
    /// Create route versioning over a composed sidebar.
    #[must_use]
    pub fn new(resolver: &'a VersionResolver, sidebar: &'a ComposedSidebar) -> Self {
        Self { resolver, sidebar }
    }

    /// Version a page's route data.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::InternalConsistency`] if the composed sidebar
    /// has no group for the page's version.
    pub fn resolve(&self, route: &RouteData) -> Result<VersionedRoute, VersionError> {
        let version = self.resolver.version_from_slug(&route.slug);
        let sidebar = self.sidebar.select_group(&version)?.to_vec();

        let locale = route.locale.as_deref();
        let keep = |link: &Option<PaginationLink>| {
            link.as_ref()
                .filter(|link| {
                    self.resolver
                        .filter_pagination_link(&version, &link.href, locale)
                        .is_some()
                })
                .cloned()
        };
        let pagination = Pagination {
            prev: keep(&route.pagination.prev),
            next: keep(&route.pagination.next),
        };

        Ok(VersionedRoute {
            version,
            sidebar,
            pagination,
        })
    }
}

/// An entry of the version switcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionOption {
    /// `current` or the version slug.
    pub identifier: String,
    /// Display label.
    pub label: String,
    /// Page URL rewritten to the version.
    pub url: String,
    /// Whether the page belongs to this version.
    pub selected: bool,
}

/// Build the version switcher entries for a page URL.
///
/// The current version comes first, then declared versions in order.
#[must_use]
pub fn version_switcher(resolver: &VersionResolver, url: &str) -> Vec<VersionOption> {
    let page_version = resolver.version_from_url(url);
    let versions = resolver.versions();

    std::iter::once(Version::Current)
        .chain(versions.versions().iter().cloned().map(Version::Archived))
        .map(|version| VersionOption {
            identifier: version.identifier().to_owned(),
            label: versions.label_for(&version).to_owned(),
            url: resolver.rewrite_url(url, &version),
            selected: version == page_version,
        })
        .collect()
}

/// Find a switcher option by identifier (`current` or a slug).
#[must_use]
pub fn find_option<'o>(options: &'o [VersionOption], identifier: &str) -> Option<&'o VersionOption> {
    let identifier = if identifier.is_empty() {
        CURRENT_IDENTIFIER
    } else {
        identifier
    };
    options.iter().find(|option| option.identifier == identifier)
}
