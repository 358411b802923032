//! Request-time version resolution.
//!
//! Maps page slugs and URLs to the version they belong to, and rewrites URLs
//! to point at another version. URLs are analysed as
//! `[base]/[locale]/[version]/<page>` in either addressing mode:
//!
//! - directory: `/fr/2.0/guides/example/`, index pages `/` and `/fr/2.0/`
//! - file: `/fr/2.0/guides/example.html`, index pages `/index.html`,
//!   `/fr.html` and `/fr/2.0.html`

use serde::{Deserialize, Serialize};

use crate::path::{is_locale, split_url, trim_slashes};
use crate::version::{RedirectPolicy, Version, VersionSet};

const HTML_EXTENSION: &str = ".html";
const INDEX_FILE: &str = "index";

/// How built pages are addressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Pages are folders: `/guides/example/`.
    #[default]
    Directory,
    /// Pages are files: `/guides/example.html`.
    File,
}

/// Site settings that shape URLs.
#[derive(Clone, Debug, Default)]
pub struct SiteConfig {
    /// Base path without trailing slash (e.g., `/docs`).
    pub base: Option<String>,
    /// Declared locales; `root` never appears in URLs.
    pub locales: Vec<String>,
    /// Page addressing mode.
    pub format: OutputFormat,
}

/// A site path split into its versioning parts.
#[derive(Clone, Debug, PartialEq, Eq)]
struct Route<'u> {
    locale: Option<&'u str>,
    version: Option<&'u str>,
    page: Vec<&'u str>,
    trailing_slash: bool,
}

/// Resolves versions from slugs and URLs.
#[derive(Clone, Debug)]
pub struct VersionResolver {
    versions: VersionSet,
    site: SiteConfig,
}

impl VersionResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(versions: VersionSet, mut site: SiteConfig) -> Self {
        site.base = site
            .base
            .map(|base| format!("/{}", trim_slashes(&base)))
            .filter(|base| base != "/");
        Self { versions, site }
    }

    /// Declared versions.
    #[must_use]
    pub fn versions(&self) -> &VersionSet {
        &self.versions
    }

    /// Site settings.
    #[must_use]
    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    fn is_locale(&self, segment: &str) -> bool {
        is_locale(segment, &self.site.locales)
    }

    fn archived(&self, segment: Option<&str>) -> Option<Version> {
        segment
            .and_then(|slug| self.versions.get(slug))
            .map(|version| Version::Archived(version.clone()))
    }

    /// Version of a page slug (e.g., `2.0/guides/example`, `fr/2.0/guides`).
    ///
    /// The first segment is tested against declared versions, then the
    /// second one when the first is a locale. Anything else is current.
    #[must_use]
    pub fn version_from_slug(&self, slug: &str) -> Version {
        let mut segments = trim_slashes(slug).split('/');
        let first = segments.next().filter(|segment| !segment.is_empty());

        self.archived(first)
            .or_else(|| {
                first
                    .filter(|segment| self.is_locale(segment))
                    .and_then(|_| self.archived(segments.next()))
            })
            .unwrap_or(Version::Current)
    }

    /// Version of a page URL (full URL or path, base path included).
    #[must_use]
    pub fn version_from_url(&self, url: &str) -> Version {
        let path = split_url(url).path;
        let route = self.parse_route(self.strip_base(path).unwrap_or(path));
        self.archived(route.version).unwrap_or(Version::Current)
    }

    /// Rewrite a page URL to point at `target`.
    ///
    /// The target's redirect policy decides between the same page in the
    /// target version (`same-page`) and the target version's index page
    /// (`root`). Scheme, host, query and fragment are preserved; the base
    /// path and locale segment are kept.
    #[must_use]
    pub fn rewrite_url(&self, url: &str, target: &Version) -> String {
        let parts = split_url(url);
        let (base, path) = match self.strip_base(parts.path) {
            Some(rest) => (self.site.base.as_deref().unwrap_or_default(), rest),
            None => ("", parts.path),
        };

        let mut route = self.parse_route(path);
        route.version = target.slug();
        if self.versions.policy_for(target) == RedirectPolicy::Root {
            route.page.clear();
        }

        format!(
            "{}{base}{}{}",
            parts.prefix,
            self.render_route(&route),
            parts.suffix
        )
    }

    /// Version targeted by a prev/next pagination link.
    ///
    /// The base path and the page's locale segment are skipped before the
    /// version segment is read.
    #[must_use]
    pub fn version_from_pagination_link(&self, href: &str, locale: Option<&str>) -> Version {
        let path = split_url(href).path;
        let path = self.strip_base(path).unwrap_or(path);
        let mut segments = path.split('/').filter(|segment| !segment.is_empty());

        let mut first = segments.next();
        if let Some(locale) = locale.filter(|locale| self.is_locale(locale))
            && first.map(strip_html) == Some(locale)
        {
            first = segments.next();
        }

        self.archived(first.map(strip_html))
            .unwrap_or(Version::Current)
    }

    /// Keep a pagination link only if it stays within `page_version`.
    #[must_use]
    pub fn filter_pagination_link<'l>(
        &self,
        page_version: &Version,
        href: &'l str,
        locale: Option<&str>,
    ) -> Option<&'l str> {
        (self.version_from_pagination_link(href, locale) == *page_version).then_some(href)
    }

    /// Remove the base path prefix, if present.
    fn strip_base<'p>(&self, path: &'p str) -> Option<&'p str> {
        let base = self.site.base.as_deref()?;
        let rest = path.strip_prefix(base)?;
        (rest.is_empty() || rest.starts_with('/')).then_some(rest)
    }

    fn parse_route<'u>(&self, path: &'u str) -> Route<'u> {
        let trailing_slash = path.ends_with('/');
        let mut segments: Vec<&'u str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if self.site.format == OutputFormat::File
            && let Some(last) = segments.pop()
        {
            segments.push(strip_html(last));
            if segments == [INDEX_FILE] {
                segments.clear();
            }
        }

        let mut segments = segments.into_iter().peekable();
        let locale = segments.next_if(|segment| self.is_locale(segment));
        let version = segments.next_if(|segment| self.versions.contains(segment));

        Route {
            locale,
            version,
            page: segments.collect(),
            trailing_slash,
        }
    }

    fn render_route(&self, route: &Route<'_>) -> String {
        let segments: Vec<&str> = route
            .locale
            .into_iter()
            .chain(route.version)
            .chain(route.page.iter().copied())
            .collect();

        match self.site.format {
            OutputFormat::Directory if segments.is_empty() => "/".to_owned(),
            OutputFormat::Directory => {
                let slash = if route.trailing_slash || route.page.is_empty() {
                    "/"
                } else {
                    ""
                };
                format!("/{}{slash}", segments.join("/"))
            }
            OutputFormat::File if segments.is_empty() => format!("/{INDEX_FILE}{HTML_EXTENSION}"),
            OutputFormat::File => format!("/{}{HTML_EXTENSION}", segments.join("/")),
        }
    }
}

fn strip_html(segment: &str) -> &str {
    segment.strip_suffix(HTML_EXTENSION).unwrap_or(segment)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::version::{ArchivedVersion, CurrentVersion};

    fn resolver(policy: RedirectPolicy, locales: &[&str], format: OutputFormat) -> VersionResolver {
        resolver_with_base(policy, locales, format, None)
    }

    fn resolver_with_base(
        policy: RedirectPolicy,
        locales: &[&str],
        format: OutputFormat,
        base: Option<&str>,
    ) -> VersionResolver {
        let versions = VersionSet::new(
            vec![
                ArchivedVersion::new("2.0").with_redirect(policy),
                ArchivedVersion::new("3.0").with_redirect(policy),
            ],
            CurrentVersion {
                redirect: policy,
                ..CurrentVersion::default()
            },
        )
        .unwrap();
        VersionResolver::new(
            versions,
            SiteConfig {
                base: base.map(str::to_owned),
                locales: locales.iter().map(|&locale| locale.to_owned()).collect(),
                format,
            },
        )
    }

    fn v3(resolver: &VersionResolver) -> Version {
        resolver.versions().resolve("3.0").unwrap()
    }

    fn check<U: AsRef<str>, E: AsRef<str>>(
        resolver: &VersionResolver,
        cases: &[(U, E)],
        target: &Version,
    ) {
        for (url, expected) in cases {
            let (url, expected) = (url.as_ref(), expected.as_ref());
            let full = format!("https://example.com{url}");
            assert_eq!(
                resolver.rewrite_url(&full, target),
                format!("https://example.com{expected}"),
                "rewriting {url} to {target}"
            );
        }
    }

    const I18N: &[&str] = &["fr", "en", "ar", "pt-br"];
    const ROOT_LOCALE: &[&str] = &["root", "en", "ar"];

    #[test]
    fn test_version_from_slug() {
        let resolver = resolver(RedirectPolicy::SamePage, I18N, OutputFormat::Directory);

        assert_eq!(resolver.version_from_slug("guides/example"), Version::Current);
        assert_eq!(resolver.version_from_slug("5.0/guides/example"), Version::Current);
        assert_eq!(resolver.version_from_slug("3.0/guides/example"), v3(&resolver));
        assert_eq!(resolver.version_from_slug("3.0"), v3(&resolver));
        assert_eq!(resolver.version_from_slug("fr/3.0/guides"), v3(&resolver));
        assert_eq!(resolver.version_from_slug("de/3.0/guides"), Version::Current);
        assert_eq!(resolver.version_from_slug(""), Version::Current);
    }

    #[test]
    fn test_version_from_url() {
        let resolver = resolver_with_base(
            RedirectPolicy::SamePage,
            I18N,
            OutputFormat::File,
            Some("/test"),
        );

        assert_eq!(
            resolver.version_from_url("https://example.com/test/fr/3.0.html?q=1"),
            v3(&resolver)
        );
        assert_eq!(
            resolver.version_from_url("/test/guides/example.html"),
            Version::Current
        );
    }

    #[test]
    fn test_same_page_directory_basic() {
        let resolver = resolver(RedirectPolicy::SamePage, &[], OutputFormat::Directory);
        let v3 = v3(&resolver);

        check(
            &resolver,
            &[
                ("/", "/"),
                ("/guides/example/", "/guides/example/"),
                ("/3.0/guides/example/", "/guides/example/"),
                ("/3.0/", "/"),
            ],
            &Version::Current,
        );
        check(
            &resolver,
            &[
                ("/guides/example/", "/3.0/guides/example/"),
                ("/2.0/guides/example/", "/3.0/guides/example/"),
                ("/3.0/guides/example/", "/3.0/guides/example/"),
                ("/", "/3.0/"),
                ("/2.0/", "/3.0/"),
            ],
            &v3,
        );
    }

    #[test]
    fn test_same_page_directory_locales() {
        for locales in [I18N, ROOT_LOCALE, &["fr"][..]] {
            let resolver = resolver(RedirectPolicy::SamePage, locales, OutputFormat::Directory);
            let v3 = v3(&resolver);
            let locale = locales.iter().find(|&&l| l != "root").unwrap();

            check(
                &resolver,
                &[
                    (format!("/{locale}/3.0/guides/example/"), format!("/{locale}/guides/example/")),
                    (format!("/{locale}/3.0/"), format!("/{locale}/")),
                ],
                &Version::Current,
            );
            check(
                &resolver,
                &[
                    (format!("/{locale}/guides/example/"), format!("/{locale}/3.0/guides/example/")),
                    (format!("/{locale}/2.0/guides/example/"), format!("/{locale}/3.0/guides/example/")),
                    (format!("/{locale}/"), format!("/{locale}/3.0/")),
                ],
                &v3,
            );
        }
    }

    #[test]
    fn test_same_page_root_locale_unprefixed() {
        let resolver = resolver(RedirectPolicy::SamePage, ROOT_LOCALE, OutputFormat::Directory);

        check(
            &resolver,
            &[
                ("/guides/example/", "/3.0/guides/example/"),
                ("/2.0/guides/example/", "/3.0/guides/example/"),
                ("/", "/3.0/"),
            ],
            &v3(&resolver),
        );
    }

    #[test]
    fn test_same_page_file_mode() {
        let resolver = resolver(RedirectPolicy::SamePage, I18N, OutputFormat::File);
        let v3 = v3(&resolver);

        check(
            &resolver,
            &[
                ("/index.html", "/index.html"),
                ("/fr.html", "/fr.html"),
                ("/guides/example.html", "/guides/example.html"),
                ("/3.0/guides/example.html", "/guides/example.html"),
                ("/fr/3.0/guides/example.html", "/fr/guides/example.html"),
                ("/3.0.html", "/index.html"),
                ("/fr/3.0.html", "/fr.html"),
            ],
            &Version::Current,
        );
        check(
            &resolver,
            &[
                ("/guides/example.html", "/3.0/guides/example.html"),
                ("/2.0/guides/example.html", "/3.0/guides/example.html"),
                ("/fr/2.0/guides/example.html", "/fr/3.0/guides/example.html"),
                ("/index.html", "/3.0.html"),
                ("/2.0.html", "/3.0.html"),
                ("/fr.html", "/fr/3.0.html"),
                ("/fr/2.0.html", "/fr/3.0.html"),
                ("/3.0.html", "/3.0.html"),
            ],
            &v3,
        );
    }

    #[test]
    fn test_root_policy_directory() {
        let resolver = resolver(RedirectPolicy::Root, I18N, OutputFormat::Directory);
        let v3 = v3(&resolver);

        check(
            &resolver,
            &[
                ("/", "/"),
                ("/fr/", "/fr/"),
                ("/guides/example/", "/"),
                ("/fr/guides/example/", "/fr/"),
                ("/3.0/guides/example/", "/"),
                ("/fr/3.0/", "/fr/"),
            ],
            &Version::Current,
        );
        check(
            &resolver,
            &[
                ("/guides/example/", "/3.0/"),
                ("/2.0/guides/example/", "/3.0/"),
                ("/3.0/guides/example/", "/3.0/"),
                ("/fr/2.0guides/example/", "/fr/3.0/"),
                ("/fr/2.0", "/fr/3.0/"),
                ("/", "/3.0/"),
            ],
            &v3,
        );
    }

    #[test]
    fn test_root_policy_file_mode() {
        let resolver = resolver(RedirectPolicy::Root, I18N, OutputFormat::File);
        let v3 = v3(&resolver);

        check(
            &resolver,
            &[
                ("/index.html", "/index.html"),
                ("/guides/example.html", "/index.html"),
                ("/fr/guides/example.html", "/fr.html"),
                ("/3.0/guides/example.html", "/index.html"),
                ("/fr/3.0.html", "/fr.html"),
            ],
            &Version::Current,
        );
        check(
            &resolver,
            &[
                ("/guides/example.html", "/3.0.html"),
                ("/fr/2.0/guides/example.html", "/fr/3.0.html"),
                ("/3.0/guides/example.html", "/3.0.html"),
                ("/index.html", "/3.0.html"),
            ],
            &v3,
        );
    }

    #[test]
    fn test_base_path_preserved() {
        let resolver = resolver_with_base(
            RedirectPolicy::SamePage,
            I18N,
            OutputFormat::Directory,
            Some("/test/"),
        );
        let v3 = v3(&resolver);

        check(
            &resolver,
            &[
                ("/test/3.0/guides/example/", "/test/guides/example/"),
                ("/test/fr/3.0/guides/example/", "/test/fr/guides/example/"),
            ],
            &Version::Current,
        );
        check(
            &resolver,
            &[
                ("/test/guides/example/", "/test/3.0/guides/example/"),
                ("/test/fr/2.0/guides/example/", "/test/fr/3.0/guides/example/"),
            ],
            &v3,
        );
    }

    #[test]
    fn test_base_path_file_mode_root_policy() {
        let resolver = resolver_with_base(
            RedirectPolicy::Root,
            I18N,
            OutputFormat::File,
            Some("/test"),
        );

        check(
            &resolver,
            &[
                ("/test/3.0/guides/example.html", "/test/index.html"),
                ("/test/fr/3.0/guides/example.html", "/test/fr.html"),
            ],
            &Version::Current,
        );
    }

    #[test]
    fn test_base_requires_segment_boundary() {
        let resolver = resolver_with_base(
            RedirectPolicy::SamePage,
            &[],
            OutputFormat::Directory,
            Some("/test"),
        );

        assert_eq!(
            resolver.rewrite_url("/testing/page/", &v3(&resolver)),
            "/3.0/testing/page/"
        );
    }

    #[test]
    fn test_query_and_fragment_preserved() {
        let resolver = resolver(RedirectPolicy::SamePage, &[], OutputFormat::Directory);

        assert_eq!(
            resolver.rewrite_url("https://example.com/guides/?tab=1#intro", &v3(&resolver)),
            "https://example.com/3.0/guides/?tab=1#intro"
        );
        assert_eq!(
            resolver.rewrite_url("/3.0/guides/#intro", &Version::Current),
            "/guides/#intro"
        );
    }

    #[test]
    fn test_same_page_rewrite_is_noop_for_own_version() {
        let resolver = resolver(RedirectPolicy::SamePage, I18N, OutputFormat::Directory);

        for url in ["/guides/example/", "/3.0/guides/", "/fr/2.0/a/b/", "/", "/fr/"] {
            let version = resolver.version_from_url(url);
            assert_eq!(resolver.rewrite_url(url, &version), url);
        }
    }

    #[test]
    fn test_same_page_round_trip_through_version() {
        let resolver = resolver(RedirectPolicy::SamePage, I18N, OutputFormat::File);
        let v3 = v3(&resolver);

        for url in ["/guides/example.html", "/2.0/guides/example.html", "/fr/a.html", "/index.html"] {
            let direct = resolver.rewrite_url(url, &Version::Current);
            let via = resolver.rewrite_url(&resolver.rewrite_url(url, &v3), &Version::Current);
            assert_eq!(via, direct, "round trip of {url}");
        }
    }

    #[test]
    fn test_version_from_pagination_link() {
        let resolver = resolver_with_base(
            RedirectPolicy::SamePage,
            I18N,
            OutputFormat::Directory,
            Some("/test"),
        );

        assert_eq!(
            resolver.version_from_pagination_link("/test/3.0/guides/", None),
            v3(&resolver)
        );
        assert_eq!(
            resolver.version_from_pagination_link("/test/fr/3.0/guides/", Some("fr")),
            v3(&resolver)
        );
        assert_eq!(
            resolver.version_from_pagination_link("/test/fr/guides/", Some("fr")),
            Version::Current
        );
        assert_eq!(
            resolver.version_from_pagination_link("/test/", None),
            Version::Current
        );
    }

    #[test]
    fn test_filter_pagination_link() {
        let resolver = resolver(RedirectPolicy::SamePage, &[], OutputFormat::Directory);
        let v3 = v3(&resolver);

        assert_eq!(
            resolver.filter_pagination_link(&v3, "/3.0/next/", None),
            Some("/3.0/next/")
        );
        assert_eq!(resolver.filter_pagination_link(&v3, "/next/", None), None);
        assert_eq!(
            resolver.filter_pagination_link(&Version::Current, "/next/", None),
            Some("/next/")
        );
        assert_eq!(
            resolver.filter_pagination_link(&Version::Current, "/2.0/next/", None),
            None
        );
    }
}
