//! Slug and URL path helpers.

use std::path::{Component, Path};

/// Markdown-family extensions rewritten during snapshots.
pub(crate) const DOCUMENT_EXTENSIONS: &[&str] = &["md", "mdx", "markdown", "mdoc"];

/// Check if a file is a document (by extension, case-insensitive).
pub(crate) fn is_document(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            DOCUMENT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Remove leading and trailing slashes.
pub(crate) fn trim_slashes(value: &str) -> &str {
    value.trim_matches('/')
}

/// Join slug parts with `/`, dropping empty segments.
pub(crate) fn join_segments<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    let mut joined = String::new();
    for segment in parts.into_iter().flat_map(|part| part.split('/')) {
        if segment.is_empty() {
            continue;
        }
        if !joined.is_empty() {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    joined
}

/// Compute a document slug from its path relative to the docs root.
///
/// The extension is stripped, segments are lowercased with whitespace turned
/// into `-`, `x/index` collapses to `x` and the root index maps to `/`.
pub(crate) fn doc_slug(relative: &Path) -> String {
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    if let Some(last) = segments.last_mut()
        && is_document(Path::new(last.as_str()))
        && let Some((stem, _)) = last.rsplit_once('.')
    {
        *last = stem.to_owned();
    }

    let slug = segments
        .iter()
        .map(|segment| slugify_segment(segment))
        .collect::<Vec<_>>()
        .join("/");

    if slug == "index" {
        return "/".to_owned();
    }
    slug.strip_suffix("/index").unwrap_or(&slug).to_owned()
}

fn slugify_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect::<String>()
        .to_lowercase()
}

/// Key of the root locale; it never shows up as a path segment.
pub(crate) const ROOT_LOCALE: &str = "root";

/// Check if a path segment names a declared non-root locale.
pub(crate) fn is_locale(segment: &str, locales: &[String]) -> bool {
    segment != ROOT_LOCALE && locales.iter().any(|locale| locale == segment)
}

/// Locale of a document: the leading slug segment when it is a declared locale.
pub(crate) fn doc_locale(slug: &str, locales: &[String]) -> Option<String> {
    let first = slug.split('/').next()?;
    is_locale(first, locales).then(|| first.to_owned())
}

/// Insert a segment right before the final (filename) segment of a path.
pub(crate) fn insert_before_filename(path: &str, segment: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, file)) => format!("{dir}/{segment}/{file}"),
        None => format!("{segment}/{path}"),
    }
}

/// Check if a URL is absolute (has a scheme) or protocol-relative.
pub(crate) fn is_external(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Check if a URL is root-relative (`/path`, not `//host`).
pub(crate) fn is_root_relative(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//")
}

/// A URL split into the part before the path, the path and the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct UrlParts<'a> {
    /// Scheme and authority (`https://example.com`), empty for paths.
    pub prefix: &'a str,
    /// Path component.
    pub path: &'a str,
    /// Query and fragment, including their leading `?`/`#`.
    pub suffix: &'a str,
}

/// Split a URL or bare path into prefix, path and suffix.
pub(crate) fn split_url(url: &str) -> UrlParts<'_> {
    let suffix_start = url.find(['?', '#']).unwrap_or(url.len());
    let (head, suffix) = url.split_at(suffix_start);

    let path_start = match head.find("://") {
        Some(scheme_end) => {
            let authority = scheme_end + 3;
            head[authority..]
                .find('/')
                .map_or(head.len(), |i| authority + i)
        }
        None => 0,
    };
    let (prefix, path) = head.split_at(path_start);

    UrlParts {
        prefix,
        path,
        suffix,
    }
}
