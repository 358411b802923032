//! Per-document content rewriting.
//!
//! Turns one live document into its versioned equivalent: the frontmatter
//! slug and navigation links gain the version, root-relative links are
//! re-routed into the version and referenced binaries are queued for copying
//! next to their versioned location.
//!
//! Rewriting is a pure function of the source text and its
//! [`DocumentContext`]. It is single-application: rewriting an already
//! versioned document nests the version twice.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::{Captures, Regex};
use relative_path::RelativePath;
use serde_yaml::{Mapping, Value};

use crate::asset::{Asset, AssetRegistry};
use crate::document::{Document, ElementContext, Field, NodeKind, Syntax, Visit};
use crate::error::VersionError;
use crate::path::{
    UrlParts, insert_before_filename, is_external, is_locale, is_root_relative, join_segments,
    split_url, trim_slashes,
};
use crate::version::ArchivedVersion;

/// Module statement paths: `from "<path>"` at the end of a line.
static IMPORT_PATH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(from ?["'])([^"']*)(["'];?[ \t]?)$"#).expect("invalid import regex")
});

/// Binary files the host bundles from relative imports.
static BUNDLED_ASSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(png|jpg|jpeg|tiff|webp|gif|svg|avif)$").expect("invalid asset regex")
});

/// Elements whose `src`/`srcset` reference media files.
const MEDIA_ELEMENTS: &[&str] = &["img", "source", "Image", "picture", "audio", "video"];

/// Frontmatter fields of `hero.image` holding bundled images.
const HERO_IMAGE_FIELDS: &[&str] = &["file", "dark", "light"];

/// Per-document rewrite input.
#[derive(Clone, Debug)]
pub struct DocumentContext<'a> {
    /// Document slug relative to the docs root (`/` for the root index).
    pub slug: String,
    /// Locale of the document, when it lives in a locale directory.
    pub locale: Option<String>,
    /// Declared non-root locales of the site.
    pub locales: &'a [String],
    /// Site base path without trailing slash (e.g., `/docs`).
    pub base: Option<&'a str>,
    /// Location of the source document.
    pub source_path: PathBuf,
    /// Static files directory.
    pub public_dir: &'a Path,
    /// Version being created.
    pub version: &'a ArchivedVersion,
}

/// Result of rewriting one document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteOutput {
    /// Versioned document text.
    pub content: String,
    /// Assets referenced by the document, in discovery order.
    pub assets: Vec<Asset>,
}

/// Rewrite a document for the context's version.
///
/// # Errors
///
/// Returns [`VersionError::Frontmatter`] if the frontmatter is not valid YAML.
pub fn rewrite_document(
    source: &str,
    context: &DocumentContext<'_>,
) -> Result<RewriteOutput, VersionError> {
    let mut document = Document::parse(source, Syntax::from_path(&context.source_path));
    let mut rewriter = ContentRewriter::new(context);

    rewriter.rewrite_body(&mut document);
    if let Some(frontmatter) = document.frontmatter_mut() {
        rewriter.rewrite_frontmatter(frontmatter)?;
    }

    Ok(RewriteOutput {
        content: document.render(),
        assets: rewriter.assets.into_assets(),
    })
}

/// Applies the link and asset rules for one document.
pub struct ContentRewriter<'c, 'a> {
    context: &'c DocumentContext<'a>,
    assets: AssetRegistry,
}

impl<'c, 'a> ContentRewriter<'c, 'a> {
    /// Create a rewriter for one document.
    #[must_use]
    pub fn new(context: &'c DocumentContext<'a>) -> Self {
        Self {
            context,
            assets: AssetRegistry::new(),
        }
    }

    fn slug(&self) -> &'a str {
        &self.context.version.slug
    }

    fn is_locale(&self, segment: &str) -> bool {
        self.context.locale.as_deref() == Some(segment) || is_locale(segment, self.context.locales)
    }

    /// Route a root-relative link into the version.
    ///
    /// The version lands at segment 1, or 2 after a locale segment. A base
    /// path prefix is stripped first and restored afterwards.
    #[must_use]
    pub fn version_link(&self, link: &str) -> String {
        let UrlParts { path, suffix, .. } = split_url(link);
        let base = self.context.base.filter(|base| {
            !base.is_empty()
                && path
                    .strip_prefix(base)
                    .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        });
        let path = base.map_or(path, |base| &path[base.len()..]);

        let mut segments: Vec<&str> = path.split('/').collect();
        let index = if segments.get(1).is_some_and(|segment| self.is_locale(segment)) {
            2
        } else {
            1
        };
        segments.insert(index.min(segments.len()), self.slug());

        if let Some(base) = base {
            segments.insert(1, trim_slashes(base));
        }
        let mut versioned = segments.join("/");
        versioned.push_str(suffix);
        versioned
    }

    /// Version a root-relative public asset reference.
    ///
    /// The version is inserted before the filename; the file is queued to be
    /// copied inside the public directory.
    pub fn version_public_asset(&mut self, asset: &str) -> String {
        let versioned = insert_before_filename(asset, self.slug());
        let public_dir = self.context.public_dir;

        self.assets.register(
            public_dir.join(asset.trim_start_matches('/')),
            public_dir.join(versioned.trim_start_matches('/')),
        );
        versioned
    }

    /// Version a bundled asset referenced relative to the document.
    ///
    /// The file is queued to be copied next to its original location under a
    /// version directory; the reference gains one `../` for the extra depth
    /// of the versioned document.
    pub fn version_bundled_asset(&mut self, asset: &str) -> String {
        let versioned = insert_before_filename(asset, self.slug());
        let document_dir = self
            .context
            .source_path
            .parent()
            .unwrap_or_else(|| Path::new(""));

        self.assets.register(
            RelativePath::new(asset).to_logical_path(document_dir),
            RelativePath::new(&versioned).to_logical_path(document_dir),
        );
        format!("../{versioned}")
    }

    /// Version every root-relative candidate of a `srcset`.
    fn version_srcset(&mut self, value: &str) -> String {
        value
            .split(',')
            .map(|candidate| {
                let trimmed = candidate.trim_start();
                let leading = &candidate[..candidate.len() - trimmed.len()];
                let (url, descriptor) = trimmed
                    .split_once(char::is_whitespace)
                    .map_or((trimmed, ""), |(url, _)| (url, &trimmed[url.len()..]));
                if is_root_relative(url) {
                    format!("{leading}{}{descriptor}", self.version_public_asset(url))
                } else {
                    candidate.to_owned()
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    fn rewrite_imports(&mut self, source: &str) -> String {
        let mut rewritten = String::with_capacity(source.len() + 16);
        let mut last = 0;

        for caps in IMPORT_PATH_RE.captures_iter(source) {
            let (Some(whole), Some(path)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            rewritten.push_str(&source[last..whole.start()]);
            rewritten.push_str(&self.rewrite_import(&caps, path.as_str()));
            last = whole.end();
        }
        rewritten.push_str(&source[last..]);
        rewritten
    }

    fn rewrite_import(&mut self, caps: &Captures<'_>, path: &str) -> String {
        let (start, end) = (&caps[1], &caps[3]);
        if !path.starts_with("../") {
            return caps[0].to_owned();
        }
        if BUNDLED_ASSET_RE.is_match(path) {
            return format!("{start}{}{end}", self.version_bundled_asset(path));
        }
        format!("{start}../{path}{end}")
    }

    fn rewrite_url_field(&mut self, url: &mut Field, rule: fn(&mut Self, &str) -> String) {
        let value = rule(self, url.value());
        url.set(value);
    }

    /// Rewrite links, images, imports and media elements of the body.
    pub fn rewrite_body(&mut self, document: &mut Document) {
        document.root_mut().walk(&mut |node| match &mut node.kind {
            NodeKind::Link { url } => {
                if url.is_editable() && is_root_relative(url.value()) {
                    self.rewrite_url_field(url, |this, link| this.version_link(link));
                }
                Visit::Skip
            }
            NodeKind::Image { url } => {
                let value = url.value();
                if url.is_editable() && !value.is_empty() && !is_external(value) {
                    if is_root_relative(value) {
                        self.rewrite_url_field(url, Self::version_public_asset);
                    } else {
                        self.rewrite_url_field(url, Self::version_bundled_asset);
                    }
                }
                Visit::Skip
            }
            NodeKind::Esm { source } => {
                let rewritten = self.rewrite_imports(source.value());
                source.set(rewritten);
                Visit::Skip
            }
            NodeKind::Element(element)
                if element.context == ElementContext::Text && element.name == "a" =>
            {
                for href in element.attribute_values_mut("href") {
                    if is_root_relative(href.value()) {
                        let link = self.version_link(href.value());
                        href.set(link);
                    }
                }
                Visit::Continue
            }
            NodeKind::Element(element) if MEDIA_ELEMENTS.contains(&element.name.as_str()) => {
                let mut rewritten = false;
                for attribute in &mut element.attributes {
                    if !matches!(attribute.name.as_str(), "src" | "srcset") {
                        continue;
                    }
                    let srcset = attribute.name == "srcset";
                    if let Some(value) = attribute.value.as_mut()
                        && is_root_relative(value.value())
                    {
                        let versioned = if srcset {
                            self.version_srcset(value.value())
                        } else {
                            self.version_public_asset(value.value())
                        };
                        value.set(versioned);
                        rewritten = true;
                    }
                }
                if rewritten {
                    Visit::Skip
                } else {
                    Visit::Continue
                }
            }
            _ => Visit::Continue,
        });
    }

    /// Rewrite the YAML frontmatter content.
    ///
    /// # Errors
    ///
    /// Returns [`VersionError::Frontmatter`] if the YAML is invalid or not a
    /// mapping.
    pub fn rewrite_frontmatter(&mut self, field: &mut Field) -> Result<(), VersionError> {
        let original = field.value();
        let mut frontmatter = match serde_yaml::from_str::<Value>(original) {
            Ok(Value::Mapping(mapping)) => mapping,
            Ok(Value::Null) => Mapping::new(),
            Ok(_) => {
                return Err(VersionError::Frontmatter {
                    message: "frontmatter must be a mapping".to_owned(),
                });
            }
            Err(e) => {
                return Err(VersionError::Frontmatter {
                    message: e.to_string(),
                });
            }
        };

        let slug = self.versioned_slug(frontmatter.get("slug").and_then(Value::as_str));
        frontmatter.insert(Value::from("slug"), Value::from(slug));

        for key in ["prev", "next"] {
            if let Some(link) = frontmatter
                .get_mut(key)
                .and_then(|pointer| pointer.get_mut("link"))
            {
                self.rewrite_yaml_link(link);
            }
        }

        if let Some(hero) = frontmatter.get_mut("hero") {
            if let Some(Value::Sequence(actions)) = hero.get_mut("actions") {
                for action in actions {
                    if let Some(link) = action.get_mut("link") {
                        self.rewrite_yaml_link(link);
                    }
                }
            }
            if let Some(image) = hero.get_mut("image") {
                for key in HERO_IMAGE_FIELDS {
                    if let Some(Value::String(path)) = image.get_mut(*key)
                        && path.starts_with("../")
                    {
                        *path = self.version_bundled_asset(path);
                    }
                }
            }
        }

        let yaml = serde_yaml::to_string(&Value::Mapping(frontmatter)).map_err(|e| {
            VersionError::Frontmatter {
                message: e.to_string(),
            }
        })?;
        let trailing = &original[original.trim_end().len()..];
        let trailing = if trailing.is_empty() { "\n" } else { trailing };
        field.set(format!("{}{trailing}", yaml.trim_end()));
        Ok(())
    }

    fn rewrite_yaml_link(&self, link: &mut Value) {
        if let Value::String(value) = link
            && value.starts_with('/')
        {
            *value = self.version_link(value);
        }
    }

    /// Versioned frontmatter slug.
    ///
    /// An explicit slug is prefixed by the version; otherwise the version is
    /// inserted into the positional slug (after its locale, if any). The root
    /// index maps to the bare version slug.
    #[must_use]
    pub fn versioned_slug(&self, explicit: Option<&str>) -> String {
        let version = self.slug();
        if let Some(explicit) = explicit {
            return join_segments([version, explicit]);
        }

        let slug = self.context.slug.as_str();
        if slug == "/" || slug.is_empty() {
            return version.to_owned();
        }

        let mut segments: Vec<&str> = slug.split('/').collect();
        let index = match (&self.context.locale, segments.first()) {
            (Some(locale), Some(first)) if locale == first => 1,
            _ => 0,
        };
        segments.insert(index, version);
        segments.join("/")
    }
}
