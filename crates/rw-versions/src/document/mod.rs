//! Lossless document model.
//!
//! A [`Document`] keeps its source text, an optional YAML frontmatter
//! [`Field`] and a tagged-node tree of the body. Rendering splices every
//! changed field back into the source, so untouched bytes are preserved.

mod element;
mod parse;
mod tree;

use std::ops::Range;
use std::path::Path;

pub use tree::{Attribute, Element, ElementContext, Field, Node, NodeKind, Visit};

/// Source dialect of a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Syntax {
    #[default]
    Markdown,
    /// Adds ESM statements and Markdown nested in components.
    Mdx,
}

impl Syntax {
    /// Dialect implied by a file extension; `.mdx` is MDX, anything else Markdown.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mdx") => Self::Mdx,
            _ => Self::Markdown,
        }
    }
}

/// A parsed Markdown/MDX document.
#[derive(Clone, Debug)]
pub struct Document {
    source: String,
    frontmatter: Option<Field>,
    root: Node,
}

impl Document {
    /// Parse a document.
    #[must_use]
    pub fn parse(source: impl Into<String>, syntax: Syntax) -> Self {
        let source = source.into();
        let (frontmatter, root) = match parse::split_frontmatter(&source) {
            Some((span, body_start)) => (
                Some(Field::new(&source[span.clone()], span)),
                parse::parse_body(&source[body_start..], body_start, syntax),
            ),
            None => (None, parse::parse_body(&source, 0, syntax)),
        };

        Self {
            source,
            frontmatter,
            root,
        }
    }

    /// YAML frontmatter content (without fences), if present.
    #[must_use]
    pub fn frontmatter(&self) -> Option<&Field> {
        self.frontmatter.as_ref()
    }

    /// Mutable YAML frontmatter content.
    pub fn frontmatter_mut(&mut self) -> Option<&mut Field> {
        self.frontmatter.as_mut()
    }

    /// Mutable body tree.
    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    /// Render the document, applying every changed field.
    #[must_use]
    pub fn render(&self) -> String {
        let mut fields = Vec::new();
        fields.extend(self.frontmatter.as_ref());
        self.root.collect_fields(&mut fields);

        let mut edits: Vec<(&Range<usize>, &str)> = fields
            .into_iter()
            .filter(|field| field.is_changed())
            .filter_map(|field| field.span().map(|span| (span, field.value())))
            .collect();
        edits.sort_by_key(|(span, _)| span.start);

        let mut output = String::with_capacity(self.source.len() + 64);
        let mut cursor = 0;
        for (span, value) in edits {
            if span.start < cursor {
                continue;
            }
            output.push_str(&self.source[cursor..span.start]);
            output.push_str(value);
            cursor = span.end;
        }
        output.push_str(&self.source[cursor..]);
        output
    }
}
