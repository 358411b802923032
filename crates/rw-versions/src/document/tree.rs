//! Tagged-node document tree and walker.
//!
//! The tree only models what versioning edits: link and image targets, ESM
//! statements and element attributes. Editable strings are [`Field`]s that
//! remember their byte span in the source so a document can be re-rendered
//! by splicing changed values into the original text.

use std::ops::Range;

/// Directive returned by a visitor for each node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    /// Descend into the node's children.
    Continue,
    /// Do not descend into the node's children.
    Skip,
}

/// An editable string anchored to a span of the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    value: String,
    span: Option<Range<usize>>,
    changed: bool,
}

impl Field {
    /// Create a field anchored to `span`.
    #[must_use]
    pub fn new(value: impl Into<String>, span: Range<usize>) -> Self {
        Self {
            value: value.into(),
            span: Some(span),
            changed: false,
        }
    }

    /// Create a field whose location in the source is unknown.
    ///
    /// Detached fields can be read but edits to them are never rendered.
    #[must_use]
    pub fn detached(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            span: None,
            changed: false,
        }
    }

    /// Current value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Source span, if known.
    #[must_use]
    pub fn span(&self) -> Option<&Range<usize>> {
        self.span.as_ref()
    }

    /// Check if edits to this field reach the rendered output.
    #[must_use]
    pub fn is_editable(&self) -> bool {
        self.span.is_some()
    }

    /// Check if the value was replaced.
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Replace the value.
    pub fn set(&mut self, value: impl Into<String>) {
        let value = value.into();
        if value != self.value {
            self.value = value;
            self.changed = true;
        }
    }

    fn map_span(&mut self, map: &impl Fn(Range<usize>) -> Range<usize>) {
        if let Some(span) = self.span.take() {
            self.span = Some(map(span));
        }
    }
}

/// Whether an element sits in block or inline position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementContext {
    /// Block-level element (its own HTML/JSX block).
    Flow,
    /// Inline element inside text.
    Text,
}

/// An attribute of an HTML/JSX element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// String value; `None` for bare attributes and `{expression}` values.
    pub value: Option<Field>,
}

/// An HTML/JSX element (opening or self-closing tag).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    /// Tag name, case preserved (`img`, `Image`).
    pub name: String,
    /// Block or inline position.
    pub context: ElementContext,
    /// Attributes in source order.
    pub attributes: Vec<Attribute>,
}

impl Element {
    /// Mutable string values of every attribute with the given name.
    pub fn attribute_values_mut<'a>(
        &'a mut self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a mut Field> + 'a {
        self.attributes
            .iter_mut()
            .filter(move |attribute| attribute.name == name)
            .filter_map(|attribute| attribute.value.as_mut())
    }
}

/// Node payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Document root.
    Root,
    /// Any Markdown container without editable data (paragraph, list, ...).
    Container,
    /// Hyperlink with its target.
    Link {
        /// Link destination.
        url: Field,
    },
    /// Image with its source.
    Image {
        /// Image source.
        url: Field,
    },
    /// Module statement block (`import`/`export`).
    Esm {
        /// Raw statements.
        source: Field,
    },
    /// HTML/JSX element.
    Element(Element),
}

/// A node of the document tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Node {
    /// Node payload.
    pub kind: NodeKind,
    /// Child nodes in source order.
    pub children: Vec<Node>,
}

impl Node {
    /// Create a leaf node.
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Walk the tree depth-first in pre-order.
    ///
    /// Children of a node are visited only if the visitor returns
    /// [`Visit::Continue`] for it.
    pub fn walk<F>(&mut self, visitor: &mut F)
    where
        F: FnMut(&mut Node) -> Visit,
    {
        if visitor(self) == Visit::Continue {
            for child in &mut self.children {
                child.walk(visitor);
            }
        }
    }

    /// Collect every field of this subtree.
    pub(crate) fn collect_fields<'a>(&'a self, fields: &mut Vec<&'a Field>) {
        match &self.kind {
            NodeKind::Root | NodeKind::Container => {}
            NodeKind::Link { url } | NodeKind::Image { url } => fields.push(url),
            NodeKind::Esm { source } => fields.push(source),
            NodeKind::Element(element) => fields.extend(
                element
                    .attributes
                    .iter()
                    .filter_map(|attribute| attribute.value.as_ref()),
            ),
        }
        for child in &self.children {
            child.collect_fields(fields);
        }
    }

    /// Move every field span of this subtree through `map`.
    pub(crate) fn map_spans(&mut self, map: &impl Fn(Range<usize>) -> Range<usize>) {
        match &mut self.kind {
            NodeKind::Root | NodeKind::Container => {}
            NodeKind::Link { url } | NodeKind::Image { url } => url.map_span(map),
            NodeKind::Esm { source } => source.map_span(map),
            NodeKind::Element(element) => {
                for value in element
                    .attributes
                    .iter_mut()
                    .filter_map(|attribute| attribute.value.as_mut())
                {
                    value.map_span(map);
                }
            }
        }
        for child in &mut self.children {
            child.map_spans(map);
        }
    }
}
