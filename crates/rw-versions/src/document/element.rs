//! HTML/JSX element scanner.
//!
//! Markdown parsers hand raw HTML over as opaque strings. This scanner finds
//! the tags inside such a string, nests them by their closing tags and records
//! the span of every quoted attribute value.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::tree::{Attribute, Element, ElementContext, Field, Node, NodeKind};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"<(/?)([A-Za-z][\w.:-]*)((?:\s+[^\s"'<>/=]+(?:\s*=\s*(?:"[^"]*"|'[^']*'|\{[^{}]*\}|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .expect("invalid tag regex")
});

static ATTRIBUTE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|(\{[^{}]*\})|([^\s"'=<>`]+)))?"#,
    )
    .expect("invalid attribute regex")
});

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("invalid comment regex"));

/// Elements that never have children.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
    "source", "track", "wbr",
];

/// Scan `html` (located at `offset` in the document) for elements.
///
/// Returns top-level element nodes; elements opened inside another element
/// become its children. Unclosed elements are closed at the end of `html`.
pub(crate) fn scan_elements(html: &str, offset: usize, context: ElementContext) -> Vec<Node> {
    scan_elements_with(html, offset, context, |_, _| Vec::new())
}

/// Scan `html` for elements, handing the text between tags to `content`.
///
/// `content` receives each non-blank run of text outside tags and comments
/// with its document offset. The nodes it returns are attached to the
/// innermost element open at that point. Text of a fragment without any tag
/// or comment is not handed over.
pub(crate) fn scan_elements_with<F>(
    html: &str,
    offset: usize,
    context: ElementContext,
    mut content: F,
) -> Vec<Node>
where
    F: FnMut(&str, usize) -> Vec<Node>,
{
    let comments: Vec<Range<usize>> = COMMENT_RE.find_iter(html).map(|m| m.range()).collect();
    let has_markup = !comments.is_empty() || TAG_RE.is_match(html);

    let mut stack = vec![Node::new(NodeKind::Container)];
    let mut cursor = 0;

    let mut emit = |stack: &mut Vec<Node>, text: Range<usize>| {
        if !has_markup {
            return;
        }
        for piece in outside(text, &comments) {
            if !html[piece.clone()].trim().is_empty() {
                for node in content(&html[piece.clone()], offset + piece.start) {
                    attach(stack, node);
                }
            }
        }
    };

    for caps in TAG_RE.captures_iter(html) {
        let Some(tag) = caps.get(0) else { continue };
        if comments.iter().any(|comment| comment.contains(&tag.start())) {
            continue;
        }
        emit(&mut stack, cursor..tag.start());
        cursor = tag.end();

        let name = &caps[2];
        if !caps[1].is_empty() {
            close_element(&mut stack, name);
            continue;
        }

        let attributes = caps
            .get(3)
            .map(|m| parse_attributes(m.as_str(), offset + m.start()))
            .unwrap_or_default();
        let node = Node::new(NodeKind::Element(Element {
            name: name.to_owned(),
            context,
            attributes,
        }));

        let self_closing = !caps[4].is_empty()
            || VOID_ELEMENTS
                .iter()
                .any(|void| void.eq_ignore_ascii_case(name));
        if self_closing {
            attach(&mut stack, node);
        } else {
            stack.push(node);
        }
    }
    emit(&mut stack, cursor..html.len());

    while stack.len() > 1 {
        pop_into_parent(&mut stack);
    }
    stack.pop().map(|root| root.children).unwrap_or_default()
}

/// Parts of `text` not covered by any of `comments` (sorted, disjoint).
fn outside(text: Range<usize>, comments: &[Range<usize>]) -> Vec<Range<usize>> {
    let mut pieces = Vec::new();
    let mut start = text.start;
    for comment in comments {
        if comment.end <= start || comment.start >= text.end {
            continue;
        }
        if comment.start > start {
            pieces.push(start..comment.start);
        }
        start = comment.end;
    }
    if start < text.end {
        pieces.push(start..text.end);
    }
    pieces
}

fn attach(stack: &mut [Node], node: Node) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

fn pop_into_parent(stack: &mut Vec<Node>) {
    if let Some(node) = stack.pop() {
        attach(stack, node);
    }
}

/// Close the innermost open element named `name`; stray closing tags are ignored.
fn close_element(stack: &mut Vec<Node>, name: &str) {
    let open = stack
        .iter()
        .rposition(|node| matches!(&node.kind, NodeKind::Element(element) if element.name == name));

    if let Some(position) = open.filter(|&position| position > 0) {
        while stack.len() > position {
            pop_into_parent(stack);
        }
    }
}

fn parse_attributes(source: &str, offset: usize) -> Vec<Attribute> {
    ATTRIBUTE_RE
        .captures_iter(source)
        .map(|caps| {
            let value = [2, 3, 5]
                .into_iter()
                .find_map(|group| caps.get(group))
                .map(|m| Field::new(m.as_str(), offset + m.start()..offset + m.end()));
            Attribute {
                name: caps[1].to_owned(),
                value,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn element(node: &Node) -> &Element {
        match &node.kind {
            NodeKind::Element(element) => element,
            other => panic!("expected element, got {other:?}"),
        }
    }

    fn value<'a>(element: &'a Element, name: &str) -> Option<&'a Field> {
        element
            .attributes
            .iter()
            .find(|attribute| attribute.name == name)
            .and_then(|attribute| attribute.value.as_ref())
    }

    #[test]
    fn test_scan_self_closing_with_spans() {
        let html = r#"<img src="/a.png" alt='A' />"#;

        let nodes = scan_elements(html, 100, ElementContext::Flow);

        assert_eq!(nodes.len(), 1);
        let img = element(&nodes[0]);
        assert_eq!(img.name, "img");
        let src = value(img, "src").unwrap();
        assert_eq!(src.value(), "/a.png");
        let span = src.span().unwrap().clone();
        assert_eq!(&html[span.start - 100..span.end - 100], "/a.png");
        assert_eq!(value(img, "alt").unwrap().value(), "A");
    }

    #[test]
    fn test_scan_nests_children() {
        let html = "<video controls>\n  <source src=\"/v.mp4\" type=\"video/mp4\">\n</video>";

        let nodes = scan_elements(html, 0, ElementContext::Flow);

        assert_eq!(nodes.len(), 1);
        assert_eq!(element(&nodes[0]).name, "video");
        assert_eq!(nodes[0].children.len(), 1);
        assert_eq!(element(&nodes[0].children[0]).name, "source");
        assert!(value(element(&nodes[0]), "controls").is_none());
    }

    #[test]
    fn test_scan_expression_value_is_not_string() {
        let nodes = scan_elements("<Image src={logo} alt=\"Logo\" />", 0, ElementContext::Flow);

        let image = element(&nodes[0]);
        assert_eq!(image.name, "Image");
        assert!(value(image, "src").is_none());
        assert_eq!(value(image, "alt").unwrap().value(), "Logo");
    }

    #[test]
    fn test_scan_ignores_comments() {
        let nodes = scan_elements("<!-- <img src=\"/a.png\"> -->", 0, ElementContext::Flow);

        assert!(nodes.is_empty());
    }

    #[test]
    fn test_scan_unclosed_and_stray_closing() {
        let nodes = scan_elements("</div><a href=\"/x/\">", 0, ElementContext::Text);

        assert_eq!(nodes.len(), 1);
        let anchor = element(&nodes[0]);
        assert_eq!(anchor.context, ElementContext::Text);
        assert_eq!(value(anchor, "href").unwrap().value(), "/x/");
    }

    #[test]
    fn test_scan_with_hands_over_text_between_tags() {
        let html = "<Card>\n  intro <!-- note -->\n  outro\n</Card><br />tail";
        let mut pieces = Vec::new();

        let nodes = scan_elements_with(html, 10, ElementContext::Flow, |text, offset| {
            pieces.push((text.to_owned(), offset));
            vec![Node::new(NodeKind::Container)]
        });

        assert_eq!(
            pieces,
            vec![
                ("\n  intro ".to_owned(), 16),
                ("\n  outro\n".to_owned(), 38),
                ("tail".to_owned(), 60),
            ]
        );
        assert_eq!(nodes.len(), 3);
        assert_eq!(element(&nodes[0]).name, "Card");
        assert_eq!(nodes[0].children.len(), 2);
        assert_eq!(element(&nodes[1]).name, "br");
        assert_eq!(nodes[2].kind, NodeKind::Container);
    }

    #[test]
    fn test_scan_with_plain_text_is_not_handed_over() {
        let mut calls = 0;

        let nodes = scan_elements_with("just text", 0, ElementContext::Flow, |_, _| {
            calls += 1;
            Vec::new()
        });

        assert!(nodes.is_empty());
        assert_eq!(calls, 0);
    }
}
