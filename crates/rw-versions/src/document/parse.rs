//! Markdown/MDX to document tree conversion.
//!
//! Built on `pulldown-cmark` offset events. Raw HTML is scanned for elements.
//! In MDX, top-level paragraphs starting with `import`/`export` become ESM
//! nodes, and Markdown inside component blocks is parsed as well.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use super::Syntax;
use super::element::{scan_elements, scan_elements_with};
use super::tree::{ElementContext, Field, Node, NodeKind};

/// Parser options for document bodies.
pub(crate) fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_GFM
}

/// Locate a YAML frontmatter block at the start of `source`.
///
/// Returns the span of the YAML content (between the fences) and the offset
/// where the body starts.
pub(crate) fn split_frontmatter(source: &str) -> Option<(Range<usize>, usize)> {
    let first_line_end = source.find('\n')?;
    if source[..first_line_end].trim_end_matches('\r') != "---" {
        return None;
    }

    let content_start = first_line_end + 1;
    let mut line_start = content_start;
    for line in source[content_start..].split_inclusive('\n') {
        let fence = line.trim_end_matches(['\n', '\r']);
        if fence == "---" || fence == "..." {
            return Some((content_start..line_start, line_start + line.len()));
        }
        line_start += line.len();
    }

    None
}

/// Check if a paragraph holds module statements.
fn is_esm(text: &str) -> bool {
    ["import", "export"].iter().any(|keyword| {
        text.strip_prefix(keyword)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_whitespace() || c == '{' || c == '*')
    })
}

/// Find the destination of a link or image inside its source span.
///
/// Reference-style links and destinations containing escapes can't be
/// located; they become detached fields.
fn locate_destination(body: &str, range: &Range<usize>, dest: &str, offset: usize) -> Field {
    let text = &body[range.clone()];
    if !dest.is_empty() {
        for (index, _) in text.rmatch_indices("](") {
            let after = index + 2;
            let rest = &text[after..];
            let trimmed = rest.trim_start();
            let mut start = after + (rest.len() - trimmed.len());
            let candidate = match trimmed.strip_prefix('<') {
                Some(inner) => {
                    start += 1;
                    inner
                }
                None => trimmed,
            };
            if candidate.starts_with(dest) {
                let start = offset + range.start + start;
                return Field::new(dest, start..start + dest.len());
            }
        }
    }
    Field::detached(dest)
}

/// Tree builder state.
struct TreeBuilder {
    stack: Vec<Node>,
    /// Inside an ESM paragraph; its events are not modelled.
    in_esm: bool,
    /// Source span of the HTML block being collected.
    html_block: Option<Range<usize>>,
}

impl TreeBuilder {
    fn new() -> Self {
        Self {
            stack: vec![Node::new(NodeKind::Root)],
            in_esm: false,
            html_block: None,
        }
    }

    fn push(&mut self, kind: NodeKind) {
        self.stack.push(Node::new(kind));
    }

    fn attach(&mut self, node: Node) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        }
    }

    fn pop(&mut self) {
        if self.stack.len() > 1
            && let Some(node) = self.stack.pop()
        {
            self.attach(node);
        }
    }

    fn finish(mut self) -> Node {
        while self.stack.len() > 1 {
            self.pop();
        }
        self.stack
            .pop()
            .unwrap_or_else(|| Node::new(NodeKind::Root))
    }
}

/// Parse a document body located at `offset` in the full source.
pub(crate) fn parse_body(body: &str, offset: usize, syntax: Syntax) -> Node {
    parse_tree(body, offset, syntax, true)
}

/// Parse Markdown nested in an MDX component or an indented block.
///
/// MDX has no indented code, so the common indentation of the text is
/// removed first and spans are mapped back to the original lines.
fn parse_fragment(text: &str, offset: usize) -> Vec<Node> {
    let indent = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(indentation)
        .min()
        .unwrap_or(0);
    if indent == 0 {
        return parse_tree(text, offset, Syntax::Mdx, false).children;
    }

    // (start in dedented text, start in `text`) of every line
    let mut lines = Vec::new();
    let mut dedented = String::with_capacity(text.len());
    let mut original = 0;
    for line in text.split_inclusive('\n') {
        let strip = indentation(line).min(indent);
        lines.push((dedented.len(), original + strip));
        dedented.push_str(&line[strip..]);
        original += line.len();
    }

    let position = |pos: usize| {
        let index = lines
            .partition_point(|&(start, _)| start <= pos)
            .saturating_sub(1);
        let (dedented_start, original_start) = lines.get(index).copied().unwrap_or((0, 0));
        offset + original_start + (pos - dedented_start)
    };

    let mut root = parse_tree(&dedented, 0, Syntax::Mdx, false);
    root.map_spans(&|span: Range<usize>| {
        if span.is_empty() {
            let start = position(span.start);
            start..start
        } else {
            position(span.start)..position(span.end - 1) + 1
        }
    });
    root.children
}

/// Leading spaces and tabs of a line.
fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches([' ', '\t']).len()
}

/// Start of the line holding `pos`, if only indentation precedes `pos`.
fn indented_line_start(body: &str, pos: usize) -> Option<usize> {
    let line_start = body[..pos].rfind('\n').map_or(0, |i| i + 1);
    body[line_start..pos]
        .chars()
        .all(|c| c == ' ' || c == '\t')
        .then_some(line_start)
}

fn parse_tree(body: &str, offset: usize, syntax: Syntax, top_level: bool) -> Node {
    let mdx = syntax == Syntax::Mdx;
    let mut builder = TreeBuilder::new();

    for (event, range) in Parser::new_ext(body, parser_options()).into_offset_iter() {
        if builder.in_esm {
            if matches!(event, Event::End(TagEnd::Paragraph)) {
                builder.in_esm = false;
            }
            continue;
        }

        match event {
            Event::Start(Tag::Paragraph)
                if mdx
                    && top_level
                    && builder.stack.len() == 1
                    && is_esm(&body[range.clone()]) =>
            {
                let span = offset + range.start..offset + range.end;
                builder.attach(Node::new(NodeKind::Esm {
                    source: Field::new(&body[range], span),
                }));
                builder.in_esm = true;
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                let url = locate_destination(body, &range, &dest_url, offset);
                builder.push(NodeKind::Link { url });
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                let url = locate_destination(body, &range, &dest_url, offset);
                builder.push(NodeKind::Image { url });
            }
            Event::Start(Tag::HtmlBlock) => {
                builder.html_block = Some(range.start..range.start);
                builder.push(NodeKind::Container);
            }
            Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)) if mdx => {
                let top = builder.stack.len() == 1;
                builder.push(NodeKind::Container);
                if top && let Some(start) = indented_line_start(body, range.start) {
                    let block = start..range.end;
                    for node in parse_fragment(&body[block.clone()], offset + block.start) {
                        builder.attach(node);
                    }
                }
            }
            Event::Start(_) => builder.push(NodeKind::Container),
            Event::Html(_) => {
                if let Some(block) = builder.html_block.as_mut() {
                    block.start = block.start.min(range.start);
                    block.end = block.end.max(range.end);
                }
            }
            Event::End(TagEnd::HtmlBlock) => {
                if let Some(block) = builder.html_block.take() {
                    let html = &body[block.clone()];
                    let html_offset = offset + block.start;
                    let elements = if mdx {
                        scan_elements_with(html, html_offset, ElementContext::Flow, parse_fragment)
                    } else {
                        scan_elements(html, html_offset, ElementContext::Flow)
                    };
                    for element in elements {
                        builder.attach(element);
                    }
                }
                builder.pop();
            }
            Event::End(_) => builder.pop(),
            Event::InlineHtml(_) => {
                for element in scan_elements(&body[range.clone()], offset + range.start, ElementContext::Text) {
                    builder.attach(element);
                }
            }
            _ => {}
        }
    }

    builder.finish()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::Visit;

    fn kinds(node: &Node, out: &mut Vec<String>) {
        let label = match &node.kind {
            NodeKind::Root | NodeKind::Container => None,
            NodeKind::Link { url } => Some(format!("link {}", url.value())),
            NodeKind::Image { url } => Some(format!("image {}", url.value())),
            NodeKind::Esm { source } => Some(format!("esm {}", source.value().trim())),
            NodeKind::Element(element) => Some(format!("element {}", element.name)),
        };
        out.extend(label);
        for child in &node.children {
            kinds(child, out);
        }
    }

    fn summary(source: &str) -> Vec<String> {
        summary_as(source, Syntax::Mdx)
    }

    fn summary_as(source: &str, syntax: Syntax) -> Vec<String> {
        let mut out = Vec::new();
        kinds(&parse_body(source, 0, syntax), &mut out);
        out
    }

    fn link_spans(root: &mut Node) -> Vec<Option<Range<usize>>> {
        let mut spans = Vec::new();
        root.walk(&mut |node| {
            if let NodeKind::Link { url } | NodeKind::Image { url } = &node.kind {
                spans.push(url.span().cloned());
            }
            Visit::Continue
        });
        spans
    }

    #[test]
    fn test_split_frontmatter() {
        let source = "---\ntitle: Test\n---\n# Body\n";

        let (span, body_start) = split_frontmatter(source).unwrap();

        assert_eq!(&source[span], "title: Test\n");
        assert_eq!(&source[body_start..], "# Body\n");
    }

    #[test]
    fn test_split_frontmatter_empty_block() {
        let source = "---\n---\nBody";

        let (span, body_start) = split_frontmatter(source).unwrap();

        assert_eq!(span, 4..4);
        assert_eq!(&source[body_start..], "Body");
    }

    #[test]
    fn test_split_frontmatter_absent() {
        assert!(split_frontmatter("# Title\n---\n").is_none());
        assert!(split_frontmatter("---\ntitle: unterminated\n").is_none());
    }

    #[test]
    fn test_parse_links_and_images() {
        let nodes = summary("See [guide](/guides/) and ![logo](../assets/logo.png \"Logo\").");

        assert_eq!(nodes, vec!["link /guides/", "image ../assets/logo.png"]);
    }

    #[test]
    fn test_parse_link_spans() {
        let source = "[`/guides/`](/guides/)";
        let mut root = parse_body(source, 0, Syntax::Mdx);

        let mut spans = Vec::new();
        root.walk(&mut |node| {
            if let NodeKind::Link { url } = &node.kind {
                spans.push(url.span().cloned());
            }
            Visit::Continue
        });

        let span = spans[0].clone().unwrap();
        assert_eq!(span, 13..21);
        assert_eq!(&source[span], "/guides/");
    }

    #[test]
    fn test_parse_reference_link_is_detached() {
        let mut root = parse_body("[guide][ref]\n\n[ref]: /guides/\n", 0, Syntax::Mdx);

        let mut editable = Vec::new();
        root.walk(&mut |node| {
            if let NodeKind::Link { url } = &node.kind {
                editable.push(url.is_editable());
            }
            Visit::Continue
        });

        assert_eq!(editable, vec![false]);
    }

    #[test]
    fn test_parse_esm_paragraph() {
        let nodes = summary("import { Card } from '@astrojs/starlight/components';\nimport logo from '../assets/logo.png';\n\nText\n");

        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].starts_with("esm import { Card }"));
    }

    #[test]
    fn test_parse_import_word_in_text_is_not_esm() {
        let nodes = summary("important [link](/a/)\n");

        assert_eq!(nodes, vec!["link /a/"]);
    }

    #[test]
    fn test_parse_html_block_elements() {
        let nodes = summary("Intro\n\n<img src=\"/a.png\" />\n\nOutro <a href=\"/b/\">b</a>\n");

        assert_eq!(nodes, vec!["element img", "element a"]);
    }

    #[test]
    fn test_parse_code_block_is_opaque() {
        let nodes = summary("```md\n[link](/a/)\n<img src=\"/a.png\" />\n```\n");

        assert!(nodes.is_empty());
    }

    #[test]
    fn test_parse_offsets_shifted() {
        let mut root = parse_body("[a](/a/)", 10, Syntax::Mdx);

        let mut spans = Vec::new();
        root.walk(&mut |node| {
            if let NodeKind::Link { url } = &node.kind {
                spans.push(url.span().cloned());
            }
            Visit::Continue
        });

        assert_eq!(spans, vec![Some(14..17)]);
    }

    #[test]
    fn test_parse_esm_only_in_mdx() {
        let nodes = summary_as("import the [data](/data/) first.\n", Syntax::Markdown);

        assert_eq!(nodes, vec!["link /data/"]);
    }

    #[test]
    fn test_parse_mdx_component_content() {
        let nodes = summary(
            "<Card title=\"Links\">\n  See [the guide](/guides/) and ![x](/x.png).\n</Card>\n",
        );

        assert_eq!(nodes, vec!["element Card", "link /guides/", "image /x.png"]);
    }

    #[test]
    fn test_parse_mdx_nested_components() {
        let source = "<Tabs>\n  <TabItem label=\"npm\">\n    Run [install](/install/).\n  </TabItem>\n  <TabItem label=\"pnpm\">\n    See [pnpm](/pnpm/).\n  </TabItem>\n</Tabs>\n";
        let mut root = parse_body(source, 0, Syntax::Mdx);

        let mut out = Vec::new();
        kinds(&root, &mut out);
        assert_eq!(
            out,
            vec![
                "element Tabs",
                "element TabItem",
                "link /install/",
                "element TabItem",
                "link /pnpm/",
            ]
        );

        let spans = link_spans(&mut root);
        let texts: Vec<&str> = spans
            .iter()
            .map(|span| &source[span.clone().unwrap()])
            .collect();
        assert_eq!(texts, vec!["/install/", "/pnpm/"]);
    }

    #[test]
    fn test_parse_mdx_component_content_spans() {
        let source = "<Aside>\n  First [a](/a/)\n  then ![b](/b.png)\n</Aside>\n";
        let mut root = parse_body(source, 0, Syntax::Mdx);

        let spans = link_spans(&mut root);
        assert_eq!(spans.len(), 2);
        assert_eq!(&source[spans[0].clone().unwrap()], "/a/");
        assert_eq!(&source[spans[1].clone().unwrap()], "/b.png");
    }

    #[test]
    fn test_parse_mdx_indented_content() {
        let source = "<Aside>\n\n    Read [the guide](/guides/).\n\n</Aside>\n";
        let mut root = parse_body(source, 0, Syntax::Mdx);

        let spans = link_spans(&mut root);
        assert_eq!(spans.len(), 1);
        assert_eq!(&source[spans[0].clone().unwrap()], "/guides/");
    }

    #[test]
    fn test_parse_markdown_html_block_content_is_opaque() {
        let nodes = summary_as("<div>\n  See [the guide](/guides/).\n</div>\n", Syntax::Markdown);

        assert_eq!(nodes, vec!["element div"]);
    }

    #[test]
    fn test_parse_mdx_comment_content_is_skipped() {
        let nodes = summary("<Card>\n  <!-- [old](/old/) -->\n  [new](/new/)\n</Card>\n");

        assert_eq!(nodes, vec!["element Card", "link /new/"]);
    }
}
