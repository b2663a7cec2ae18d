//! In-place match highlighting as a pure tree rewrite.
//!
//! The base document nodes are never touched: every text node is split
//! around matches into new nodes, so the highlighted tree and the base tree
//! share nothing mutable. Only text nodes are subdivided; elements,
//! attributes and comments are carried over as they are.

use crate::document::ParsedDocument;
use crate::document::html::{self, Element, Node};
use crate::log;
use regex::{Regex, RegexBuilder};

/// Wrapper element for a matched term.
pub const MARK_TAG: &str = "mark";

/// Elements whose text is not rendered as prose.
const SKIP_ELEMENTS: &[&str] = &["script", "style"];

/// Case-insensitive, word-bounded alternation of the (escaped) terms.
///
/// Word boundaries and case folding are ASCII-only, matching the ASCII
/// normalization of the index: for "café" the term is `caf`, which must
/// still highlight inside "Café".
///
/// Returns `Ok(None)` when there is nothing to match.
pub fn build_pattern(terms: &[String]) -> Result<Option<Regex>, regex::Error> {
    if terms.is_empty() {
        return Ok(None);
    }
    let alternation = terms
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
        .unicode(false)
        .case_insensitive(true)
        .build()
        .map(Some)
}

/// Render the whole document with every term occurrence wrapped in `<mark>`.
///
/// With no terms the result is exactly [`ParsedDocument::base_html`].
pub fn highlight(doc: &ParsedDocument, terms: &[String]) -> String {
    match build_pattern(terms) {
        Ok(Some(pattern)) => html::serialize(&highlight_nodes(doc.content(), &pattern)),
        Ok(None) => doc.base_html(),
        Err(err) => {
            log!("search"; "highlight disabled: {err}");
            doc.base_html()
        }
    }
}

pub fn highlight_nodes(nodes: &[Node], pattern: &Regex) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Text(text) => match split_text(text, pattern) {
                Some(parts) => out.extend(parts),
                None => out.push(node.clone()),
            },
            Node::Element(el) if !SKIP_ELEMENTS.contains(&el.name.as_str()) => {
                out.push(Node::Element(Element {
                    name: el.name.clone(),
                    attrs: el.attrs.clone(),
                    children: highlight_nodes(&el.children, pattern),
                }));
            }
            _ => out.push(node.clone()),
        }
    }
    out
}

/// Split one text node around matches; `None` if nothing matched.
fn split_text(text: &str, pattern: &Regex) -> Option<Vec<Node>> {
    let mut parts = Vec::new();
    let mut last = 0;

    for found in pattern.find_iter(text) {
        if found.start() > last {
            parts.push(Node::Text(text[last..found.start()].to_owned()));
        }
        let mut mark = Element::new(MARK_TAG);
        mark.children.push(Node::Text(found.as_str().to_owned()));
        parts.push(Node::Element(mark));
        last = found.end();
    }

    if parts.is_empty() {
        return None;
    }
    if last < text.len() {
        parts.push(Node::Text(text[last..].to_owned()));
    }
    Some(parts)
}
