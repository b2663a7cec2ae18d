//! Flat HTML → section tree.
//!
//! Converted manuals are a flat run of block elements under `<body>`. The
//! builder walks them once, tracking the open section and subsection by index
//! into its own buffers:
//!
//! ```text
//! <h1>   → new Section        section-<n>
//! <h2>   → new Subsection     section-<n>-sub-<m>   (only inside a section)
//! other  → appended to the open section (and subsection, if any)
//! ```
//!
//! Everything before the first `<h1>` has no section and is dropped.

use super::error::DocumentError;
use super::html::{self, Element, Node};
use super::model::{Heading, HeadingLevel, ParsedDocument, Section, Subsection};

/// Marker text of the heading that precedes an embedded table of contents.
const TOC_MARKER: &str = "Contents";

/// Parse raw HTML into a section tree.
///
/// Ids are purely positional, so parsing the same text twice yields the
/// same tree. A document without `<h1>` headings parses to an empty tree.
pub fn parse_document(content: &str) -> Result<ParsedDocument, DocumentError> {
    let mut body = html::into_body(html::parse_fragment(content)?);
    remove_embedded_toc(&mut body);

    let mut builder = SectionBuilder::default();
    for node in body {
        if let Node::Element(el) = node {
            builder.push(el);
        }
    }
    Ok(builder.finish())
}

/// Drop the converter's own table of contents.
///
/// Only the first `<ul>` in the document is considered; it is removed along
/// with its previous element sibling when that sibling mentions "Contents".
fn remove_embedded_toc(nodes: &mut Vec<Node>) -> bool {
    let Some(path) = html::find_first(nodes, "ul") else {
        return false;
    };
    let Some(&index) = path.last() else {
        return false;
    };
    let Some(siblings) = html::siblings_mut(nodes, &path) else {
        return false;
    };
    let Some(prev) = siblings[..index]
        .iter()
        .rposition(|n| matches!(n, Node::Element(_)))
    else {
        return false;
    };
    if !siblings[prev].text_content().contains(TOC_MARKER) {
        return false;
    }

    siblings.remove(index);
    siblings.remove(prev);
    true
}

#[derive(Default)]
struct SectionBuilder {
    sections: Vec<Section>,
    headings: Vec<Heading>,
    content: Vec<Node>,
    current_section: Option<usize>,
    current_subsection: Option<usize>,
}

impl SectionBuilder {
    fn push(&mut self, mut el: Element) {
        match (el.name.as_str(), self.current_section) {
            ("h1", _) => {
                let id = format!("section-{}", self.sections.len());
                el.set_attr("id", id.as_str());
                let text = el.text_content().trim().to_owned();

                self.headings.push(Heading {
                    id: id.clone(),
                    text: text.clone(),
                    level: HeadingLevel::Section,
                });
                self.sections.push(Section {
                    id,
                    text,
                    html: el.outer_html(),
                    subsections: Vec::new(),
                });
                self.current_section = Some(self.sections.len() - 1);
                self.current_subsection = None;
            }
            ("h2", Some(si)) => {
                let section = &mut self.sections[si];
                let id = format!("{}-sub-{}", section.id, section.subsections.len());
                el.set_attr("id", id.as_str());
                let text = el.text_content().trim().to_owned();
                let markup = el.outer_html();

                section.html.push_str(&markup);
                section.subsections.push(Subsection {
                    id: id.clone(),
                    text: text.clone(),
                    html: markup,
                });
                self.current_subsection = Some(section.subsections.len() - 1);
                self.headings.push(Heading {
                    id,
                    text,
                    level: HeadingLevel::Subsection,
                });
            }
            (_, Some(si)) => {
                let markup = el.outer_html();
                let section = &mut self.sections[si];
                if let Some(sub) = self.current_subsection {
                    section.subsections[sub].html.push_str(&markup);
                }
                section.html.push_str(&markup);
            }
            // No open section yet
            (_, None) => return,
        }
        self.content.push(Node::Element(el));
    }

    fn finish(self) -> ParsedDocument {
        ParsedDocument {
            sections: self.sections,
            headings: self.headings,
            content: self.content,
        }
    }
}
