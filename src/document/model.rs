//! Section tree produced by the parser.

use super::html::{self, Node};
use serde::Serialize;

/// Second-level heading unit, owned by exactly one [`Section`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subsection {
    /// `<parentSectionId>-sub-<index>`
    pub id: String,
    pub text: String,
    /// Heading markup plus everything up to the next `h1`/`h2`.
    pub html: String,
}

/// Top-level heading unit and its content span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    /// `section-<index>`
    pub id: String,
    pub text: String,
    /// Heading markup plus everything up to the next `h1`, subsections included.
    pub html: String,
    pub subsections: Vec<Subsection>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "u8")]
pub enum HeadingLevel {
    Section,
    Subsection,
}

impl From<HeadingLevel> for u8 {
    fn from(level: HeadingLevel) -> Self {
        match level {
            HeadingLevel::Section => 1,
            HeadingLevel::Subsection => 2,
        }
    }
}

/// Flat `{id, text, level}` projection of the tree, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub level: HeadingLevel,
}

/// Where a heading id lives in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingRef<'a> {
    Section(&'a Section),
    Subsection {
        parent: &'a Section,
        subsection: &'a Subsection,
    },
}

impl HeadingRef<'_> {
    /// Id of the section that owns this heading (itself for a section).
    pub fn section_id(&self) -> &str {
        match self {
            Self::Section(section) => &section.id,
            Self::Subsection { parent, .. } => &parent.id,
        }
    }
}

/// Result of parsing one document load. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedDocument {
    pub sections: Vec<Section>,
    pub headings: Vec<Heading>,
    /// Top-level nodes that make up the rendered document, heading ids applied.
    #[serde(skip)]
    pub(crate) content: Vec<Node>,
}

impl ParsedDocument {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Processed nodes backing every section's `html`, in document order.
    pub fn content(&self) -> &[Node] {
        &self.content
    }

    /// Unhighlighted document markup: all section html concatenated in order.
    pub fn base_html(&self) -> String {
        self.sections.iter().map(|s| s.html.as_str()).collect()
    }

    /// Plain text of the whole rendered document.
    pub fn text(&self) -> String {
        html::text_content(&self.content)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    /// Resolve a section or subsection id.
    pub fn find(&self, id: &str) -> Option<HeadingRef<'_>> {
        self.sections.iter().find_map(|section| {
            if section.id == id {
                return Some(HeadingRef::Section(section));
            }
            section
                .subsections
                .iter()
                .find(|sub| sub.id == id)
                .map(|subsection| HeadingRef::Subsection {
                    parent: section,
                    subsection,
                })
        })
    }

    pub fn contains_heading(&self, id: &str) -> bool {
        self.headings.iter().any(|h| h.id == id)
    }
}
