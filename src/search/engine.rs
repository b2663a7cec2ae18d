//! Section/subsection search over a parsed document.
//!
//! Searchable text is built once per load: for every section and subsection,
//! `normalize(heading + " " + text of html)`. A query matches a unit when
//! every query term is a substring of that text.

use super::highlight::highlight;
use super::normalize::{normalize, query_terms};
use crate::document::html::{self, Node};
use crate::document::{HeadingLevel, ParsedDocument, Section, Subsection};
use serde::Serialize;
use std::sync::Arc;

/// Back-reference from a subsection hit to its owning section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRef {
    pub id: String,
    pub text: String,
}

/// One search hit, section (level 1) or subsection (level 2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub text: String,
    pub html: String,
    /// Only populated for level 1 hits.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subsections: Vec<Subsection>,
    pub level: HeadingLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentRef>,
}

impl SearchResult {
    fn section(section: &Section) -> Self {
        Self {
            id: section.id.clone(),
            text: section.text.clone(),
            html: section.html.clone(),
            subsections: section.subsections.clone(),
            level: HeadingLevel::Section,
            parent: None,
        }
    }

    fn subsection(parent: &Section, sub: &Subsection) -> Self {
        Self {
            id: sub.id.clone(),
            text: sub.text.clone(),
            html: sub.html.clone(),
            subsections: Vec::new(),
            level: HeadingLevel::Subsection,
            parent: Some(ParentRef {
                id: parent.id.clone(),
                text: parent.text.clone(),
            }),
        }
    }

    pub fn is_top_level(&self) -> bool {
        self.level == HeadingLevel::Section
    }

    pub fn has_subsections(&self) -> bool {
        !self.subsections.is_empty()
    }
}

/// Results plus the whole document re-rendered with matches marked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput {
    pub results: Vec<SearchResult>,
    pub highlighted_html: String,
}

/// Results the collapsed sidebar lists while a query is active.
pub fn top_level(results: &[SearchResult]) -> impl Iterator<Item = &SearchResult> {
    results.iter().filter(|r| r.is_top_level())
}

#[derive(Debug)]
struct IndexedSection {
    text: String,
    subsections: Vec<String>,
}

/// Normalized searchable text of every unit, computed once per load.
#[derive(Debug)]
pub struct SearchIndex {
    doc: Arc<ParsedDocument>,
    sections: Vec<IndexedSection>,
}

impl SearchIndex {
    pub fn new(doc: Arc<ParsedDocument>) -> Self {
        let sections = doc
            .sections
            .iter()
            .map(|section| IndexedSection {
                text: searchable_text(&section.text, &section.html),
                subsections: section
                    .subsections
                    .iter()
                    .map(|sub| searchable_text(&sub.text, &sub.html))
                    .collect(),
            })
            .collect();
        Self { doc, sections }
    }

    pub fn document(&self) -> &Arc<ParsedDocument> {
        &self.doc
    }

    /// Matching units in document order: each section slot first, then its
    /// matching subsections (even if the section itself did not match).
    pub fn search(&self, query: &str) -> Vec<SearchResult> {
        let terms = query_terms(query);
        self.search_terms(&terms)
    }

    fn search_terms(&self, terms: &[String]) -> Vec<SearchResult> {
        if terms.is_empty() {
            return Vec::new();
        }
        let matches = |text: &str| terms.iter().all(|t| text.contains(t.as_str()));

        let mut results = Vec::new();
        for (section, indexed) in self.doc.sections.iter().zip(&self.sections) {
            if matches(&indexed.text) {
                results.push(SearchResult::section(section));
            }
            for (sub, text) in section.subsections.iter().zip(&indexed.subsections) {
                if matches(text) {
                    results.push(SearchResult::subsection(section, sub));
                }
            }
        }
        results
    }
}

fn searchable_text(heading: &str, markup: &str) -> String {
    // Section html is our own serializer's output, so this parse only fails
    // if that invariant breaks; fall back to the heading alone then.
    let body = html::parse_fragment(markup)
        .map(|nodes: Vec<Node>| html::text_content(&nodes))
        .unwrap_or_default();
    normalize(&format!("{heading} {body}"))
}

/// Index plus highlighting: one entry point per keystroke.
#[derive(Debug)]
pub struct SearchEngine {
    index: SearchIndex,
}

impl SearchEngine {
    pub fn new(doc: Arc<ParsedDocument>) -> Self {
        Self {
            index: SearchIndex::new(doc),
        }
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn run(&self, query: &str) -> SearchOutput {
        let terms = query_terms(query);
        SearchOutput {
            results: self.index.search_terms(&terms),
            highlighted_html: highlight(self.index.document(), &terms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    const MANUAL: &str = "<h1>Overview</h1><p>General operating notes.</p>\
                          <h1>Alerts</h1><p>Alert lamps on the panel.</p>\
                          <h2>Red Alerts</h2><p>Red light: stop the engine.</p>\
                          <h2>Amber Alerts</h2><p>Caution, continue with care.</p>";

    fn engine(src: &str) -> SearchEngine {
        SearchEngine::new(Arc::new(parse_document(src).unwrap()))
    }

    fn ids(results: &[SearchResult]) -> Vec<&str> {
        results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_empty_query_no_results_base_html() {
        let engine = engine(MANUAL);
        for query in ["", "   ", "?!"] {
            let out = engine.run(query);
            assert!(out.results.is_empty());
            assert_eq!(out.highlighted_html, engine.index().document().base_html());
        }
    }

    #[test]
    fn test_all_terms_must_match() {
        let engine = engine(MANUAL);
        let results = engine.index().search("red light");
        // Section slot first, then its subsection
        assert_eq!(ids(&results), ["section-1", "section-1-sub-0"]);

        let results = engine.index().search("red caution");
        assert_eq!(ids(&results), ["section-1"]);
    }

    #[test]
    fn test_term_order_irrelevant() {
        let engine = engine(MANUAL);
        assert_eq!(
            engine.index().search("light red"),
            engine.index().search("red light")
        );
    }

    #[test]
    fn test_heading_text_is_searchable() {
        let engine = engine(MANUAL);
        assert_eq!(ids(&engine.index().search("overview")), ["section-0"]);
    }

    #[test]
    fn test_substring_match_within_word() {
        let engine = engine(MANUAL);
        assert_eq!(ids(&engine.index().search("operat")), ["section-0"]);
    }

    #[test]
    fn test_punctuation_normalized() {
        let engine = engine(MANUAL);
        assert_eq!(
            engine.index().search("RED-LIGHT!!"),
            engine.index().search("red light")
        );
    }

    #[test]
    fn test_no_match() {
        let out = engine(MANUAL).run("hydraulic");
        assert!(out.results.is_empty());
        assert!(!out.highlighted_html.contains("<mark>"));
    }

    #[test]
    fn test_amber_subsection_result_and_sidebar_filter() {
        let out = engine(MANUAL).run("amber");

        let sub = out
            .results
            .iter()
            .find(|r| r.id == "section-1-sub-1")
            .unwrap();
        assert_eq!(sub.text, "Amber Alerts");
        assert_eq!(sub.level, HeadingLevel::Subsection);
        assert_eq!(
            sub.parent,
            Some(ParentRef {
                id: "section-1".into(),
                text: "Alerts".into()
            })
        );
        assert!(!out.results.iter().any(|r| r.id == "section-0"));
        assert!(!out.results.iter().any(|r| r.id == "section-1-sub-0"));

        // The parent span contains the subsection markup, so it matches too
        let listed: Vec<_> = top_level(&out.results).map(|r| r.id.as_str()).collect();
        assert_eq!(listed, ["section-1"]);

        assert!(out.highlighted_html.contains("<mark>Amber</mark> Alerts"));
        assert!(!out.highlighted_html.contains("<mark>Alerts"));
    }

    #[test]
    fn test_subsection_only_match_lists_nothing_top_level() {
        let results = vec![SearchResult {
            id: "section-1-sub-1".into(),
            text: "Amber Alerts".into(),
            html: String::new(),
            subsections: Vec::new(),
            level: HeadingLevel::Subsection,
            parent: Some(ParentRef {
                id: "section-1".into(),
                text: "Alerts".into(),
            }),
        }];
        assert_eq!(top_level(&results).count(), 0);
    }

    #[test]
    fn test_results_serialize_with_level_and_parent() {
        let out = engine(MANUAL).run("amber");
        let json = serde_json::to_value(&out).unwrap();
        assert!(json["highlightedHtml"].is_string());
        let sub = json["results"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["id"] == "section-1-sub-1")
            .unwrap();
        assert_eq!(sub["level"], 2);
        assert_eq!(sub["parent"]["id"], "section-1");

        let top = &json["results"][0];
        assert_eq!(top["level"], 1);
        assert!(top.get("parent").is_none());
        assert_eq!(top["subsections"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_non_ascii_heading_result_is_highlighted() {
        let out = engine("<h1>Café Menu</h1><p>Espresso.</p><h1>Tea</h1>").run("café");
        assert_eq!(ids(&out.results), ["section-0"]);
        assert!(out.highlighted_html.contains("<mark>Caf</mark>é Menu"));
    }

    #[test]
    fn test_empty_document() {
        let out = engine("<p>no headings</p>").run("headings");
        assert!(out.results.is_empty());
        assert_eq!(out.highlighted_html, "");
    }
}
