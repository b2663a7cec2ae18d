//! Sidebar list and click policy.
//!
//! Outside search the sidebar lists every section; with a query it lists only
//! the top-level hits. A section with subsections needs two clicks to
//! navigate: the first expands it.

use super::expansion::ExpansionTracker;
use crate::document::{ParsedDocument, Subsection};
use crate::search::{SearchResult, top_level};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SidebarAction {
    Navigate(String),
    Expand(String),
}

pub fn click_section(
    section_id: &str,
    has_subsections: bool,
    expansion: &ExpansionTracker,
) -> SidebarAction {
    if has_subsections && !expansion.is_expanded(section_id) {
        SidebarAction::Expand(section_id.to_owned())
    } else {
        SidebarAction::Navigate(section_id.to_owned())
    }
}

pub fn click_subsection(subsection_id: &str) -> SidebarAction {
    SidebarAction::Navigate(subsection_id.to_owned())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SidebarItem {
    pub id: String,
    pub text: String,
    pub has_subsections: bool,
    pub expanded: bool,
    pub active: bool,
    /// Empty unless expanded.
    pub subsections: Vec<SidebarSubItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarSubItem {
    pub id: String,
    pub text: String,
    pub active: bool,
}

fn item(
    id: &str,
    text: &str,
    subsections: &[Subsection],
    expansion: &ExpansionTracker,
    active: Option<&str>,
) -> SidebarItem {
    let expanded = expansion.is_expanded(id);
    SidebarItem {
        id: id.to_owned(),
        text: text.to_owned(),
        has_subsections: !subsections.is_empty(),
        expanded,
        active: active == Some(id),
        subsections: if expanded {
            subsections
                .iter()
                .map(|sub| SidebarSubItem {
                    id: sub.id.clone(),
                    text: sub.text.clone(),
                    active: active == Some(sub.id.as_str()),
                })
                .collect()
        } else {
            Vec::new()
        },
    }
}

/// Entries to render, in document order.
pub fn sidebar_items(
    doc: &ParsedDocument,
    results: &[SearchResult],
    query: &str,
    expansion: &ExpansionTracker,
    active: Option<&str>,
) -> Vec<SidebarItem> {
    if query.is_empty() {
        doc.sections
            .iter()
            .map(|s| item(&s.id, &s.text, &s.subsections, expansion, active))
            .collect()
    } else {
        top_level(results)
            .map(|r| item(&r.id, &r.text, &r.subsections, expansion, active))
            .collect()
    }
}
