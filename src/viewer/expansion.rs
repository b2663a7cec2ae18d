//! Which sidebar sections show their subsection list.

use crate::document::ParsedDocument;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Section id → expanded. Entries are only ever merged, never cleared, so an
/// explicit expansion survives the active heading moving elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExpansionTracker {
    expanded: FxHashMap<String, bool>,
}

impl ExpansionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, section_id: &str, expand: bool) {
        self.expanded.insert(section_id.to_owned(), expand);
    }

    pub fn is_expanded(&self, section_id: &str) -> bool {
        self.expanded.get(section_id).copied().unwrap_or(false)
    }

    /// Expand the section owning `active_id`. Returns `true` if that changed
    /// the map; ids not in `doc` are ignored.
    pub fn follow_active(&mut self, active_id: &str, doc: &ParsedDocument) -> bool {
        let Some(heading) = doc.find(active_id) else {
            return false;
        };
        let section_id = heading.section_id();
        if self.is_expanded(section_id) {
            return false;
        }
        self.set(section_id, true);
        true
    }

    pub fn map(&self) -> &FxHashMap<String, bool> {
        &self.expanded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    fn doc() -> ParsedDocument {
        parse_document(
            "<h1>Overview</h1><p>x</p>\
             <h1>Alerts</h1><h2>Red Alerts</h2><p>r</p><h2>Amber Alerts</h2><p>a</p>\
             <h1>Engine</h1><h2>Start</h2>",
        )
        .unwrap()
    }

    #[test]
    fn test_subsection_expands_owner() {
        let doc = doc();
        let mut tracker = ExpansionTracker::new();

        assert!(tracker.follow_active("section-1-sub-1", &doc));
        assert!(tracker.is_expanded("section-1"));
        assert!(!tracker.map().contains_key("section-1-sub-1"));
    }

    #[test]
    fn test_section_expands_itself() {
        let doc = doc();
        let mut tracker = ExpansionTracker::new();

        assert!(tracker.follow_active("section-2", &doc));
        assert!(tracker.is_expanded("section-2"));
        assert!(!tracker.follow_active("section-2", &doc));
    }

    #[test]
    fn test_merge_keeps_prior_entries() {
        let doc = doc();
        let mut tracker = ExpansionTracker::new();
        tracker.set("section-2", true);

        tracker.follow_active("section-1-sub-0", &doc);
        assert!(tracker.is_expanded("section-2"));
        assert!(tracker.is_expanded("section-1"));
    }

    #[test]
    fn test_explicit_collapse_then_follow() {
        let doc = doc();
        let mut tracker = ExpansionTracker::new();
        tracker.follow_active("section-1", &doc);
        tracker.set("section-1", false);
        assert!(!tracker.is_expanded("section-1"));

        // Activating a heading in it again re-expands
        assert!(tracker.follow_active("section-1-sub-1", &doc));
        assert!(tracker.is_expanded("section-1"));
    }

    #[test]
    fn test_unknown_id_ignored() {
        let mut tracker = ExpansionTracker::new();
        assert!(!tracker.follow_active("section-9", &doc()));
        assert!(tracker.map().is_empty());
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut tracker = ExpansionTracker::new();
        tracker.set("section-1", true);
        let json = serde_json::to_value(&tracker).unwrap();
        assert_eq!(json, serde_json::json!({"section-1": true}));
    }
}
