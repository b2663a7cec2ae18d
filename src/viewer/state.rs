//! Per-load viewer state.
//!
//! [`ViewerSession`] owns everything derived from one loaded document: the
//! search index and the current query's output, scroll sync, sidebar
//! expansion and the URL location. The host feeds it events (query edits,
//! clicks, scrolls, timer ticks) together with the current layout and
//! performs whatever [`ScrollRequest`] comes back.
//!
//! [`DocumentView`] sits one level up and guards the asynchronous load.

use super::expansion::ExpansionTracker;
use super::scroll::{ContentLayout, Location, ScrollRequest, ScrollSettings, ScrollSync};
use super::sidebar::{self, SidebarAction, SidebarItem};
use crate::document::{DocumentError, LoadTicket, LoadTracker, ParsedDocument, Section};
use crate::log;
use crate::search::{SearchEngine, SearchOutput, SearchResult};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

pub struct ViewerSession {
    doc: Arc<ParsedDocument>,
    engine: SearchEngine,
    query: String,
    output: SearchOutput,
    scroll: ScrollSync,
    expansion: ExpansionTracker,
    location: Location,
}

impl ViewerSession {
    pub fn new(doc: Arc<ParsedDocument>, settings: ScrollSettings, location: Location) -> Self {
        let engine = SearchEngine::new(Arc::clone(&doc));
        let output = engine.run("");
        Self {
            doc,
            engine,
            query: String::new(),
            output,
            scroll: ScrollSync::new(settings),
            expansion: ExpansionTracker::new(),
            location,
        }
    }

    pub fn document(&self) -> &Arc<ParsedDocument> {
        &self.doc
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn output(&self) -> &SearchOutput {
        &self.output
    }

    pub fn active_id(&self) -> Option<&str> {
        self.scroll.active_id()
    }

    pub fn expansion(&self) -> &ExpansionTracker {
        &self.expansion
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn scroll(&self) -> &ScrollSync {
        &self.scroll
    }

    /// Re-run the search. Returns `true` if the highlighted markup changed,
    /// in which case a fragment restore is scheduled as for any re-render.
    pub fn set_query(&mut self, query: &str, now: Instant) -> bool {
        if query == self.query {
            return false;
        }
        self.query = query.to_owned();

        let output = self.engine.run(query);
        let changed = output.highlighted_html != self.output.highlighted_html;
        self.output = output;
        if changed {
            self.scroll.content_rendered(now, &self.location);
        }
        changed
    }

    /// The host mounted or re-rendered the content.
    pub fn content_rendered(&mut self, now: Instant, layout: &impl ContentLayout) {
        self.scroll.retain_rendered(layout);
        self.scroll.content_rendered(now, &self.location);
    }

    pub fn navigate(
        &mut self,
        id: &str,
        smooth: bool,
        now: Instant,
        layout: &impl ContentLayout,
    ) -> Option<ScrollRequest> {
        let before = self.active_owned();
        let request = self
            .scroll
            .scroll_to_heading(id, smooth, now, layout, &mut self.location);
        self.sync_expansion(before);
        request
    }

    /// Sidebar click on a top-level entry.
    pub fn click_section(
        &mut self,
        id: &str,
        now: Instant,
        layout: &impl ContentLayout,
    ) -> Option<ScrollRequest> {
        let section = self.doc.section(id)?;
        match sidebar::click_section(id, !section.subsections.is_empty(), &self.expansion) {
            SidebarAction::Expand(id) => {
                self.expansion.set(&id, true);
                None
            }
            SidebarAction::Navigate(id) => self.navigate(&id, true, now, layout),
        }
    }

    pub fn click_subsection(
        &mut self,
        id: &str,
        now: Instant,
        layout: &impl ContentLayout,
    ) -> Option<ScrollRequest> {
        match sidebar::click_subsection(id) {
            SidebarAction::Navigate(id) => self.navigate(&id, true, now, layout),
            SidebarAction::Expand(_) => None,
        }
    }

    pub fn set_expanded(&mut self, section_id: &str, expand: bool) {
        self.expansion.set(section_id, expand);
    }

    /// Returns whether the active id changed.
    pub fn on_scroll(&mut self, scroll_y: f64, now: Instant, layout: &impl ContentLayout) -> bool {
        let before = self.active_owned();
        let changed = self.scroll.on_scroll(scroll_y, now, layout);
        self.sync_expansion(before);
        changed
    }

    pub fn tick(&mut self, now: Instant, layout: &impl ContentLayout) -> Option<ScrollRequest> {
        let before = self.active_owned();
        let request = self.scroll.tick(now, layout, &mut self.location);
        self.sync_expansion(before);
        request
    }

    pub fn view(&self) -> ViewModel<'_> {
        ViewModel {
            sections_data: &self.doc.sections,
            search_query: &self.query,
            search_results: &self.output.results,
            sidebar_items: sidebar::sidebar_items(
                &self.doc,
                &self.output.results,
                &self.query,
                &self.expansion,
                self.active_id(),
            ),
            highlighted_html: &self.output.highlighted_html,
            active_id: self.active_id(),
            expanded_sections: &self.expansion,
            hash: self.location.hash(),
        }
    }

    fn active_owned(&self) -> Option<String> {
        self.scroll.active_id().map(str::to_owned)
    }

    fn sync_expansion(&mut self, before: Option<String>) {
        if let Some(active) = self.scroll.active_id()
            && before.as_deref() != Some(active)
        {
            self.expansion.follow_active(active, &self.doc);
        }
    }
}

/// Everything a front-end renders, in its JSON shape.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel<'a> {
    pub sections_data: &'a [Section],
    pub search_query: &'a str,
    pub search_results: &'a [SearchResult],
    pub sidebar_items: Vec<SidebarItem>,
    pub highlighted_html: &'a str,
    pub active_id: Option<&'a str>,
    pub expanded_sections: &'a ExpansionTracker,
    pub hash: String,
}

// ============================================================================
// Load Lifecycle
// ============================================================================

pub enum LoadStatus {
    Loading,
    Failed(String),
    Ready(Box<ViewerSession>),
}

/// Load lifecycle for whichever document the user asked for last.
pub struct DocumentView {
    tracker: LoadTracker,
    status: LoadStatus,
    settings: ScrollSettings,
    /// Location handed to the next session when none is ready yet.
    location: Location,
}

impl DocumentView {
    pub fn new(settings: ScrollSettings, location: Location) -> Self {
        Self {
            tracker: LoadTracker::new(),
            status: LoadStatus::Loading,
            settings,
            location,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn session(&self) -> Option<&ViewerSession> {
        match &self.status {
            LoadStatus::Ready(session) => Some(session.as_ref()),
            _ => None,
        }
    }

    pub fn session_mut(&mut self) -> Option<&mut ViewerSession> {
        match &mut self.status {
            LoadStatus::Ready(session) => Some(session.as_mut()),
            _ => None,
        }
    }

    /// Start loading `doc_id`; any load still in flight becomes stale.
    pub fn begin_load(&mut self, doc_id: &str) -> LoadTicket {
        if let LoadStatus::Ready(session) = &self.status {
            self.location = session.location().clone();
        }
        self.status = LoadStatus::Loading;
        self.tracker.begin(doc_id)
    }

    /// Apply a finished load. Returns `false` (and changes nothing) when a
    /// newer load has been started since `ticket` was issued.
    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<ParsedDocument, DocumentError>,
        now: Instant,
    ) -> bool {
        if !self.tracker.is_current(ticket) {
            log!("load"; "discarding stale load of `{}`", ticket.doc_id);
            return false;
        }

        self.status = match result {
            Ok(doc) => {
                let mut session =
                    ViewerSession::new(Arc::new(doc), self.settings, self.location.clone());
                session.scroll.content_rendered(now, &session.location);
                LoadStatus::Ready(Box::new(session))
            }
            Err(err) => {
                log!("error"; "failed to load `{}`: {err}", ticket.doc_id);
                LoadStatus::Failed(err.to_string())
            }
        };
        true
    }
}
