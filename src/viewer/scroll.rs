//! Scroll synchronization as an explicit state machine.
//!
//! ```text
//!            scroll_to_heading(id)
//!   ┌──────┐ ───────────────────────▶ ┌─────────────────────────────┐
//!   │ Idle │                          │ Navigating { target, until } │
//!   └──────┘ ◀─────────────────────── └─────────────────────────────┘
//!      │        now >= until (tick / on_scroll)
//!      │
//!      └─ on_scroll: pick heading nearest above the detection line
//! ```
//!
//! Scroll events that arrive while navigating are the programmatic scroll's
//! own echo and never change the active heading. Time is always passed in,
//! so every transition is deterministic.

use crate::config::ViewerConfig;
use std::time::{Duration, Instant};

/// Geometry and timing, resolved from `[viewer]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollSettings {
    pub nav_offset: f64,
    pub detection_line: f64,
    pub smooth_window: Duration,
    pub instant_window: Duration,
    pub settle_delay: Duration,
}

impl Default for ScrollSettings {
    fn default() -> Self {
        Self::from(&ViewerConfig::default())
    }
}

impl From<&ViewerConfig> for ScrollSettings {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            nav_offset: f64::from(config.nav_offset),
            detection_line: f64::from(config.detection_line),
            smooth_window: Duration::from_millis(config.smooth_scroll_ms),
            instant_window: Duration::from_millis(config.instant_scroll_ms),
            settle_delay: Duration::from_millis(config.settle_ms),
        }
    }
}

/// A rendered heading: its id and document-absolute top in px.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadingBox {
    pub id: String,
    pub top: f64,
}

impl HeadingBox {
    pub fn new(id: impl Into<String>, top: f64) -> Self {
        Self { id: id.into(), top }
    }
}

/// Whatever renders the document reports heading positions through this.
pub trait ContentLayout {
    /// Rendered `h1`/`h2` boxes in document order.
    fn headings(&self) -> &[HeadingBox];

    fn heading(&self, id: &str) -> Option<&HeadingBox> {
        self.headings().iter().find(|h| h.id == id)
    }
}

impl ContentLayout for Vec<HeadingBox> {
    fn headings(&self) -> &[HeadingBox] {
        self
    }
}

/// URL fragment plus the number of history entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    fragment: Option<String>,
    history_len: usize,
}

impl Default for Location {
    fn default() -> Self {
        Self::new()
    }
}

impl Location {
    pub fn new() -> Self {
        Self {
            fragment: None,
            history_len: 1,
        }
    }

    /// From a raw hash such as `#section-1-sub-0` (percent-decoded).
    pub fn from_hash(hash: &str) -> Self {
        let raw = hash.strip_prefix('#').unwrap_or(hash);
        let fragment = urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| raw.to_owned());
        Self {
            fragment: (!fragment.is_empty()).then_some(fragment),
            history_len: 1,
        }
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn hash(&self) -> String {
        self.fragment
            .as_deref()
            .map(|f| format!("#{f}"))
            .unwrap_or_default()
    }

    pub fn history_len(&self) -> usize {
        self.history_len
    }

    /// Replace the fragment in place; history length is unchanged.
    pub fn replace_fragment(&mut self, id: &str) {
        self.fragment = Some(id.to_owned());
    }
}

/// Scroll the host should perform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub top: f64,
    pub smooth: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollState {
    Idle,
    Navigating { target: String, deadline: Instant },
}

#[derive(Debug, Clone)]
pub struct ScrollSync {
    settings: ScrollSettings,
    state: ScrollState,
    active_id: Option<String>,
    restore_at: Option<Instant>,
}

impl ScrollSync {
    pub fn new(settings: ScrollSettings) -> Self {
        Self {
            settings,
            state: ScrollState::Idle,
            active_id: None,
            restore_at: None,
        }
    }

    pub fn state(&self) -> &ScrollState {
        &self.state
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn is_navigating(&self) -> bool {
        matches!(self.state, ScrollState::Navigating { .. })
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let nav = match &self.state {
            ScrollState::Navigating { deadline, .. } => Some(*deadline),
            ScrollState::Idle => None,
        };
        match (nav, self.restore_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Scroll `id` into view below the navigation offset.
    ///
    /// Unknown ids are ignored and leave every piece of state as it was.
    pub fn scroll_to_heading(
        &mut self,
        id: &str,
        smooth: bool,
        now: Instant,
        layout: &impl ContentLayout,
        location: &mut Location,
    ) -> Option<ScrollRequest> {
        let heading = layout.heading(id)?;
        let window = if smooth {
            self.settings.smooth_window
        } else {
            self.settings.instant_window
        };

        self.state = ScrollState::Navigating {
            target: id.to_owned(),
            deadline: now + window,
        };
        self.active_id = Some(id.to_owned());
        location.replace_fragment(id);

        Some(ScrollRequest {
            top: heading.top - self.settings.nav_offset,
            smooth,
        })
    }

    /// Handle a scroll to `scroll_y`. Returns whether the active id changed.
    pub fn on_scroll(&mut self, scroll_y: f64, now: Instant, layout: &impl ContentLayout) -> bool {
        self.expire(now);
        if self.is_navigating() {
            return false;
        }

        let line = self.settings.detection_line;
        let mut closest: Option<(&HeadingBox, f64)> = None;
        for heading in layout.headings() {
            let top = heading.top - scroll_y;
            let distance = (top - line).abs();
            if top <= line && closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((heading, distance));
            }
        }

        match closest {
            Some((heading, _)) if self.active_id.as_deref() != Some(heading.id.as_str()) => {
                self.active_id = Some(heading.id.clone());
                true
            }
            _ => false,
        }
    }

    /// Content was (re)rendered; schedule restoring the fragment target.
    pub fn content_rendered(&mut self, now: Instant, location: &Location) {
        if location.fragment().is_some() {
            self.restore_at = Some(now + self.settings.settle_delay);
        }
    }

    /// Advance timers: end elapsed navigation, run a due fragment restore.
    pub fn tick(
        &mut self,
        now: Instant,
        layout: &impl ContentLayout,
        location: &mut Location,
    ) -> Option<ScrollRequest> {
        self.expire(now);

        let due = self.restore_at.is_some_and(|at| now >= at);
        if !due {
            return None;
        }
        self.restore_at = None;
        let target = location.fragment()?.to_owned();
        self.scroll_to_heading(&target, false, now, layout, location)
    }

    /// Drop the active id if it no longer exists in the rendered content.
    pub fn retain_rendered(&mut self, layout: &impl ContentLayout) {
        if let Some(id) = &self.active_id
            && layout.heading(id).is_none()
        {
            self.active_id = None;
        }
    }

    fn expire(&mut self, now: Instant) {
        if let ScrollState::Navigating { deadline, .. } = self.state
            && now >= deadline
        {
            self.state = ScrollState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Vec<HeadingBox> {
        vec![
            HeadingBox::new("section-0", 0.0),
            HeadingBox::new("section-1", 1000.0),
            HeadingBox::new("section-1-sub-0", 1400.0),
            HeadingBox::new("section-1-sub-1", 2000.0),
        ]
    }

    fn sync() -> ScrollSync {
        ScrollSync::new(ScrollSettings::default())
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_scroll_to_heading_sets_active_and_fragment() {
        let mut sync = sync();
        let mut location = Location::new();
        let now = Instant::now();

        let request = sync
            .scroll_to_heading("section-1-sub-0", true, now, &layout(), &mut location)
            .unwrap();

        assert_eq!(request, ScrollRequest { top: 1280.0, smooth: true });
        assert_eq!(sync.active_id(), Some("section-1-sub-0"));
        assert_eq!(location.hash(), "#section-1-sub-0");
        assert_eq!(location.history_len(), 1);
        assert_eq!(
            sync.state(),
            &ScrollState::Navigating {
                target: "section-1-sub-0".into(),
                deadline: now + ms(800)
            }
        );
    }

    #[test]
    fn test_unknown_heading_is_noop() {
        let mut sync = sync();
        let mut location = Location::from_hash("#section-0");
        let now = Instant::now();

        assert!(sync.scroll_to_heading("nope", true, now, &layout(), &mut location).is_none());
        assert_eq!(sync.state(), &ScrollState::Idle);
        assert_eq!(sync.active_id(), None);
        assert_eq!(location.fragment(), Some("section-0"));
    }

    #[test]
    fn test_scroll_events_suppressed_while_navigating() {
        let mut sync = sync();
        let mut location = Location::new();
        let now = Instant::now();
        sync.scroll_to_heading("section-1-sub-1", true, now, &layout(), &mut location);

        // Intermediate positions of the smooth scroll pass other headings
        for (dt, y) in [(100, 300.0), (400, 1100.0), (700, 1500.0)] {
            assert!(!sync.on_scroll(y, now + ms(dt), &layout()));
            assert_eq!(sync.active_id(), Some("section-1-sub-1"));
        }

        // Window over: the listener is live again
        assert!(sync.on_scroll(1100.0, now + ms(800), &layout()));
        assert_eq!(sync.active_id(), Some("section-1"));
        assert_eq!(sync.state(), &ScrollState::Idle);
    }

    #[test]
    fn test_instant_navigation_window() {
        let mut sync = sync();
        let mut location = Location::new();
        let now = Instant::now();
        sync.scroll_to_heading("section-1", false, now, &layout(), &mut location);

        assert!(!sync.on_scroll(0.0, now + ms(99), &layout()));
        assert!(sync.on_scroll(0.0, now + ms(100), &layout()));
        assert_eq!(sync.active_id(), Some("section-0"));
    }

    #[test]
    fn test_on_scroll_picks_nearest_heading_above_line() {
        let mut sync = sync();
        let now = Instant::now();

        // Viewport tops at y=1300: -1300, -300, 100, 700
        assert!(sync.on_scroll(1300.0, now, &layout()));
        assert_eq!(sync.active_id(), Some("section-1-sub-0"));

        // Same heading again: no change reported
        assert!(!sync.on_scroll(1310.0, now, &layout()));
    }

    #[test]
    fn test_on_scroll_heading_exactly_on_line() {
        let mut sync = sync();
        assert!(sync.on_scroll(850.0, Instant::now(), &layout()));
        assert_eq!(sync.active_id(), Some("section-1"));
    }

    #[test]
    fn test_on_scroll_nothing_above_line_keeps_active() {
        let mut sync = sync();
        let now = Instant::now();
        let below = vec![HeadingBox::new("section-0", 400.0)];

        assert!(!sync.on_scroll(0.0, now, &below));
        assert_eq!(sync.active_id(), None);
    }

    #[test]
    fn test_deep_link_restored_after_settle() {
        let mut sync = sync();
        let mut location = Location::from_hash("#section-1-sub-1");
        let now = Instant::now();

        sync.content_rendered(now, &location);
        assert_eq!(sync.next_deadline(), Some(now + ms(100)));
        assert!(sync.tick(now + ms(50), &layout(), &mut location).is_none());

        let request = sync.tick(now + ms(100), &layout(), &mut location).unwrap();
        assert_eq!(request, ScrollRequest { top: 1880.0, smooth: false });
        assert_eq!(sync.active_id(), Some("section-1-sub-1"));

        // Restore happens once
        assert!(sync.tick(now + ms(300), &layout(), &mut location).is_none());
        assert_eq!(sync.state(), &ScrollState::Idle);
    }

    #[test]
    fn test_no_fragment_no_restore() {
        let mut sync = sync();
        let mut location = Location::new();
        let now = Instant::now();

        sync.content_rendered(now, &location);
        assert!(sync.next_deadline().is_none());
        assert!(sync.tick(now + ms(500), &layout(), &mut location).is_none());
    }

    #[test]
    fn test_retain_rendered_clears_missing_active() {
        let mut sync = sync();
        sync.on_scroll(2100.0, Instant::now(), &layout());
        assert_eq!(sync.active_id(), Some("section-1-sub-1"));

        sync.retain_rendered(&layout());
        assert_eq!(sync.active_id(), Some("section-1-sub-1"));

        sync.retain_rendered(&vec![HeadingBox::new("section-0", 0.0)]);
        assert_eq!(sync.active_id(), None);
    }

    #[test]
    fn test_location_from_hash() {
        assert_eq!(Location::from_hash("#a%20b").fragment(), Some("a b"));
        assert_eq!(Location::from_hash("#").fragment(), None);
        assert_eq!(Location::from_hash("").fragment(), None);
        assert_eq!(Location::from_hash("section-2").fragment(), Some("section-2"));
    }

    #[test]
    fn test_settings_from_config() {
        let config = ViewerConfig {
            nav_offset: 60,
            ..ViewerConfig::default()
        };
        let settings = ScrollSettings::from(&config);
        assert_eq!(settings.nav_offset, 60.0);
        assert_eq!(settings.smooth_window, ms(800));
    }
}
