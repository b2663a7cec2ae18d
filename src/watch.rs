//! File system watcher for the document server.
//!
//! Monitors the library directory, explicitly listed document files and the
//! config file, and keeps [`LIBRARY`] in step with them.
//!
//! ```text
//!  ┌──────────┐    ┌───────────┐    ┌─────────────────────────────┐
//!  │  notify  │───▶│ Debouncer │───▶│      handle_changes()       │
//!  │  events  │    │  (300ms)  │    │  config   → reload + rescan │
//!  └──────────┘    └───────────┘    │  known    → re-parse        │
//!                                   │  new/gone → rescan          │
//!                                   └─────────────────────────────┘
//! ```

use crate::{
    config::{ManviewConfig, cfg, reload_config},
    library::{Catalog, LIBRARY},
    log,
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{RecvTimeoutError, channel},
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;
const RELOAD_COOLDOWN_MS: u64 = 800;

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// `/proj/manuals/ops.html` → `manuals/ops.html`
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and reload cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_reload: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_reload: None,
        }
    }

    fn in_cooldown(&self, now: Instant) -> bool {
        self.last_reload
            .is_some_and(|t| now.duration_since(t) < Duration::from_millis(RELOAD_COOLDOWN_MS))
    }

    fn add(&mut self, paths: Vec<PathBuf>, now: Instant) {
        self.pending
            .extend(paths.into_iter().filter(|p| !is_temp_file(p)));
        self.last_event = Some(now);
    }

    fn ready(&self, now: Instant) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| now.duration_since(t) >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn mark_reload(&mut self, now: Instant) {
        self.last_reload = Some(now);
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Event Handler
// =============================================================================

#[derive(Debug, Default, PartialEq, Eq)]
struct ChangeSet {
    config: bool,
    documents: Vec<PathBuf>,
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html" | "htm")
    )
}

fn categorize(paths: &[PathBuf], config: &ManviewConfig) -> ChangeSet {
    let mut changes = ChangeSet::default();
    for path in paths {
        if path == &config.config_path {
            changes.config = true;
        } else if is_html(path) {
            changes.documents.push(path.clone());
        }
    }
    changes.documents.sort();
    changes
}

/// Apply a batch of changes. Returns true if the catalog was rebuilt.
fn handle_changes(paths: &[PathBuf]) -> bool {
    let config = cfg();
    let root = config.get_root().to_path_buf();
    let changes = categorize(paths, &config);

    if changes.config {
        match reload_config() {
            Ok(true) => {
                log!("watch"; "config changed, rescanning library");
                LIBRARY.set_catalog(Catalog::from_config(&cfg()));
                return true;
            }
            Ok(false) => {}
            Err(err) => {
                log!("watch"; "config reload failed: {err:#}");
                return false;
            }
        }
    }

    let mut rescan = false;
    for path in &changes.documents {
        match LIBRARY.reload_path(path) {
            Some(Ok(id)) => log!("watch"; "reloaded {id} ({})", rel_path(path, &root)),
            Some(Err(err)) => {
                log!("watch"; "{}: {err}", rel_path(path, &root));
                rescan |= !path.exists();
            }
            None => rescan = true,
        }
    }

    if rescan {
        LIBRARY.set_catalog(Catalog::from_config(&config));
        log!("watch"; "library rescanned: {} documents", LIBRARY.entries().len());
    }
    rescan
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn setup_watchers(watcher: &mut impl Watcher, config: &ManviewConfig) -> Result<()> {
    let root = config.get_root();
    let mut watched = Vec::new();

    if config.library.dir.is_dir() {
        watcher
            .watch(&config.library.dir, RecursiveMode::Recursive)
            .with_context(|| format!("Failed to watch {}", config.library.dir.display()))?;
        watched.push(format!("{}/", rel_path(&config.library.dir, root)));
    }

    let explicit = config
        .library
        .documents
        .iter()
        .filter_map(|entry| config.resolve_source(&entry.path).as_path().map(Path::to_path_buf))
        .filter(|path| !path.starts_with(&config.library.dir));
    for path in explicit.chain([config.config_path.clone()]) {
        if path.is_file() {
            watcher
                .watch(&path, RecursiveMode::NonRecursive)
                .with_context(|| format!("Failed to watch {}", path.display()))?;
            watched.push(rel_path(&path, root));
        }
    }

    if !watched.is_empty() {
        log!("watch"; "{}", watched.join(", "));
    }
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing.
pub fn watch_for_changes_blocking() -> Result<()> {
    let config = cfg();
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, &config)?;

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown(Instant::now()) => {
                debouncer.add(event.paths, Instant::now());
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready(Instant::now()) => {
                if handle_changes(&debouncer.take()) {
                    debouncer.mark_reload(Instant::now());
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}
