//! Document catalog and parsed-document cache.
//!
//! The catalog is built from `[library]`: every `*.html` under `dir`, plus
//! explicit `[[library.documents]]` entries which win on id collisions.
//! Parsed documents are cached per id and shared across request threads.
//!
//! ```text
//!   manview.toml ──▶ Catalog ──▶ Library ◀── watcher (reload_path)
//!                                   │
//!                        RwLock<FxHashMap<id, Arc<LoadedDocument>>>
//!                                   │
//!                              HTTP handlers
//! ```

use crate::config::ManviewConfig;
use crate::document::{DocumentError, DocumentSource, LoadedDocument};
use crate::log;
use parking_lot::RwLock;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::{
    path::{Component, Path},
    sync::{Arc, LazyLock},
};
use walkdir::WalkDir;

/// Library shared by the server and the watcher.
pub static LIBRARY: LazyLock<Library> = LazyLock::new(Library::new);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub source: DocumentSource,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn from_config(config: &ManviewConfig) -> Self {
        let mut entries = scan_dir(&config.library.dir);

        for explicit in &config.library.documents {
            let entry = CatalogEntry {
                id: explicit.id.clone(),
                name: explicit.display_name().to_owned(),
                source: config.resolve_source(&explicit.path),
            };
            match entries.iter_mut().find(|e| e.id == entry.id) {
                Some(scanned) => *scanned = entry,
                None => entries.push(entry),
            }
        }

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entry whose source is the file at `path`.
    pub fn find_by_path(&self, path: &Path) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.source.as_path().is_some_and(|p| same_file(p, path)))
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    a == b
        || matches!(
            (a.canonicalize(), b.canonicalize()),
            (Ok(a), Ok(b)) if a == b
        )
}

fn is_html(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("html" | "htm")
    )
}

/// Id for a scanned file: its path below `dir` without extension, `-` joined.
///
/// `manuals/engine/start.html` → `engine-start`
fn scanned_id(dir: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(dir).ok()?.with_extension("");
    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect();
    (!parts.is_empty()).then(|| parts.join("-"))
}

fn scan_dir(dir: &Path) -> Vec<CatalogEntry> {
    WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_html(e.path()))
        .filter_map(|e| {
            let id = scanned_id(dir, e.path())?;
            let name = e.path().file_stem()?.to_str()?.to_owned();
            Some(CatalogEntry {
                id,
                name,
                source: DocumentSource::File(e.path().to_path_buf()),
            })
        })
        .collect()
}

// ============================================================================
// Library
// ============================================================================

/// Catalog plus lazily filled cache of parsed documents.
#[derive(Debug, Default)]
pub struct Library {
    catalog: RwLock<Catalog>,
    documents: RwLock<FxHashMap<String, Arc<LoadedDocument>>>,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog, dropping cached documents whose entry is gone or
    /// now points elsewhere.
    pub fn set_catalog(&self, catalog: Catalog) {
        self.documents.write().retain(|id, doc| {
            catalog
                .get(id)
                .is_some_and(|entry| entry.source == doc.source)
        });
        *self.catalog.write() = catalog;
    }

    pub fn entries(&self) -> Vec<CatalogEntry> {
        self.catalog.read().entries().to_vec()
    }

    pub fn entry(&self, id: &str) -> Option<CatalogEntry> {
        self.catalog.read().get(id).cloned()
    }

    /// Parsed document for `id`, loading it on first use.
    ///
    /// `None` for ids not in the catalog. Failed loads are not cached.
    pub fn document(&self, id: &str) -> Option<Result<Arc<LoadedDocument>, DocumentError>> {
        if let Some(doc) = self.documents.read().get(id) {
            return Some(Ok(Arc::clone(doc)));
        }
        let entry = self.entry(id)?;
        Some(self.load(&entry))
    }

    fn load(&self, entry: &CatalogEntry) -> Result<Arc<LoadedDocument>, DocumentError> {
        let doc = Arc::new(entry.source.load()?);
        self.documents
            .write()
            .insert(entry.id.clone(), Arc::clone(&doc));
        Ok(doc)
    }

    /// Parse every catalog entry in parallel. Returns the number loaded.
    pub fn preload(&self) -> usize {
        let entries = self.entries();
        entries
            .par_iter()
            .filter(|entry| match self.load(entry) {
                Ok(_) => true,
                Err(err) => {
                    log!("error"; "{}: {err}", entry.id);
                    false
                }
            })
            .count()
    }

    /// Re-parse the document backed by `path`. Returns its id if it is in
    /// the catalog. The cached copy is kept when the new text fails to parse
    /// and dropped when the file is gone.
    pub fn reload_path(&self, path: &Path) -> Option<Result<String, DocumentError>> {
        let entry = self.catalog.read().find_by_path(path).cloned()?;
        let result = self.load(&entry).map(|_| entry.id.clone());
        if result.is_err() && !path.exists() {
            self.documents.write().remove(&entry.id);
        }
        Some(result)
    }

    pub fn is_cached(&self, id: &str) -> bool {
        self.documents.read().contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocumentEntry;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(dir: &Path, documents: Vec<DocumentEntry>) -> ManviewConfig {
        let mut config = ManviewConfig::default();
        config.root = Some(dir.to_path_buf());
        config.library.dir = dir.join("manuals");
        config.library.documents = documents;
        config
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_nested_html() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("manuals/ops.html"), "<h1>Ops</h1>");
        write(&dir.path().join("manuals/engine/start.htm"), "<h1>Start</h1>");
        write(&dir.path().join("manuals/notes.txt"), "ignored");

        let catalog = Catalog::from_config(&config_for(dir.path(), Vec::new()));
        let ids: Vec<_> = catalog.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["engine-start", "ops"]);
        assert_eq!(catalog.get("engine-start").unwrap().name, "start");
    }

    #[test]
    fn test_explicit_entries_override_scanned() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("manuals/ops.html"), "<h1>Ops</h1>");
        write(&dir.path().join("other/ops-v2.html"), "<h1>Ops v2</h1>");

        let config = config_for(
            dir.path(),
            vec![
                DocumentEntry {
                    id: "ops".into(),
                    name: Some("Operations Manual".into()),
                    path: "other/ops-v2.html".into(),
                },
                DocumentEntry {
                    id: "vendor".into(),
                    name: None,
                    path: "https://vendor.example.com/m.html".into(),
                },
            ],
        );
        let catalog = Catalog::from_config(&config);

        assert_eq!(catalog.entries().len(), 2);
        let ops = catalog.get("ops").unwrap();
        assert_eq!(ops.name, "Operations Manual");
        assert_eq!(
            ops.source,
            DocumentSource::File(dir.path().join("other/ops-v2.html"))
        );
        assert!(matches!(catalog.get("vendor").unwrap().source, DocumentSource::Url(_)));
    }

    #[test]
    fn test_missing_dir_is_empty_catalog() {
        let dir = TempDir::new().unwrap();
        let catalog = Catalog::from_config(&config_for(dir.path(), Vec::new()));
        assert!(catalog.entries().is_empty());
    }

    #[test]
    fn test_document_lazy_load_and_cache() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("manuals/ops.html"), "<h1>Ops</h1><h1>More</h1>");

        let library = Library::new();
        library.set_catalog(Catalog::from_config(&config_for(dir.path(), Vec::new())));

        assert!(library.document("missing").is_none());
        assert!(!library.is_cached("ops"));
        let doc = library.document("ops").unwrap().unwrap();
        assert_eq!(doc.parsed.sections.len(), 2);
        assert!(library.is_cached("ops"));
    }

    #[test]
    fn test_failed_load_not_cached() {
        let dir = TempDir::new().unwrap();
        let config = config_for(
            dir.path(),
            vec![DocumentEntry {
                id: "gone".into(),
                name: None,
                path: "nope.html".into(),
            }],
        );
        let library = Library::new();
        library.set_catalog(Catalog::from_config(&config));

        let err = library.document("gone").unwrap().unwrap_err();
        assert!(err.is_fetch());
        assert!(!library.is_cached("gone"));
    }

    #[test]
    fn test_reload_path_updates_revision() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manuals/ops.html");
        write(&path, "<h1>Ops</h1>");

        let library = Library::new();
        library.set_catalog(Catalog::from_config(&config_for(dir.path(), Vec::new())));
        assert_eq!(library.preload(), 1);
        let before = library.document("ops").unwrap().unwrap().revision.clone();

        write(&path, "<h1>Ops</h1><h1>Appendix</h1>");
        let id = library.reload_path(&path).unwrap().unwrap();
        assert_eq!(id, "ops");

        let after = library.document("ops").unwrap().unwrap();
        assert_ne!(after.revision, before);
        assert_eq!(after.parsed.sections.len(), 2);

        assert!(library.reload_path(&dir.path().join("elsewhere.html")).is_none());
    }

    #[test]
    fn test_cached_document_shares_search_index() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("manuals/ops.html"), "<h1>Ops</h1><p>Start the pump.</p>");

        let library = Library::new();
        library.set_catalog(Catalog::from_config(&config_for(dir.path(), Vec::new())));
        let first = library.document("ops").unwrap().unwrap();
        let second = library.document("ops").unwrap().unwrap();

        assert!(Arc::ptr_eq(&first.search, &second.search));
        assert!(Arc::ptr_eq(first.search.index().document(), &first.parsed));
        assert_eq!(second.search.run("pump").results.len(), 1);
    }

    #[test]
    fn test_reload_deleted_file_evicts_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manuals/ops.html");
        write(&path, "<h1>Ops</h1>");
        let config = config_for(dir.path(), Vec::new());

        let library = Library::new();
        library.set_catalog(Catalog::from_config(&config));
        library.preload();
        assert!(library.is_cached("ops"));

        fs::remove_file(&path).unwrap();
        let err = library.reload_path(&path).unwrap().unwrap_err();
        assert!(err.is_fetch());
        assert!(!library.is_cached("ops"));

        library.set_catalog(Catalog::from_config(&config));
        assert!(library.document("ops").is_none());
    }

    #[test]
    fn test_reload_parse_failure_keeps_cached_copy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manuals/ops.html");
        write(&path, "<h1>Ops</h1>");

        let library = Library::new();
        library.set_catalog(Catalog::from_config(&config_for(dir.path(), Vec::new())));
        library.preload();

        write(&path, "<h1>Ops</h1><p");
        assert!(library.reload_path(&path).unwrap().unwrap_err().is_parse());
        assert!(library.is_cached("ops"));
    }

    #[test]
    fn test_set_catalog_evicts_removed_entries() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("manuals/ops.html"), "<h1>Ops</h1>");
        let config = config_for(dir.path(), Vec::new());

        let library = Library::new();
        library.set_catalog(Catalog::from_config(&config));
        library.preload();
        assert!(library.is_cached("ops"));

        library.set_catalog(Catalog::default());
        assert!(!library.is_cached("ops"));
        assert!(library.document("ops").is_none());
    }
}
