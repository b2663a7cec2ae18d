//! Fetching and parsing document sources.
//!
//! A source is either a local file or an `http(s)` URL. Loads are keyed by a
//! [`LoadTracker`] ticket so a slow, superseded load can never replace the
//! document the user asked for last.

use super::error::DocumentError;
use super::model::ParsedDocument;
use super::parser::parse_document;
use crate::log;
use crate::search::SearchEngine;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Where a manual's HTML comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentSource {
    File(PathBuf),
    Url(String),
}

impl DocumentSource {
    /// Interpret a CLI/config string: `http://` and `https://` are URLs, anything else a path.
    pub fn parse(value: &str) -> Self {
        if value.starts_with("http://") || value.starts_with("https://") {
            Self::Url(value.to_owned())
        } else {
            Self::File(PathBuf::from(value))
        }
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path),
            Self::Url(_) => None,
        }
    }

    /// Read the raw HTML text. Non-2xx responses are fetch errors.
    pub fn fetch(&self) -> Result<String, DocumentError> {
        match self {
            Self::File(path) => {
                let bytes = fs::read(path).map_err(|err| DocumentError::Io(path.clone(), err))?;
                String::from_utf8(bytes).map_err(|_| DocumentError::Encoding(self.to_string()))
            }
            Self::Url(url) => {
                let response = reqwest::blocking::get(url)
                    .map_err(|err| DocumentError::Request(url.clone(), err))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(DocumentError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }
                response
                    .text()
                    .map_err(|err| DocumentError::Request(url.clone(), err))
            }
        }
    }

    /// Fetch and parse in one step.
    pub fn load(&self) -> Result<LoadedDocument, DocumentError> {
        let raw = self.fetch()?;
        let loaded = LoadedDocument::from_html(self.clone(), &raw)?;
        log!("load"; "{} sections from {}", loaded.parsed.sections.len(), self);
        Ok(loaded)
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// A parsed document plus the identity of the text it came from.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub source: DocumentSource,
    /// Content hash of the raw HTML, stable across reloads of identical text.
    pub revision: String,
    pub parsed: Arc<ParsedDocument>,
    /// Search index built once for this load and shared by every query.
    pub search: Arc<SearchEngine>,
}

impl LoadedDocument {
    pub fn from_html(source: DocumentSource, raw: &str) -> Result<Self, DocumentError> {
        let parsed = Arc::new(parse_document(raw)?);
        Ok(Self {
            source,
            revision: revision_of(raw),
            search: Arc::new(SearchEngine::new(Arc::clone(&parsed))),
            parsed,
        })
    }
}

/// First 16 hex chars of the blake3 hash.
pub fn revision_of(raw: &str) -> String {
    let hash = blake3::hash(raw.as_bytes());
    hex::encode(&hash.as_bytes()[..8])
}

// ============================================================================
// Stale Load Guard
// ============================================================================

/// Identifies one load request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub doc_id: String,
    generation: u64,
}

/// Hands out tickets; only the most recent one is current.
#[derive(Debug, Default)]
pub struct LoadTracker {
    generation: u64,
    latest: Option<LoadTicket>,
}

impl LoadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load of `doc_id`, superseding any load in flight.
    pub fn begin(&mut self, doc_id: &str) -> LoadTicket {
        self.generation += 1;
        let ticket = LoadTicket {
            doc_id: doc_id.to_owned(),
            generation: self.generation,
        };
        self.latest = Some(ticket.clone());
        ticket
    }

    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.latest.as_ref() == Some(ticket)
    }

    pub fn current_doc(&self) -> Option<&str> {
        self.latest.as_ref().map(|t| t.doc_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_source_parse() {
        assert_eq!(
            DocumentSource::parse("https://docs.example.com/manual.html"),
            DocumentSource::Url("https://docs.example.com/manual.html".into())
        );
        assert_eq!(
            DocumentSource::parse("manuals/ops.html"),
            DocumentSource::File(PathBuf::from("manuals/ops.html"))
        );
    }

    #[test]
    fn test_load_file_source() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manual.html");
        fs::write(&path, "<h1>Overview</h1><p>text</p>").unwrap();

        let loaded = DocumentSource::File(path).load().unwrap();
        assert_eq!(loaded.parsed.sections.len(), 1);
        assert_eq!(loaded.revision.len(), 16);
    }

    #[test]
    fn test_missing_file_is_fetch_error() {
        let dir = TempDir::new().unwrap();
        let err = DocumentSource::File(dir.path().join("nope.html"))
            .load()
            .unwrap_err();
        assert!(err.is_fetch());
    }

    #[test]
    fn test_non_utf8_file_is_fetch_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.html");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();
        let err = DocumentSource::File(path).fetch().unwrap_err();
        assert!(matches!(err, DocumentError::Encoding(_)));
    }

    #[test]
    fn test_revision_stable_and_content_sensitive() {
        assert_eq!(revision_of("<h1>A</h1>"), revision_of("<h1>A</h1>"));
        assert_ne!(revision_of("<h1>A</h1>"), revision_of("<h1>B</h1>"));
    }

    #[test]
    fn test_tracker_only_latest_ticket_current() {
        let mut tracker = LoadTracker::new();
        let first = tracker.begin("ops");
        let second = tracker.begin("ops");
        assert!(!tracker.is_current(&first));
        assert!(tracker.is_current(&second));
    }

    #[test]
    fn test_tracker_switching_documents() {
        let mut tracker = LoadTracker::new();
        let old = tracker.begin("ops");
        let new = tracker.begin("maintenance");
        assert!(!tracker.is_current(&old));
        assert!(tracker.is_current(&new));
        assert_eq!(tracker.current_doc(), Some("maintenance"));
    }
}
