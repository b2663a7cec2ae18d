//! `[library]` section configuration.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[library]` section in manview.toml - which manuals are served.
///
/// # Example
/// ```toml
/// [library]
/// dir = "manuals"
///
/// [[library.documents]]
/// id = "ops"
/// name = "Operations Manual"
/// path = "manuals/ops.html"
///
/// [[library.documents]]
/// id = "vendor"
/// path = "https://vendor.example.com/manual.html"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct LibraryConfig {
    /// Scanned recursively for `*.html`; each file's stem becomes its id.
    #[serde(default = "defaults::library::dir")]
    #[educe(Default = defaults::library::dir())]
    pub dir: PathBuf,

    /// Explicit entries. Override scanned files with the same id.
    #[serde(default)]
    pub documents: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentEntry {
    pub id: String,
    /// Display name, defaults to the id.
    #[serde(default)]
    pub name: Option<String>,
    /// File path (relative to the root) or `http(s)` URL.
    pub path: String,
}

impl DocumentEntry {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
