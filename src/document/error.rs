//! Document load error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a document load attempt.
///
/// Fetch and parse failures are both terminal for the load: callers show a
/// full-pane error and a new load is required to recover. An empty or
/// headingless document is not an error.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("request to `{0}` failed")]
    Request(String, #[source] reqwest::Error),

    #[error("failed to fetch document `{url}`: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("document `{0}` is not valid UTF-8")]
    Encoding(String),

    #[error("HTML parse error at position {position}: {message}")]
    Parse { position: u64, message: String },
}

impl DocumentError {
    /// Network, filesystem or non-2xx failures.
    pub const fn is_fetch(&self) -> bool {
        matches!(
            self,
            Self::Io(..) | Self::Request(..) | Self::Status { .. } | Self::Encoding(_)
        )
    }

    /// The document was fetched but could not be walked.
    pub const fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
