//! Document pipeline: raw HTML → section tree.

pub mod error;
pub mod html;
pub mod loader;
pub mod model;
pub mod parser;

pub use error::DocumentError;
pub use loader::{DocumentSource, LoadTicket, LoadTracker, LoadedDocument};
pub use model::{Heading, HeadingLevel, HeadingRef, ParsedDocument, Section, Subsection};
pub use parser::parse_document;
