//! Query matching and in-document highlighting.

pub mod engine;
pub mod highlight;
pub mod normalize;

pub use engine::{ParentRef, SearchEngine, SearchIndex, SearchOutput, SearchResult, top_level};
pub use highlight::highlight;
pub use normalize::{normalize, query_terms};
