//! HTML parsing and article text extraction
//!
//! This module turns fetched article pages into clean body text.

pub mod extract;
pub mod sanitize;
pub mod selectors;

// Re-export main extractor and public types
pub use extract::{ContentExtractor, ExtractionRules};
pub use sanitize::clean_text;
