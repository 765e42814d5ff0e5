//! CSS selectors shared by the extractor, link filter and pagination
//!
//! Fixed selectors are compiled once; selectors coming from source profiles
//! are compiled through [`compile_selectors`] so a bad profile is reported
//! instead of panicking.

use lazy_static::lazy_static;
use scraper::Selector;

use crate::utils::error::ParseError;

// Helper macro to parse selectors safely at compile time
macro_rules! parse_selector {
    ($s:expr) => {
        Selector::parse($s).expect(concat!("Invalid CSS selector: ", $s))
    };
}

/// Subtrees that never contain article prose
pub const DEFAULT_NOISE: &[&str] = &[
    "script",
    "style",
    "noscript",
    "iframe",
    "form",
    "button",
    "figure figcaption",
    ".sharedaddy",
    ".jp-relatedposts",
    ".share-buttons",
    ".social-share",
    ".related-posts",
    ".wp-block-embed",
    ".advertisement",
    ".ads",
];

/// Generic containers tried after a profile's own body locators
pub const GENERIC_CONTAINERS: &[&str] = &["article", "main", "[role='main']"];

lazy_static! {
    pub static ref ANCHOR: Selector = parse_selector!("a[href]");
}

/// Compile one selector, reporting the offending text on failure
pub fn compile_selector(selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

/// Compile a list of selectors, keeping their order
pub fn compile_selectors<S: AsRef<str>>(selectors: &[S]) -> Result<Vec<Selector>, ParseError> {
    selectors
        .iter()
        .map(|s| compile_selector(s.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_noise_compiles() {
        let compiled = compile_selectors(DEFAULT_NOISE).unwrap();
        assert_eq!(compiled.len(), DEFAULT_NOISE.len());
    }

    #[test]
    fn test_generic_containers_compile() {
        assert!(compile_selectors(GENERIC_CONTAINERS).is_ok());
    }

    #[test]
    fn test_invalid_selector_reports_text() {
        match compile_selector("div[[") {
            Err(ParseError::InvalidSelector { selector, .. }) => assert_eq!(selector, "div[["),
            other => panic!("expected invalid selector, got {other:?}"),
        }
    }

    #[test]
    fn test_compile_owned_strings() {
        let owned = vec!["div.entry-content".to_string(), "article".to_string()];
        assert_eq!(compile_selectors(&owned).unwrap().len(), 2);
    }

    #[test]
    fn test_anchor_requires_href() {
        let html = scraper::Html::parse_fragment("<p><a href='/x'>x</a><a>y</a></p>");
        assert_eq!(html.select(&ANCHOR).count(), 1);
    }
}
