//! Text sanitization utilities for cleaning extracted article content
//!
//! This module cleans paragraph text pulled out of article pages: invisible
//! characters and leftover entities go, source boilerplate is cut off, and
//! whitespace is collapsed so no run of whitespace survives.

use regex::{Regex, RegexBuilder};

use crate::utils::error::ParseError;
use crate::utils::normalize_whitespace;

/// Clean extracted article text
///
/// Steps, in order:
/// 1. Remove zero-width characters
/// 2. Remove control characters
/// 3. Decode HTML entities left in the text
/// 4. Collapse whitespace runs to one space
/// 5. Cut everything from the first boilerplate marker onward
/// 6. Trim
///
/// # Examples
///
/// ```
/// use balita::parser::sanitize::{boilerplate_patterns, clean_text};
///
/// let markers = boilerplate_patterns(&["Follow us on"]).unwrap();
/// let clean = clean_text("Body\u{200B} text.\n\n FOLLOW US ON Facebook", &markers);
/// assert_eq!(clean, "Body text.");
/// ```
pub fn clean_text(text: &str, markers: &[Regex]) -> String {
    let mut result = remove_zero_width(text);
    result = remove_control_chars(&result);
    result = decode_html_entities(&result);
    result = normalize_whitespace(&result);
    result = truncate_at_boilerplate(&result, markers);

    result.trim().to_string()
}

/// Compile boilerplate markers into case-insensitive literal patterns
///
/// # Errors
///
/// Returns `ParseError::InvalidPattern` if a marker cannot be compiled
pub fn boilerplate_patterns<S: AsRef<str>>(markers: &[S]) -> Result<Vec<Regex>, ParseError> {
    markers
        .iter()
        .map(|marker| {
            let marker = marker.as_ref();
            // Markers are plain phrases; spacing inside them matches any whitespace run
            let pattern = marker
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+");
            if pattern.is_empty() {
                return Err(ParseError::InvalidPattern {
                    pattern: marker.to_string(),
                    reason: "marker is empty".to_string(),
                });
            }
            RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .build()
                .map_err(|e| ParseError::InvalidPattern {
                    pattern: marker.to_string(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

/// Cut the text at the earliest occurrence of any marker
pub fn truncate_at_boilerplate(text: &str, markers: &[Regex]) -> String {
    let cut = markers
        .iter()
        .filter_map(|re| re.find(text).map(|m| m.start()))
        .min();

    match cut {
        Some(index) => text[..index].to_string(),
        None => text.to_string(),
    }
}

/// Remove zero-width spaces and similar invisible characters
///
/// # Examples
///
/// ```
/// use balita::parser::sanitize::remove_zero_width;
///
/// assert_eq!(remove_zero_width("Da\u{200B}vao\u{FEFF}"), "Davao");
/// ```
pub fn remove_zero_width(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(*c, '\u{200B}'..='\u{200F}' | '\u{2060}' | '\u{FEFF}'))
        .collect()
}

/// Remove control characters except newline and tab
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

/// Decode HTML entities that survived parsing (double-escaped markup)
///
/// # Examples
///
/// ```
/// use balita::parser::sanitize::decode_html_entities;
///
/// assert_eq!(decode_html_entities("Senate &amp; House"), "Senate & House");
/// ```
pub fn decode_html_entities(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(list: &[&str]) -> Vec<Regex> {
        boilerplate_patterns(list).unwrap()
    }

    #[test]
    fn test_clean_text_collapses_whitespace() {
        let clean = clean_text("  The   quick\n\n brown\tfox  ", &[]);
        assert_eq!(clean, "The quick brown fox");
    }

    #[test]
    fn test_clean_text_removes_invisible_chars() {
        let clean = clean_text("Zero\u{200B}width\u{0007} bell", &[]);
        assert_eq!(clean, "Zerowidth bell");
    }

    #[test]
    fn test_boilerplate_is_case_insensitive() {
        let m = markers(&["MindaNews is the news service arm"]);
        let clean = clean_text(
            "Story body. MINDANEWS IS THE NEWS SERVICE ARM of the Mindanao News and Information Cooperative Center.",
            &m,
        );
        assert_eq!(clean, "Story body.");
    }

    #[test]
    fn test_earliest_marker_wins() {
        let m = markers(&["READ ALSO", "MindaNews is the news service arm"]);
        let clean = clean_text(
            "Lead. MindaNews is the news service arm ... READ ALSO: other story",
            &m,
        );
        assert_eq!(clean, "Lead.");
    }

    #[test]
    fn test_marker_matches_across_line_breaks() {
        let m = markers(&["Follow us on"]);
        let clean = clean_text("Fact check done.\nFollow\n  us on X and Facebook", &m);
        assert_eq!(clean, "Fact check done.");
    }

    #[test]
    fn test_marker_with_typographic_quote() {
        let m = markers(&["Editor’s Note:"]);
        let clean = clean_text("Claim is false. editor’s note: this was updated", &m);
        assert_eq!(clean, "Claim is false.");
    }

    #[test]
    fn test_marker_text_is_literal() {
        let m = markers(&["(Photo)"]);
        assert_eq!(clean_text("Caption free (photo) credit", &m), "Caption free");
        assert_eq!(clean_text("Photo credit", &m), "Photo credit");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_html_entities("&lt;b&gt; &quot;hi&quot;"), "<b> \"hi\"");
        let clean = clean_text("a&nbsp;&nbsp;b", &[]);
        assert_eq!(clean, "a b");
    }

    #[test]
    fn test_empty_marker_rejected() {
        assert!(matches!(
            boilerplate_patterns(&["  "]),
            Err(ParseError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_no_markers_keeps_text() {
        assert_eq!(truncate_at_boilerplate("keep all", &[]), "keep all");
    }
}
