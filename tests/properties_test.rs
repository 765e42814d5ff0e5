//! Property tests for text cleaning and the extraction length gate

use balita::parser::{clean_text, ContentExtractor, ExtractionRules};
use proptest::prelude::*;

proptest! {
    #[test]
    fn cleaned_text_has_no_whitespace_runs(input in "[ a-zA-Z\t\n\u{a0}\u{200b}.,]{0,200}") {
        let cleaned = clean_text(&input, &[]);

        prop_assert!(!cleaned.contains("  "));
        prop_assert!(!cleaned.contains('\n'));
        prop_assert!(!cleaned.contains('\t'));
        prop_assert_eq!(cleaned.trim(), cleaned.as_str());
    }

    #[test]
    fn cleaning_is_idempotent(input in "[ a-zA-Z\t\n.,]{0,200}") {
        let once = clean_text(&input, &[]);
        prop_assert_eq!(clean_text(&once, &[]), once);
    }

    #[test]
    fn extracted_articles_respect_length_gate(
        words in prop::collection::vec("[a-z]{1,12}", 0..60),
        min in 1usize..300,
    ) {
        let html = format!("<div class=\"entry-content\"><p>{}</p></div>", words.join(" "));
        let rules = ExtractionRules {
            min_text_chars: min,
            ..ExtractionRules::default()
        };
        let extractor = ContentExtractor::new(&rules).unwrap();

        if let Ok(text) = extractor.extract_article(&html) {
            prop_assert!(text.chars().count() >= min);
        }
    }
}
