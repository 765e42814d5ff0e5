//! Article body extraction with a fallback locator chain
//!
//! Publishers disagree on where the body lives, so the extractor tries an
//! ordered list of container locators and keeps the first one that yields
//! paragraph text. Only paragraph nodes contribute; noise subtrees are skipped
//! while walking the tree instead of being cut out of the markup.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::parser::sanitize::{boilerplate_patterns, clean_text};
use crate::parser::selectors::{compile_selector, compile_selectors, DEFAULT_NOISE, GENERIC_CONTAINERS};
use crate::utils::error::ParseError;

fn default_body_locators() -> Vec<String> {
    vec![
        "div.entry-content".to_string(),
        "div.post-content".to_string(),
    ]
}

fn default_noise_selectors() -> Vec<String> {
    DEFAULT_NOISE.iter().map(|s| s.to_string()).collect()
}

fn default_paragraph_selector() -> String {
    "p".to_string()
}

fn default_min_text_chars() -> usize {
    150
}

fn default_true() -> bool {
    true
}

/// Declarative extraction settings for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRules {
    /// Body containers, most specific first
    #[serde(default = "default_body_locators")]
    pub body_locators: Vec<String>,

    /// Try `article`, `main` and `[role=main]` after the body locators
    #[serde(default = "default_true")]
    pub generic_fallback: bool,

    /// Subtrees ignored inside the body
    #[serde(default = "default_noise_selectors")]
    pub noise_selectors: Vec<String>,

    #[serde(default = "default_paragraph_selector")]
    pub paragraph_selector: String,

    /// Phrases that start trailing boilerplate (matched case-insensitively)
    #[serde(default)]
    pub boilerplate_markers: Vec<String>,

    /// Shortest body, in characters, that counts as an article
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self {
            body_locators: default_body_locators(),
            generic_fallback: true,
            noise_selectors: default_noise_selectors(),
            paragraph_selector: default_paragraph_selector(),
            boilerplate_markers: Vec::new(),
            min_text_chars: default_min_text_chars(),
        }
    }
}

/// Compiled [`ExtractionRules`]
pub struct ContentExtractor {
    locators: Vec<Selector>,
    noise: Vec<Selector>,
    paragraph: Selector,
    markers: Vec<Regex>,
    min_text_chars: usize,
}

impl ContentExtractor {
    /// Compile extraction rules
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidSelector` or `ParseError::InvalidPattern`
    /// when a rule does not compile
    pub fn new(rules: &ExtractionRules) -> Result<Self, ParseError> {
        let mut locators = compile_selectors(&rules.body_locators)?;
        if rules.generic_fallback {
            locators.extend(compile_selectors(GENERIC_CONTAINERS)?);
        }

        Ok(Self {
            locators,
            noise: compile_selectors(&rules.noise_selectors)?,
            paragraph: compile_selector(&rules.paragraph_selector)?,
            markers: boilerplate_patterns(&rules.boilerplate_markers)?,
            min_text_chars: rules.min_text_chars,
        })
    }

    pub fn min_text_chars(&self) -> usize {
        self.min_text_chars
    }

    /// Extract cleaned body text, or an empty string when nothing matches
    pub fn extract(&self, html: &str) -> String {
        let document = Html::parse_document(html);

        for (index, locator) in self.locators.iter().enumerate() {
            for container in document.select(locator) {
                let raw = self.paragraph_text(container);
                let text = clean_text(&raw, &self.markers);
                if !text.is_empty() {
                    debug!(locator = index, chars = text.chars().count(), "Body locator matched");
                    return text;
                }
            }
        }

        String::new()
    }

    /// Extract body text that passes the length gate
    ///
    /// # Errors
    ///
    /// Returns `ParseError::ContentNotFound` when no locator yields text and
    /// `ParseError::TooShort` when the text is below the minimum
    pub fn extract_article(&self, html: &str) -> Result<String, ParseError> {
        let text = self.extract(html);
        if text.is_empty() {
            return Err(ParseError::ContentNotFound);
        }
        if !self.passes_length_gate(&text) {
            return Err(ParseError::TooShort {
                chars: text.chars().count(),
                min: self.min_text_chars,
            });
        }
        Ok(text)
    }

    /// Whether `text` is long enough to be kept
    pub fn passes_length_gate(&self, text: &str) -> bool {
        !text.is_empty() && text.chars().count() >= self.min_text_chars
    }

    /// Paragraph texts under `container`, joined by single spaces
    fn paragraph_text(&self, container: ElementRef<'_>) -> String {
        let noise = self.noise_within(container);
        let mut paragraphs = Vec::new();
        self.collect_paragraphs(container, &noise, &mut paragraphs);
        paragraphs.join(" ")
    }

    fn noise_within<'a>(&self, container: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.noise
            .iter()
            .flat_map(|selector| container.select(selector))
            .collect()
    }

    fn collect_paragraphs<'a>(&self, element: ElementRef<'a>, noise: &[ElementRef<'a>], out: &mut Vec<String>) {
        for child in element.children().filter_map(ElementRef::wrap) {
            if noise.contains(&child) {
                continue;
            }
            if self.paragraph.matches(&child) {
                let mut text = String::new();
                push_visible_text(child, noise, &mut text);
                if !text.trim().is_empty() {
                    out.push(text);
                }
            } else {
                self.collect_paragraphs(child, noise, out);
            }
        }
    }
}

/// Text of `element` without the text of nested noise
fn push_visible_text<'a>(element: ElementRef<'a>, noise: &[ElementRef<'a>], out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            if !noise.contains(&child) {
                push_visible_text(child, noise, out);
            }
        }
    }
}
