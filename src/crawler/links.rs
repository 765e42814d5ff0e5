//! Article link discovery on listing pages
//!
//! Listing pages mix article links with menus, tag clouds, pagination and
//! share buttons. [`LinkFilter`] keeps the anchors that look like articles and
//! resolves them to absolute URLs. Deduplication is left to the session, since
//! the same article shows up again across page boundaries.

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::parser::selectors::compile_selector;
use crate::utils::error::ParseError;
use crate::utils::{normalize_whitespace, same_site, trailing_path_segment};

fn default_anchor_selector() -> String {
    "a[href]".to_string()
}

fn default_reject_segments() -> Vec<String> {
    ["/page/", "/category/", "/tag/", "/author/", "#"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_min_title_chars() -> Option<usize> {
    Some(21)
}

fn default_true() -> bool {
    true
}

/// Which anchors on a listing page count as article links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRules {
    /// Anchors to consider, e.g. `h3 a[href]`
    #[serde(default = "default_anchor_selector")]
    pub anchor_selector: String,

    /// The href must contain at least one of these (empty: no requirement)
    #[serde(default)]
    pub require_segments: Vec<String>,

    /// The href must contain none of these
    #[serde(default = "default_reject_segments")]
    pub reject_segments: Vec<String>,

    /// Drop links that leave the site
    #[serde(default = "default_true")]
    pub same_site_only: bool,

    /// Shortest anchor text accepted; `None` keeps short headlines too
    #[serde(default = "default_min_title_chars")]
    pub min_title_chars: Option<usize>,

    /// Titles containing any of these (case-insensitive) are not articles
    #[serde(default)]
    pub junk_titles: Vec<String>,

    /// Junk terms that only disqualify short titles, such as photo captions
    #[serde(default)]
    pub short_junk: Option<ShortJunkRule>,
}

/// Junk terms applied to titles shorter than `below_chars`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortJunkRule {
    pub terms: Vec<String>,
    pub below_chars: usize,
}

impl Default for LinkRules {
    fn default() -> Self {
        Self {
            anchor_selector: default_anchor_selector(),
            require_segments: Vec::new(),
            reject_segments: default_reject_segments(),
            same_site_only: true,
            min_title_chars: default_min_title_chars(),
            junk_titles: Vec::new(),
            short_junk: None,
        }
    }
}

/// An article link found on a listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute URL without fragment
    pub url: String,
    pub title: String,
}

/// Compiled [`LinkRules`] for one site
pub struct LinkFilter {
    anchors: Selector,
    rules: LinkRules,
    junk: Vec<String>,
    home_url: String,
}

impl LinkFilter {
    /// Compile link rules for the site rooted at `home_url`
    ///
    /// # Errors
    ///
    /// Returns `ParseError::InvalidSelector` if the anchor selector does not parse
    pub fn new(rules: &LinkRules, home_url: &str) -> Result<Self, ParseError> {
        Ok(Self {
            anchors: compile_selector(&rules.anchor_selector)?,
            junk: rules.junk_titles.iter().map(|j| j.to_lowercase()).collect(),
            rules: rules.clone(),
            home_url: home_url.to_string(),
        })
    }

    pub fn rules(&self) -> &LinkRules {
        &self.rules
    }

    /// Article candidates on a listing page, in document order
    ///
    /// `must_contain` is the category's own path requirement, e.g.
    /// `/fact-check/`. Relative links resolve against `page_url`.
    pub fn filter(&self, html: &str, page_url: &str, must_contain: Option<&str>) -> Vec<Candidate> {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url)
            .or_else(|_| Url::parse(&self.home_url))
            .ok();

        let mut total = 0;
        let mut candidates = Vec::new();
        for anchor in document.select(&self.anchors) {
            let Some(href) = anchor.value().attr("href").map(str::trim) else {
                continue;
            };
            if href.is_empty() {
                continue;
            }
            total += 1;

            if !self.path_allowed(href, must_contain) {
                continue;
            }

            let title = normalize_whitespace(&anchor.text().collect::<String>());
            if !self.title_allowed(&title) {
                continue;
            }

            let Some(url) = base.as_ref().and_then(|b| resolve(b, href)) else {
                continue;
            };
            if self.rules.same_site_only && !same_site(&url, &self.home_url) {
                continue;
            }

            let title = if title.is_empty() {
                trailing_path_segment(&url).unwrap_or_else(|| url.clone())
            } else {
                title
            };
            candidates.push(Candidate { url, title });
        }

        debug!(
            page = page_url,
            anchors = total,
            kept = candidates.len(),
            "Filtered listing links"
        );
        candidates
    }

    /// Containment rules, applied to the href as written in the page
    fn path_allowed(&self, href: &str, must_contain: Option<&str>) -> bool {
        if self.rules.reject_segments.iter().any(|s| href.contains(s.as_str())) {
            return false;
        }
        if !self.rules.require_segments.is_empty()
            && !self.rules.require_segments.iter().any(|s| href.contains(s.as_str()))
        {
            return false;
        }
        match must_contain {
            Some(segment) if !segment.is_empty() => href.contains(segment),
            _ => true,
        }
    }

    fn title_allowed(&self, title: &str) -> bool {
        if let Some(min) = self.rules.min_title_chars {
            if title.chars().count() < min {
                return false;
            }
        }
        let lowered = title.to_lowercase();
        if self.junk.iter().any(|junk| lowered.contains(junk.as_str())) {
            return false;
        }
        match &self.rules.short_junk {
            Some(rule) if title.chars().count() < rule.below_chars => !rule
                .terms
                .iter()
                .any(|term| lowered.contains(&term.to_lowercase())),
            _ => true,
        }
    }
}

/// Resolve an href to an absolute http(s) URL without fragment
fn resolve(base: &Url, href: &str) -> Option<String> {
    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.to_string())
}
