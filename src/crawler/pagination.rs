//! Listing pagination and exhaustion detection
//!
//! Each seed URL walks `Start -> Listing(1) -> Listing(2) -> ... -> Exhausted`.
//! Listing URLs are either constructed (query parameter or path segment) or
//! reached by triggering a "next" control on the current page; the session
//! loop does not care which.

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::crawler::fetcher::Page;
use crate::crawler::transport::NextControl;
use crate::models::{CursorState, ExhaustionReason, SessionState};
use crate::parser::selectors::{compile_selectors, ANCHOR};
use crate::utils::error::ParseError;
use crate::utils::normalize_whitespace;

fn default_query_name() -> String {
    "page".to_string()
}

fn default_path_template() -> String {
    "page/{n}/".to_string()
}

fn default_next_selectors() -> Vec<String> {
    [
        "a[rel='next']",
        "a.next",
        ".nav-links a.next",
        "[uk-pagination-next]",
        ".uk-pagination-next a",
        "[uk-icon*='arrow-right']",
        ".pagination .next a",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_next_texts() -> Vec<String> {
    ["Next", "Next »", "Next Page", "Older posts", "›", "»"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_empty_page_threshold() -> u32 {
    3
}

fn default_max_pages() -> u32 {
    50
}

/// How listing page `n` is reached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaginationStrategy {
    /// `seed?page=n` (`&page=n` when the seed already has a query)
    QueryParam {
        #[serde(default = "default_query_name")]
        name: String,
    },

    /// `seed/` followed by a template such as `page/{n}/`
    PathSegment {
        #[serde(default = "default_path_template")]
        template: String,
    },

    /// Trigger a "next" control found on the current page
    NextControl {
        /// Attribute/class selectors, tried in order
        #[serde(default = "default_next_selectors")]
        selectors: Vec<String>,

        /// Link texts, compared case-insensitively
        #[serde(default = "default_next_texts")]
        texts: Vec<String>,
    },
}

impl Default for PaginationStrategy {
    fn default() -> Self {
        Self::PathSegment {
            template: default_path_template(),
        }
    }
}

impl PaginationStrategy {
    pub fn query(name: &str) -> Self {
        Self::QueryParam {
            name: name.to_string(),
        }
    }

    pub fn next_control() -> Self {
        Self::NextControl {
            selectors: default_next_selectors(),
            texts: default_next_texts(),
        }
    }
}

/// Pagination settings for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationPolicy {
    #[serde(default)]
    pub strategy: PaginationStrategy,

    /// Consecutive pages without a new record before giving up on a seed
    #[serde(default = "default_empty_page_threshold")]
    pub empty_page_threshold: u32,

    /// Hard page-count ceiling per seed
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

impl Default for PaginationPolicy {
    fn default() -> Self {
        Self {
            strategy: PaginationStrategy::default(),
            empty_page_threshold: default_empty_page_threshold(),
            max_pages: default_max_pages(),
        }
    }
}

/// How to obtain the next listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    /// Fetch this URL
    Url(String),
    /// Trigger this control on the current page
    Activate(NextControl),
}

/// Compiled [`PaginationPolicy`]
pub struct PaginationController {
    policy: PaginationPolicy,
    next_selectors: Vec<Selector>,
    next_texts: Vec<String>,
}

impl PaginationController {
    /// # Errors
    ///
    /// Returns `ParseError::InvalidSelector` if a next-control selector does not parse
    pub fn new(policy: &PaginationPolicy) -> Result<Self, ParseError> {
        let (next_selectors, next_texts) = match &policy.strategy {
            PaginationStrategy::NextControl { selectors, texts } => (
                compile_selectors(selectors)?,
                texts.iter().map(|t| normalize_whitespace(t).to_lowercase()).collect(),
            ),
            _ => (Vec::new(), Vec::new()),
        };

        Ok(Self {
            policy: policy.clone(),
            next_selectors,
            next_texts,
        })
    }

    pub fn policy(&self) -> &PaginationPolicy {
        &self.policy
    }

    /// Constructed URL of listing page `n`
    ///
    /// Page 1 is always the seed. Returns `None` for later pages when the
    /// source paginates through a next control.
    pub fn page_url(&self, seed: &str, page: u32) -> Option<String> {
        if page <= 1 {
            return Some(seed.to_string());
        }

        match &self.policy.strategy {
            PaginationStrategy::QueryParam { name } => {
                let separator = if seed.contains('?') { '&' } else { '?' };
                Some(format!("{seed}{separator}{name}={page}"))
            }
            PaginationStrategy::PathSegment { template } => {
                let base = if seed.ends_with('/') {
                    seed.to_string()
                } else {
                    format!("{seed}/")
                };
                Some(format!("{base}{}", template.replace("{n}", &page.to_string())))
            }
            PaginationStrategy::NextControl { .. } => None,
        }
    }

    /// Work out how to reach listing page `page`
    ///
    /// `current` is the previous listing page, needed only for next controls.
    pub fn next_request(
        &self,
        seed: &str,
        page: u32,
        current: Option<&Page>,
    ) -> Result<PageRequest, ExhaustionReason> {
        if let Some(url) = self.page_url(seed, page) {
            return Ok(PageRequest::Url(url));
        }

        let located = current.and_then(|p| self.locate_next_control(&p.body, &p.final_url));
        match located {
            Some(control) => {
                debug!(selector = %control.selector, page, "Next control located");
                Ok(PageRequest::Activate(control))
            }
            None => {
                info!(seed, page, "No next control, seed exhausted");
                Err(ExhaustionReason::NoNextControl)
            }
        }
    }

    /// Find a "next" control: selectors first, then link texts
    pub fn locate_next_control(&self, html: &str, page_url: &str) -> Option<NextControl> {
        let document = Html::parse_document(html);
        let base = Url::parse(page_url).ok();
        let absolute = |href: &str| match &base {
            Some(base) => base.join(href).ok().map(|u| u.to_string()),
            None => Some(href.to_string()),
        };

        for (selector, source) in self.next_selectors.iter().zip(self.selector_sources()) {
            if let Some(element) = document.select(selector).next() {
                let href = control_href(element).and_then(|h| absolute(h));
                return Some(NextControl {
                    selector: source.to_string(),
                    href,
                });
            }
        }

        if self.next_texts.is_empty() {
            return None;
        }
        document.select(&ANCHOR).find_map(|anchor| {
            let text = normalize_whitespace(&anchor.text().collect::<String>()).to_lowercase();
            if !self.next_texts.contains(&text) {
                return None;
            }
            let href = anchor.value().attr("href")?;
            Some(NextControl {
                selector: format!("a[href=\"{href}\"]"),
                href: absolute(href),
            })
        })
    }

    fn selector_sources(&self) -> &[String] {
        match &self.policy.strategy {
            PaginationStrategy::NextControl { selectors, .. } => selectors,
            _ => &[],
        }
    }

    /// Update session state after listing page `page` produced `new_records`
    ///
    /// The empty-page threshold is checked before the ceiling.
    pub fn after_page(&self, state: &mut SessionState, page: u32, new_records: usize) -> CursorState {
        state.record_page(new_records);

        state.cursor = if state.consecutive_empty_pages >= self.policy.empty_page_threshold {
            CursorState::Exhausted(ExhaustionReason::EmptyPages)
        } else if page >= self.policy.max_pages {
            CursorState::Exhausted(ExhaustionReason::PageCeiling)
        } else {
            CursorState::Listing(page + 1)
        };
        state.cursor
    }

    /// Mark the seed exhausted without touching the empty-page counter
    pub fn exhaust(&self, state: &mut SessionState, reason: ExhaustionReason) -> CursorState {
        state.cursor = CursorState::Exhausted(reason);
        state.cursor
    }
}

/// Destination of a next control: its own href, a link inside it, or the
/// link wrapping it
fn control_href(element: ElementRef<'_>) -> Option<&str> {
    if let Some(href) = element.value().attr("href") {
        return Some(href);
    }
    if let Some(inner) = element.select(&ANCHOR).next() {
        return inner.value().attr("href");
    }
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find_map(|ancestor| match ancestor.value().name() {
            "a" => ancestor.value().attr("href"),
            _ => None,
        })
}
