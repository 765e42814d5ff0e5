// Core data structures for the balita harvester

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Dataset label, derived only from the category being harvested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Fake,
    True,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fake => "Fake",
            Self::True => "True",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical harvest category
///
/// Fact-check sections feed the `Fake` class, every other section feeds `True`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FactCheck,
    General,
}

impl Category {
    /// Category key written to the dataset
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FactCheck => "fake",
            Self::General => "true",
        }
    }

    pub fn label(&self) -> Label {
        match self {
            Self::FactCheck => Label::Fake,
            Self::General => Label::True,
        }
    }

    /// Parse a category key (accepts the dataset keys and descriptive names)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "fake" | "fact-check" | "fact_check" | "factcheck" => Some(Self::FactCheck),
            "true" | "general" | "news" => Some(Self::General),
            _ => None,
        }
    }

    /// Harvest order: fact-check first, then general news
    pub fn all() -> [Self; 2] {
        [Self::FactCheck, Self::General]
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled article, the unit of output
///
/// Field order matches the dataset column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub text: String,
    pub label: Label,
    pub category: String,
    pub title: String,
    pub url: String,
    pub source: String,
}

impl ArticleRecord {
    pub fn new(
        category: Category,
        text: String,
        title: String,
        url: String,
        source: impl Into<String>,
    ) -> Self {
        Self {
            text,
            label: category.label(),
            category: category.as_str().to_string(),
            title,
            url,
            source: source.into(),
        }
    }
}

/// Why a seed URL stopped producing pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionReason {
    /// Too many consecutive pages without a new record
    EmptyPages,
    /// Hard page-count ceiling reached
    PageCeiling,
    /// Listing page redirected back to the seed or home URL
    RedirectedHome,
    /// No "next" control on the current page
    NoNextControl,
}

impl std::fmt::Display for ExhaustionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::EmptyPages => "empty pages",
            Self::PageCeiling => "page ceiling",
            Self::RedirectedHome => "redirected home",
            Self::NoNextControl => "no next control",
        };
        f.write_str(s)
    }
}

/// Per-category harvest counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestStats {
    pub category: Category,
    pub pages_fetched: u32,
    pub pages_unavailable: u32,
    pub candidates_seen: u32,
    pub articles_fetched: u32,
    pub records_accepted: u32,
    pub extraction_misses: u32,
    pub fetch_failures: u32,
    pub exhausted_seeds: BTreeMap<String, ExhaustionReason>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl HarvestStats {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            pages_fetched: 0,
            pages_unavailable: 0,
            candidates_seen: 0,
            articles_fetched: 0,
            records_accepted: 0,
            extraction_misses: 0,
            fetch_failures: 0,
            exhausted_seeds: BTreeMap::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Share of fetched articles that became records, as a percentage
    pub fn acceptance_rate(&self) -> f64 {
        if self.articles_fetched == 0 {
            0.0
        } else {
            (self.records_accepted as f64 / self.articles_fetched as f64) * 100.0
        }
    }

    pub fn duration_secs(&self) -> i64 {
        self.finished_at
            .map(|end| (end - self.started_at).num_seconds())
            .unwrap_or(0)
    }
}

/// Pagination position for one seed URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Start,
    Listing(u32),
    Exhausted(ExhaustionReason),
}

/// Transient state of one category harvest
///
/// Owned by the session driver and handed to each stage explicitly.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub category: Category,
    /// Records in discovery order
    pub collected: Vec<ArticleRecord>,
    /// Every URL ever dispatched for content extraction
    pub seen_urls: HashSet<String>,
    pub consecutive_empty_pages: u32,
    pub cursor: CursorState,
}

impl SessionState {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            collected: Vec::new(),
            seen_urls: HashSet::new(),
            consecutive_empty_pages: 0,
            cursor: CursorState::Start,
        }
    }

    /// Reset the per-seed fields before moving to the next seed URL
    pub fn begin_seed(&mut self) {
        self.consecutive_empty_pages = 0;
        self.cursor = CursorState::Start;
    }

    pub fn quota_reached(&self, quota: usize) -> bool {
        self.collected.len() >= quota
    }

    /// Mark a URL as dispatched; returns `false` when it was already seen
    pub fn dispatch(&mut self, url: &str) -> bool {
        self.seen_urls.insert(url.to_string())
    }

    pub fn push(&mut self, record: ArticleRecord) {
        self.collected.push(record);
    }

    /// Update the empty-page counter after a listing page
    pub fn record_page(&mut self, new_records: usize) {
        if new_records == 0 {
            self.consecutive_empty_pages += 1;
        } else {
            self.consecutive_empty_pages = 0;
        }
    }

    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.collected
    }
}
