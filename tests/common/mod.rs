//! Common test utilities
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use balita::config::{CategorySeeds, SourceProfile};
use balita::crawler::links::LinkRules;
use balita::crawler::pagination::PaginationPolicy;
use balita::crawler::{FetchMode, FetchPolicy, RawPage, Transport};
use balita::parser::ExtractionRules;
use balita::utils::error::FetchError;

pub const HOME: &str = "https://site.example/";
pub const FACT_SEED: &str = "https://site.example/category/fact-check";
pub const NEWS_SEED: &str = "https://site.example/category/news";

/// In-memory site: fixed responses by URL, 404 for everything else
pub struct ScriptedSite {
    pages: HashMap<String, RawPage>,
    mode: FetchMode,
    snapshots: Mutex<VecDeque<RawPage>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            mode: FetchMode::Http,
            snapshots: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve `body` at `url`
    pub fn page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), RawPage::new(200, url, body));
        self
    }

    /// Serve `body` for `url` as if the server redirected to `final_url`
    pub fn redirect(mut self, url: &str, final_url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), RawPage::new(200, final_url, body));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(url.to_string(), RawPage::new(status, url, ""));
        self
    }

    /// Behave like a browser transport whose later DOM reads return `snapshots`
    pub fn rendered(mut self, snapshots: Vec<RawPage>) -> Self {
        self.mode = FetchMode::Rendered;
        self.snapshots = Mutex::new(snapshots.into());
        self
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.as_str() == url).count()
    }
}

#[async_trait]
impl Transport for ScriptedSite {
    async fn get(&self, url: &str) -> Result<RawPage, FetchError> {
        self.requests.lock().unwrap().push(url.to_string());
        Ok(self
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| RawPage::new(404, url, "")))
    }

    fn mode(&self) -> FetchMode {
        self.mode
    }

    async fn snapshot(&self) -> Option<RawPage> {
        self.snapshots.lock().unwrap().pop_front()
    }
}

/// Listing page with one `h2` headline link per entry
pub fn listing_html(links: &[(String, String)]) -> String {
    let items: String = links
        .iter()
        .map(|(href, title)| format!("<h2><a href=\"{href}\">{title}</a></h2>\n"))
        .collect();
    format!("<html><body><nav><a href=\"/\">Home</a><a href=\"/category/news/\">News</a></nav><main>{items}</main></body></html>")
}

/// Fact-check headline links for articles `range`
pub fn fact_links(range: std::ops::Range<usize>) -> Vec<(String, String)> {
    range
        .map(|n| {
            (
                format!("/fact-check/claim-{n}/"),
                format!("Fact check number {n} on a viral claim"),
            )
        })
        .collect()
}

pub fn fact_url(n: usize) -> String {
    format!("https://site.example/fact-check/claim-{n}/")
}

/// WordPress-style article whose body is well past the length gate
pub fn article_html(slug: &str) -> String {
    format!(
        "<html><body><article><div class=\"entry-content\">\
         <p>Report {slug}: a post shared widely on social media this week made a claim about public funds.</p>\
         <div class=\"share-buttons\"><p>Share on Facebook</p></div>\
         <p>Records obtained from the agency show the figures cited in the post were from a different year.</p>\
         </div></article></body></html>"
    )
}

/// Article with a single short paragraph, below the length gate
pub fn stub_article_html() -> String {
    "<html><body><div class=\"entry-content\"><p>Developing story.</p></div></body></html>".to_string()
}

/// Profile for `site.example` with every wait disabled
pub fn test_profile() -> SourceProfile {
    SourceProfile {
        name: "example".to_string(),
        display_name: "Example News".to_string(),
        home_url: HOME.to_string(),
        fact_check: CategorySeeds {
            seeds: vec![FACT_SEED.to_string()],
            must_contain: Some("/fact-check/".to_string()),
        },
        general: CategorySeeds {
            seeds: vec![NEWS_SEED.to_string()],
            must_contain: None,
        },
        links: LinkRules::default(),
        extraction: ExtractionRules::default(),
        pagination: PaginationPolicy::default(),
        fetch: FetchPolicy::immediate(),
        settle_delay_ms: 0,
        detect_redirects: true,
        default_quota: 5,
    }
}

/// URL of listing page `n` under the default path strategy
pub fn page_url(seed: &str, n: u32) -> String {
    if n <= 1 {
        seed.to_string()
    } else {
        format!("{seed}/page/{n}/")
    }
}
