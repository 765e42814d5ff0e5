//! Source profiles: seeds and tuning for each publisher
//!
//! A profile is the declarative description of one site. The harvest engine
//! has no per-site branches; everything that differs between publishers lives
//! here. Four profiles are built in and more can be loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::crawler::fetcher::FetchPolicy;
use crate::crawler::links::{LinkRules, ShortJunkRule};
use crate::crawler::pagination::{PaginationPolicy, PaginationStrategy};
use crate::models::Category;
use crate::parser::ExtractionRules;
use crate::utils::error::ConfigError;

fn default_quota() -> usize {
    1500
}

fn default_true() -> bool {
    true
}

/// Seed URLs for one category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySeeds {
    /// Listing pages, harvested in order
    pub seeds: Vec<String>,

    /// Path segment every candidate link must contain, e.g. `/fact-check/`
    #[serde(default)]
    pub must_contain: Option<String>,
}

impl CategorySeeds {
    fn new(seeds: &[&str]) -> Self {
        Self {
            seeds: seeds.iter().map(|s| s.to_string()).collect(),
            must_contain: None,
        }
    }

    fn must_contain(mut self, segment: &str) -> Self {
        self.must_contain = Some(segment.to_string());
        self
    }
}

/// Everything the harvest engine needs to know about one publisher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProfile {
    /// Lookup key, e.g. `pressone`
    pub name: String,

    /// Value of the `source` column
    pub display_name: String,

    /// Site root; links leaving it are dropped and redirects to it end pagination
    pub home_url: String,

    pub fact_check: CategorySeeds,
    pub general: CategorySeeds,

    #[serde(default)]
    pub links: LinkRules,

    #[serde(default)]
    pub extraction: ExtractionRules,

    #[serde(default)]
    pub pagination: PaginationPolicy,

    #[serde(default)]
    pub fetch: FetchPolicy,

    /// Pause after each accepted record
    #[serde(default)]
    pub settle_delay_ms: u64,

    /// Treat a later listing page landing on the seed or home URL as the end
    #[serde(default = "default_true")]
    pub detect_redirects: bool,

    /// Records per category when no quota is given
    #[serde(default = "default_quota")]
    pub default_quota: usize,
}

impl SourceProfile {
    /// Load a profile from a TOML file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed or validated
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let profile: Self = toml::from_str(&content).map_err(|source| ConfigError::Toml {
            path: path.display().to_string(),
            source,
        })?;

        profile.validate()?;
        Ok(profile)
    }

    /// Check that the profile can drive a harvest
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::invalid("name", "must not be empty"));
        }
        if url::Url::parse(&self.home_url).is_err() {
            return Err(ConfigError::invalid(
                "home_url",
                format!("'{}' is not an absolute URL", self.home_url),
            ));
        }
        for category in Category::all() {
            let seeds = self.seeds_for(category);
            if seeds.seeds.is_empty() {
                return Err(ConfigError::invalid(
                    format!("{}.seeds", category_field(category)),
                    "at least one seed URL is required",
                ));
            }
            if let Some(bad) = seeds.seeds.iter().find(|s| url::Url::parse(s).is_err()) {
                return Err(ConfigError::invalid(
                    format!("{}.seeds", category_field(category)),
                    format!("'{bad}' is not an absolute URL"),
                ));
            }
        }
        if self.pagination.empty_page_threshold == 0 {
            return Err(ConfigError::invalid(
                "pagination.empty_page_threshold",
                "must be greater than 0",
            ));
        }
        if self.pagination.max_pages == 0 {
            return Err(ConfigError::invalid("pagination.max_pages", "must be greater than 0"));
        }
        if self.fetch.max_attempts == 0 {
            return Err(ConfigError::invalid("fetch.max_attempts", "must be greater than 0"));
        }
        Ok(())
    }

    pub fn seeds_for(&self, category: Category) -> &CategorySeeds {
        match category {
            Category::FactCheck => &self.fact_check,
            Category::General => &self.general,
        }
    }
}

fn category_field(category: Category) -> &'static str {
    match category {
        Category::FactCheck => "fact_check",
        Category::General => "general",
    }
}

/// Names of the built-in profiles
pub fn builtin_names() -> &'static [&'static str] {
    &["rappler", "verafiles", "pressone", "mindanews"]
}

/// Look up a built-in profile by name (case-insensitive)
pub fn builtin(name: &str) -> Result<SourceProfile, ConfigError> {
    match name.to_lowercase().as_str() {
        "rappler" => Ok(rappler()),
        "verafiles" | "vera-files" => Ok(verafiles()),
        "pressone" => Ok(pressone()),
        "mindanews" => Ok(mindanews()),
        _ => Err(ConfigError::UnknownSource(name.to_string())),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn fetch_policy(min_interval_ms: u64) -> FetchPolicy {
    FetchPolicy {
        min_interval_ms,
        request_timeout_secs: 30,
        ..FetchPolicy::default()
    }
}

/// Rappler: headline anchors inside `h3`, WordPress paging
pub fn rappler() -> SourceProfile {
    SourceProfile {
        name: "rappler".to_string(),
        display_name: "Rappler".to_string(),
        home_url: "https://www.rappler.com/".to_string(),
        fact_check: CategorySeeds::new(&["https://www.rappler.com/section/newsbreak/fact-check/"]),
        general: CategorySeeds::new(&[
            "https://www.rappler.com/section/nation/",
            "https://www.rappler.com/section/business/",
            "https://www.rappler.com/section/life-and-style/",
        ]),
        links: LinkRules {
            anchor_selector: "h3 a[href]".to_string(),
            require_segments: Vec::new(),
            reject_segments: Vec::new(),
            min_title_chars: Some(21),
            ..LinkRules::default()
        },
        extraction: ExtractionRules {
            body_locators: strings(&["div.post-content", "div.entry-content"]),
            min_text_chars: 151,
            ..ExtractionRules::default()
        },
        pagination: PaginationPolicy {
            strategy: PaginationStrategy::default(),
            empty_page_threshold: 3,
            max_pages: 50,
        },
        fetch: fetch_policy(2000),
        settle_delay_ms: 500,
        detect_redirects: true,
        default_quota: 3000,
    }
}

/// Vera Files: every `/articles/` link, `?page=n` paging
pub fn verafiles() -> SourceProfile {
    SourceProfile {
        name: "verafiles".to_string(),
        display_name: "Vera Files".to_string(),
        home_url: "https://verafiles.org/".to_string(),
        fact_check: CategorySeeds::new(&["https://verafiles.org/articles/category/fact-check"]),
        general: CategorySeeds::new(&[
            "https://verafiles.org/articles/category/updates",
            "https://verafiles.org/articles/category/features",
            "https://verafiles.org/articles/category/profiles",
            "https://verafiles.org/articles/category/commentary",
        ]),
        links: LinkRules {
            require_segments: strings(&["/articles/"]),
            reject_segments: strings(&["/category/"]),
            min_title_chars: Some(21),
            ..LinkRules::default()
        },
        extraction: ExtractionRules {
            body_locators: strings(&[
                "div.uk-article-content",
                "div.entry-content",
                "div.article-content",
            ]),
            generic_fallback: false,
            min_text_chars: 101,
            ..ExtractionRules::default()
        },
        pagination: PaginationPolicy {
            strategy: PaginationStrategy::query("page"),
            empty_page_threshold: 3,
            max_pages: 100,
        },
        fetch: fetch_policy(1000),
        settle_delay_ms: 200,
        detect_redirects: true,
        default_quota: 200,
    }
}

/// PressOne.PH: all anchors, strict navigation filter, redirect-aware paging
pub fn pressone() -> SourceProfile {
    SourceProfile {
        name: "pressone".to_string(),
        display_name: "PressOne.PH".to_string(),
        home_url: "https://pressone.ph/".to_string(),
        fact_check: CategorySeeds::new(&["https://pressone.ph/fact-check/"]).must_contain("/fact-check/"),
        general: CategorySeeds::new(&["https://pressone.ph/news/", "https://pressone.ph/opinion/"]),
        links: LinkRules {
            min_title_chars: Some(25),
            ..LinkRules::default()
        },
        extraction: ExtractionRules {
            body_locators: strings(&["div.entry-content", "div.post-content"]),
            boilerplate_markers: strings(&["Follow us on", "Editor’s Note:"]),
            min_text_chars: 151,
            ..ExtractionRules::default()
        },
        pagination: PaginationPolicy {
            strategy: PaginationStrategy::default(),
            empty_page_threshold: 4,
            max_pages: 150,
        },
        fetch: fetch_policy(2000),
        settle_delay_ms: 500,
        detect_redirects: true,
        default_quota: 1500,
    }
}

/// MindaNews: `h2.entry-title` headlines, footer boilerplate removal
pub fn mindanews() -> SourceProfile {
    SourceProfile {
        name: "mindanews".to_string(),
        display_name: "MindaNews".to_string(),
        home_url: "https://mindanews.com/".to_string(),
        fact_check: CategorySeeds::new(&["https://mindanews.com/category/fact-check/"]),
        general: CategorySeeds::new(&[
            "https://mindanews.com/category/top-stories/",
            "https://mindanews.com/category/peace-process/",
            "https://mindanews.com/category/environment/",
            "https://mindanews.com/category/business/",
        ]),
        links: LinkRules {
            anchor_selector: "h2.entry-title a[href]".to_string(),
            reject_segments: Vec::new(),
            min_title_chars: Some(11),
            short_junk: Some(ShortJunkRule {
                terms: strings(&["photo"]),
                below_chars: 20,
            }),
            ..LinkRules::default()
        },
        extraction: ExtractionRules {
            body_locators: strings(&["div.entry-content"]),
            generic_fallback: false,
            boilerplate_markers: strings(&["MindaNews is the news service arm", "READ ALSO"]),
            min_text_chars: 151,
            ..ExtractionRules::default()
        },
        pagination: PaginationPolicy {
            strategy: PaginationStrategy::default(),
            empty_page_threshold: 3,
            max_pages: 30,
        },
        fetch: FetchPolicy {
            rate_limited_delay_ms: 10_000,
            ..fetch_policy(3000)
        },
        settle_delay_ms: 1000,
        detect_redirects: true,
        default_quota: 1500,
    }
}
