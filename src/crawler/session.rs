//! Category harvest driver
//!
//! One [`HarvestSession`] owns the compiled stages for a source profile and
//! walks every seed URL of a category, listing page by listing page, until
//! the quota is met or every seed is exhausted. Failures below this level
//! are counted in [`HarvestStats`] and never abort the run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SourceProfile;
use crate::crawler::fetcher::{FetchClient, FetchOutcome, Page};
use crate::crawler::links::LinkFilter;
use crate::crawler::pagination::{PageRequest, PaginationController};
use crate::crawler::transport::Transport;
use crate::error::Result;
use crate::models::{ArticleRecord, Category, CursorState, ExhaustionReason, HarvestStats, SessionState};
use crate::parser::ContentExtractor;
use crate::utils::truncate_text;

/// Records and counters produced by one category harvest
#[derive(Debug, Clone)]
pub struct CategoryReport {
    pub records: Vec<ArticleRecord>,
    pub stats: HarvestStats,
}

/// Parameterized harvest engine for one source
pub struct HarvestSession {
    profile: SourceProfile,
    client: FetchClient,
    extractor: ContentExtractor,
    links: LinkFilter,
    pagination: PaginationController,
}

impl HarvestSession {
    /// Build a session over any transport
    ///
    /// # Errors
    ///
    /// Returns an error if the profile is invalid or one of its selectors or
    /// boilerplate markers does not compile
    pub fn new(profile: SourceProfile, transport: Arc<dyn Transport>) -> Result<Self> {
        let client = FetchClient::new(transport, profile.fetch.clone())?;
        Self::with_client(profile, client)
    }

    /// Build a session over plain HTTP
    pub fn http(profile: SourceProfile, user_agent: Option<String>) -> Result<Self> {
        let client = FetchClient::http(profile.fetch.clone(), user_agent)?;
        Self::with_client(profile, client)
    }

    pub fn with_client(profile: SourceProfile, client: FetchClient) -> Result<Self> {
        profile.validate()?;

        let extractor = ContentExtractor::new(&profile.extraction)?;
        let links = LinkFilter::new(&profile.links, &profile.home_url)?;
        let pagination = PaginationController::new(&profile.pagination)?;

        Ok(Self {
            profile,
            client,
            extractor,
            links,
            pagination,
        })
    }

    pub fn profile(&self) -> &SourceProfile {
        &self.profile
    }

    /// Harvest up to `quota` records for `category`
    ///
    /// Collecting fewer than `quota` records is a normal outcome.
    pub async fn run(&self, category: Category, quota: usize) -> CategoryReport {
        self.run_excluding(category, quota, &HashSet::new()).await
    }

    /// Harvest like [`run`](Self::run), never dispatching a URL in `visited`
    ///
    /// Used to carry the URLs of earlier categories so a shared article
    /// is neither fetched twice nor counted against this quota.
    pub async fn run_excluding(
        &self,
        category: Category,
        quota: usize,
        visited: &HashSet<String>,
    ) -> CategoryReport {
        let seeds = self.profile.seeds_for(category);
        let must_contain = seeds.must_contain.as_deref();
        let mut state = SessionState::new(category);
        state.seen_urls.extend(visited.iter().cloned());
        let mut stats = HarvestStats::new(category);

        info!(
            source = %self.profile.name,
            category = %category,
            quota,
            seeds = seeds.seeds.len(),
            excluded = visited.len(),
            "Starting category harvest"
        );

        for seed in &seeds.seeds {
            if state.quota_reached(quota) {
                break;
            }
            self.harvest_seed(&mut state, &mut stats, seed, must_contain, quota)
                .await;
        }

        stats.finish();
        info!(
            source = %self.profile.name,
            category = %category,
            collected = state.collected.len(),
            quota,
            pages = stats.pages_fetched,
            misses = stats.extraction_misses,
            failures = stats.fetch_failures,
            duration_secs = stats.duration_secs(),
            "Category harvest finished"
        );

        CategoryReport {
            records: state.into_records(),
            stats,
        }
    }

    /// Walk one seed URL until it is exhausted or the quota is met
    async fn harvest_seed(
        &self,
        state: &mut SessionState,
        stats: &mut HarvestStats,
        seed: &str,
        must_contain: Option<&str>,
        quota: usize,
    ) {
        state.begin_seed();
        let canonical: Vec<&str> = if self.profile.detect_redirects {
            vec![seed, self.profile.home_url.as_str()]
        } else {
            Vec::new()
        };

        let mut current: Option<Page> = None;
        let mut page = 1;

        while !state.quota_reached(quota) {
            state.cursor = CursorState::Listing(page);

            let request = match self.pagination.next_request(seed, page, current.as_ref()) {
                Ok(request) => request,
                Err(reason) => {
                    self.pagination.exhaust(state, reason);
                    Self::note_exhausted(stats, seed, page, reason);
                    return;
                }
            };

            let outcome = match (&request, current.as_ref()) {
                (PageRequest::Url(url), _) => self.client.fetch_listing(url, page, &canonical).await,
                (PageRequest::Activate(control), Some(previous)) => {
                    match self.client.activate(previous, control).await {
                        FetchOutcome::Success(next) if next.redirected_to_any(&canonical) => {
                            FetchOutcome::Redirected {
                                final_url: next.final_url,
                            }
                        }
                        outcome => outcome,
                    }
                }
                (PageRequest::Activate(_), None) => {
                    self.pagination.exhaust(state, ExhaustionReason::NoNextControl);
                    Self::note_exhausted(stats, seed, page, ExhaustionReason::NoNextControl);
                    return;
                }
            };

            let listing = match outcome {
                FetchOutcome::Success(listing) => {
                    stats.pages_fetched += 1;
                    Some(listing)
                }
                FetchOutcome::Redirected { final_url } => {
                    debug!(seed, page, final_url = %final_url, "Listing page redirected");
                    self.pagination.exhaust(state, ExhaustionReason::RedirectedHome);
                    Self::note_exhausted(stats, seed, page, ExhaustionReason::RedirectedHome);
                    return;
                }
                FetchOutcome::NotFound | FetchOutcome::Exhausted { .. } => {
                    // Unavailable listing pages count as pages without candidates
                    stats.pages_unavailable += 1;
                    None
                }
            };

            let new_records = match &listing {
                Some(listing) => {
                    self.harvest_listing(state, stats, listing, must_contain, quota)
                        .await
                }
                None => 0,
            };

            info!(
                seed,
                page,
                new_records,
                collected = state.collected.len(),
                "Listing page done"
            );

            current = listing;
            match self.pagination.after_page(state, page, new_records) {
                CursorState::Listing(next) => page = next,
                CursorState::Exhausted(reason) => {
                    Self::note_exhausted(stats, seed, page, reason);
                    return;
                }
                CursorState::Start => return,
            }
        }
    }

    /// Fetch and extract every unseen candidate on a listing page
    ///
    /// Returns the number of records appended.
    async fn harvest_listing(
        &self,
        state: &mut SessionState,
        stats: &mut HarvestStats,
        listing: &Page,
        must_contain: Option<&str>,
        quota: usize,
    ) -> usize {
        let candidates = self.links.filter(&listing.body, &listing.final_url, must_contain);
        stats.candidates_seen += candidates.len() as u32;

        let mut new_records = 0;
        for candidate in candidates {
            if state.quota_reached(quota) {
                break;
            }
            if !state.dispatch(&candidate.url) {
                debug!(url = %candidate.url, "Already visited");
                continue;
            }

            let article = match self.client.fetch(&candidate.url).await {
                FetchOutcome::Success(article) => article,
                _ => {
                    stats.fetch_failures += 1;
                    continue;
                }
            };
            stats.articles_fetched += 1;

            let text = match self.extractor.extract_article(&article.body) {
                Ok(text) => text,
                Err(e) => {
                    stats.extraction_misses += 1;
                    debug!(url = %candidate.url, error = %e, "Candidate discarded");
                    continue;
                }
            };

            info!(
                category = %state.category,
                url = %candidate.url,
                title = %truncate_text(&candidate.title, 60),
                chars = text.chars().count(),
                "Record accepted"
            );
            state.push(ArticleRecord::new(
                state.category,
                text,
                candidate.title,
                candidate.url,
                self.profile.display_name.as_str(),
            ));
            stats.records_accepted += 1;
            new_records += 1;

            if self.profile.settle_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.profile.settle_delay_ms)).await;
            }
        }

        new_records
    }

    fn note_exhausted(stats: &mut HarvestStats, seed: &str, page: u32, reason: ExhaustionReason) {
        if reason == ExhaustionReason::PageCeiling {
            warn!(seed, page, "Page ceiling reached");
        } else {
            info!(seed, page, reason = %reason, "Seed exhausted");
        }
        stats.exhausted_seeds.insert(seed.to_string(), reason);
    }
}
