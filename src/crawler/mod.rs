//! Paginated harvesting with politeness throttling
//!
//! This module implements the collection pipeline: fetching listing and
//! article pages, filtering candidate links, advancing pagination and
//! driving per-category sessions. [`Harvester`] runs both categories of a
//! source and assembles the final shuffled [`Dataset`].

pub mod fetcher;
pub mod headers;
pub mod links;
pub mod pagination;
pub mod session;
pub mod transport;

use std::collections::HashSet;
use tracing::info;

use crate::models::{Category, HarvestStats};
use crate::storage::Dataset;

pub use fetcher::{FetchClient, FetchOutcome, FetchPolicy, Page};
pub use session::{CategoryReport, HarvestSession};
pub use transport::{FetchMode, HttpTransport, NextControl, RawPage, Transport};

/// Result of a full two-category run
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub dataset: Dataset,
    /// One entry per category, in harvest order
    pub stats: Vec<HarvestStats>,
}

/// Runs the fact-check and general categories of one source in sequence
pub struct Harvester {
    session: HarvestSession,
    shuffle_seed: u64,
}

impl Harvester {
    pub fn new(session: HarvestSession, shuffle_seed: u64) -> Self {
        Self {
            session,
            shuffle_seed,
        }
    }

    pub fn session(&self) -> &HarvestSession {
        &self.session
    }

    /// Harvest `quota` records per category, merge and shuffle
    ///
    /// URLs collected by an earlier category are skipped by later ones, so
    /// every category quota counts only records that reach the dataset.
    pub async fn run(&self, quota: usize) -> HarvestReport {
        let mut dataset = Dataset::new();
        let mut stats = Vec::with_capacity(2);
        let mut visited = HashSet::new();

        for category in Category::all() {
            let report = self.session.run_excluding(category, quota, &visited).await;
            visited.extend(report.records.iter().map(|r| r.url.clone()));
            let collected = report.records.len();
            let added = dataset.merge(report.records);
            if added < collected {
                info!(
                    category = %category,
                    duplicates = collected - added,
                    "Dropped records already collected under another category"
                );
            }
            stats.push(report.stats);
        }

        dataset.shuffle(self.shuffle_seed);

        let counts = dataset.label_counts();
        info!(
            source = %self.session.profile().name,
            rows = dataset.len(),
            fake = counts.get("Fake").copied().unwrap_or(0),
            real = counts.get("True").copied().unwrap_or(0),
            "Harvest complete"
        );

        HarvestReport { dataset, stats }
    }
}
