//! Dataset assembly and persistence
//!
//! A [`Dataset`] holds the merged output of every category harvest. It
//! enforces URL uniqueness (first record wins) and owns the seeded shuffle
//! applied before the rows are written.

pub mod csv;

use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use crate::error::Result;
use crate::models::{ArticleRecord, HarvestStats, Label};

pub use self::csv::CsvDatasetWriter;

/// Write per-category run statistics as pretty JSON
pub fn write_stats(path: &Path, stats: &[HarvestStats]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, stats)?;

    tracing::debug!(path = %path.display(), "Run statistics saved");
    Ok(())
}

/// Ordered collection of labeled records with unique URLs
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<ArticleRecord>,
    urls: HashSet<String>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dataset, dropping records whose URL was already taken
    pub fn from_records(records: impl IntoIterator<Item = ArticleRecord>) -> Self {
        let mut dataset = Self::new();
        for record in records {
            dataset.push(record);
        }
        dataset
    }

    /// Append a record; returns `false` if its URL is already present
    pub fn push(&mut self, record: ArticleRecord) -> bool {
        if !self.urls.insert(record.url.clone()) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Append every record of `other` whose URL is new, returning how many were added
    pub fn merge(&mut self, other: impl IntoIterator<Item = ArticleRecord>) -> usize {
        let mut added = 0;
        for record in other {
            if self.push(record) {
                added += 1;
            }
        }
        added
    }

    /// Shuffle rows with a deterministic seed
    pub fn shuffle(&mut self, seed: u64) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.records.shuffle(&mut rng);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn records(&self) -> &[ArticleRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ArticleRecord> {
        self.records
    }

    /// Row count per label
    pub fn label_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for label in [Label::Fake, Label::True] {
            counts.insert(label.as_str(), 0);
        }
        for record in &self.records {
            *counts.entry(record.label.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Category;

    fn record(category: Category, url: &str) -> ArticleRecord {
        ArticleRecord::new(
            category,
            format!("body of {url}"),
            format!("title of {url}"),
            url.to_string(),
            "Rappler",
        )
    }

    #[test]
    fn test_first_record_wins() {
        let mut dataset = Dataset::new();
        assert!(dataset.push(record(Category::FactCheck, "https://a.ph/1")));
        assert!(!dataset.push(record(Category::General, "https://a.ph/1")));

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records()[0].label, Label::Fake);
    }

    #[test]
    fn test_merge_counts_new_records() {
        let mut dataset = Dataset::from_records(vec![
            record(Category::FactCheck, "https://a.ph/1"),
            record(Category::FactCheck, "https://a.ph/2"),
        ]);
        let added = dataset.merge(vec![
            record(Category::General, "https://a.ph/2"),
            record(Category::General, "https://a.ph/3"),
        ]);

        assert_eq!(added, 1);
        assert_eq!(dataset.len(), 3);
        let counts = dataset.label_counts();
        assert_eq!(counts["Fake"], 2);
        assert_eq!(counts["True"], 1);
    }

    #[test]
    fn test_shuffle_is_deterministic() {
        let urls: Vec<String> = (0..20).map(|i| format!("https://a.ph/{i}")).collect();
        let build = || Dataset::from_records(urls.iter().map(|u| record(Category::General, u)));

        let mut first = build();
        let mut second = build();
        first.shuffle(42);
        second.shuffle(42);

        assert_eq!(first.records(), second.records());
        assert_ne!(first.records(), build().records());
        assert_eq!(first.len(), 20);
    }

    #[test]
    fn test_write_stats() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("stats.json");
        let mut stats = HarvestStats::new(Category::FactCheck);
        stats.records_accepted = 7;

        write_stats(&path, &[stats]).unwrap();

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json[0]["category"], "fact_check");
        assert_eq!(json[0]["records_accepted"], 7);
    }

    #[test]
    fn test_empty_dataset_counts() {
        let dataset = Dataset::new();
        assert!(dataset.is_empty());
        assert_eq!(dataset.label_counts()["Fake"], 0);
    }
}
