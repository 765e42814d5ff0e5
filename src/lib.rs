//! balita - Labeled news dataset harvester
//!
//! Collects articles from publisher websites into a dataset labeled `Fake`
//! (fact-check sections) or `True` (general news sections), for training
//! text classifiers.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Run configuration and per-source profiles
//! - [`crawler`] - Fetching, link filtering, pagination and harvest sessions
//! - [`parser`] - Article body extraction and text cleaning
//! - [`models`] - Core data structures and types
//! - [`storage`] - Dataset assembly and CSV output
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use balita::config::{builtin, Config};
//! use balita::crawler::{HarvestSession, Harvester};
//! use balita::storage::CsvDatasetWriter;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let mut profile = builtin("verafiles")?;
//!     config.apply_to(&mut profile);
//!
//!     let quota = config.quota_for(&profile);
//!     let session = HarvestSession::http(profile, None)?;
//!     let report = Harvester::new(session, config.harvest.shuffle_seed).run(quota).await;
//!     CsvDatasetWriter::new(&config.harvest.output).write(&report.dataset)?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod crawler;
pub mod error;
pub mod models;
pub mod parser;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, SourceProfile};
    pub use crate::crawler::{HarvestSession, Harvester, Transport};
    pub use crate::error::{BalitaErrorTrait, Error, ErrorCategory, Result};
    pub use crate::models::{ArticleRecord, Category, HarvestStats, Label};
    pub use crate::parser::ContentExtractor;
    pub use crate::storage::{CsvDatasetWriter, Dataset};
}

// Direct re-exports for convenience
pub use models::{ArticleRecord, Category, Label};
