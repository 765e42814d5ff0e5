use anyhow::{Context, Result};
use std::path::PathBuf;

use balita::config::{builtin, Config, SourceProfile};
use balita::crawler::{HarvestSession, Harvester};
use balita::error::Error;
use balita::models::HarvestStats;
use balita::storage::{self, CsvDatasetWriter};

/// Options of the `harvest` subcommand
pub struct HarvestArgs {
    pub source: String,
    pub quota: Option<usize>,
    pub output: Option<PathBuf>,
    pub profile: Option<PathBuf>,
    pub merge_existing: bool,
    pub stats: Option<PathBuf>,
}

pub async fn harvest(mut config: Config, args: HarvestArgs) -> Result<()> {
    let mut profile = match &args.profile {
        Some(path) => SourceProfile::from_file(path)
            .with_context(|| format!("Failed to load profile from {}", path.display()))?,
        None => builtin(&args.source)?,
    };
    config.apply_to(&mut profile);

    if let Some(quota) = args.quota {
        config.harvest.quota = Some(quota);
    }
    if let Some(output) = args.output {
        config.harvest.output = output;
    }
    config.validate()?;

    let quota = config.quota_for(&profile);
    let output = config.harvest.output.clone();
    let source_name = profile.name.clone();

    println!("Starting harvest of {}", profile.display_name);
    println!("==========================");
    println!("  Quota per category: {quota}");
    println!("  Output: {}", output.display());

    let session = HarvestSession::http(profile, config.http.user_agent.clone())
        .context("Failed to build harvest session")?;
    let harvester = Harvester::new(session, config.harvest.shuffle_seed);
    let report = harvester.run(quota).await;

    for stats in &report.stats {
        print_category(stats);
    }
    if let Some(path) = &args.stats {
        storage::write_stats(path, &report.stats)?;
    }

    let mut dataset = report.dataset;
    if args.merge_existing && output.exists() {
        let (merged, added) = storage::csv::merge_existing(&output, dataset, config.harvest.shuffle_seed)
            .with_context(|| format!("Failed to merge with existing dataset {}", output.display()))?;
        println!("\nMerged {added} new rows into {} existing", merged.len() - added);
        dataset = merged;
    }

    if dataset.is_empty() {
        return Err(Error::EmptyDataset { source_name }.into());
    }

    let rows = CsvDatasetWriter::new(&output).write(&dataset)?;

    println!("\nHarvest Summary");
    println!("===============");
    for (label, count) in dataset.label_counts() {
        println!("{label}: {count}");
    }
    println!("Rows written: {rows}");
    println!("Output file: {}", output.display());

    Ok(())
}

fn print_category(stats: &HarvestStats) {
    println!("\nCategory '{}'", stats.category);
    println!("--------------");
    println!("Listing pages: {}", stats.pages_fetched);
    println!("Unavailable pages: {}", stats.pages_unavailable);
    println!("Candidates: {}", stats.candidates_seen);
    println!(
        "Records accepted: {} of {} fetched ({:.1}%)",
        stats.records_accepted,
        stats.articles_fetched,
        stats.acceptance_rate()
    );
    println!("Extraction misses: {}", stats.extraction_misses);
    println!("Fetch failures: {}", stats.fetch_failures);
    for (seed, reason) in &stats.exhausted_seeds {
        println!("  {seed}: {reason}");
    }
    println!("Duration: {}s", stats.duration_secs());
}
