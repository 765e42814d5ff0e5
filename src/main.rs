use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use balita::config::Config;

mod commands;

#[derive(Parser)]
#[command(
    name = "balita",
    version,
    about = "Harvests labeled fact-check and general news datasets from Philippine publishers",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); defaults to the configured format
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Harvest one source into a labeled CSV dataset
    Harvest {
        /// Built-in source profile (see `balita sources`)
        #[arg(short, long, default_value = "pressone")]
        source: String,

        /// Records per category
        #[arg(short, long)]
        quota: Option<usize>,

        /// Dataset file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run configuration file (TOML); environment variables are used otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Source profile file (TOML), replaces the built-in profile
        #[arg(short, long)]
        profile: Option<PathBuf>,

        /// Merge with the rows already in the output file
        #[arg(long, default_value = "false")]
        merge_existing: bool,

        /// Also write per-category statistics to this JSON file
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// List built-in source profiles
    Sources,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.command {
        Commands::Harvest { config, .. } => config.clone(),
        Commands::Sources => None,
    };
    let config = match &config_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::from_env().context("Invalid BALITA_* environment")?,
    };

    let log_format = cli.log_format.as_deref().unwrap_or(&config.logging.format);
    setup_tracing(log_format, &config.logging.level, cli.verbose)?;

    match cli.command {
        Commands::Harvest {
            source,
            quota,
            output,
            config: _,
            profile,
            merge_existing,
            stats,
        } => {
            tracing::info!(
                source = %source,
                quota = ?quota,
                output = ?output,
                profile = ?profile,
                merge_existing,
                "Starting harvest command"
            );
            commands::harvest(
                config,
                commands::HarvestArgs {
                    source,
                    quota,
                    output,
                    profile,
                    merge_existing,
                    stats,
                },
            )
            .await?;
        }

        Commands::Sources => commands::sources(),
    }

    Ok(())
}

fn setup_tracing(format: &str, level: &str, verbose: bool) -> Result<()> {
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => tracing_subscriber::EnvFilter::new("balita=debug,info"),
        Err(_) => tracing_subscriber::EnvFilter::try_new(format!("balita={level},warn"))
            .with_context(|| format!("Invalid log level '{level}'"))?,
    };

    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}
