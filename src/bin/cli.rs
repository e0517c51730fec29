//! jobring CLI
//!
//! Local execution entry point. Scrapers write their postings to a
//! JSON file; `jobring run` feeds that file through the pipeline.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use jobring::{
    error::{AppError, Result},
    models::{Config, Period, RawPosting, Role},
    pipeline::{self, RunOptions},
    services::{NotificationSink, NullSink, WebhookSink},
    storage::LocalStore,
};

/// jobring - Job Posting Ingestion Pipeline
#[derive(Parser, Debug)]
#[command(
    name = "jobring",
    version,
    about = "Deduplicates, classifies and dispatches scraped job postings"
)]
struct Cli {
    /// Path to storage directory containing config and seen caches
    #[arg(short, long, default_value = "storage")]
    storage_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest a JSON file of raw postings and dispatch notifications
    Run {
        /// Path to a JSON array of raw postings
        input: PathBuf,

        /// Source label for this batch (seen-cache key)
        #[arg(long, default_value = "manual")]
        source: String,

        /// Role scope: intern, new_grad or both
        #[arg(long, default_value = "both")]
        role: String,

        /// Recency window: day, three_days, week, month, three_months
        #[arg(long, default_value = "day")]
        period: String,

        /// Log notifications instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Classify a postings file without filtering or sending
    Classify {
        /// Path to a JSON array of raw postings
        input: PathBuf,
    },

    /// Validate configuration files
    Validate,

    /// Show seen-cache info per source
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn parse_period(s: &str) -> Result<Period> {
    match s.trim().to_lowercase().as_str() {
        "day" => Ok(Period::Day),
        "three_days" | "3d" => Ok(Period::ThreeDays),
        "week" => Ok(Period::Week),
        "month" => Ok(Period::Month),
        "three_months" | "3mo" => Ok(Period::ThreeMonths),
        other => Err(AppError::validation(format!(
            "Unknown period '{}'. Use day, three_days, week, month or three_months",
            other
        ))),
    }
}

fn load_postings(path: &PathBuf) -> Result<Vec<RawPosting>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    log::info!("jobring starting...");

    // Load configuration
    let config_path = cli.storage_dir.join("config.toml");
    let config = Config::load_or_default(&config_path);

    log::info!("Loaded configuration from {}", cli.storage_dir.display());

    let store = LocalStore::new(cli.storage_dir.join("seen"));

    match cli.command {
        Command::Run {
            input,
            source,
            role,
            period,
            dry_run,
        } => {
            config.validate()?;

            let postings = load_postings(&input)?;
            log::info!("Loaded {} postings from {}", postings.len(), input.display());

            let role = Role::parse(&role);
            let options = RunOptions {
                source,
                role: Some(role),
                period: parse_period(&period)?,
                default_role: role,
            };

            let sink: Box<dyn NotificationSink> = if dry_run {
                log::info!("Dry run: notifications will be logged, not sent");
                Box::new(NullSink)
            } else {
                Box::new(WebhookSink::new(&config.dispatch)?)
            };

            let report =
                pipeline::run_pipeline(&config, postings, &options, &store, sink.as_ref()).await?;

            log::info!(
                "Run complete: {} new postings dispatched across {} buckets",
                report.new,
                report.buckets
            );
        }

        Command::Classify { input } => {
            let postings = load_postings(&input)?;
            let classifier = pipeline::Classifier::new(&config.classify);
            let now = chrono::Utc::now();

            for posting in &postings {
                let record = pipeline::normalize(posting, now);
                let category = classifier.classify(&record);
                log::info!("{} -> {} ({})", record.title, category, record.id_prefix());
            }
            log::info!("Classified {} postings", postings.len());
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK (rule lists, patterns, and destinations)");

            log::info!("All validations passed!");
        }

        Command::Info => {
            log::info!("Storage directory: {}", cli.storage_dir.display());

            let seen_dir = cli.storage_dir.join("seen");
            if !seen_dir.exists() {
                log::info!("No seen caches found yet.");
            } else {
                for entry in std::fs::read_dir(&seen_dir)? {
                    let entry = entry?;
                    let path = entry.path();
                    if path.extension().is_some_and(|ext| ext == "json") {
                        let source = path
                            .file_stem()
                            .and_then(|s| s.to_str())
                            .unwrap_or("unknown")
                            .to_string();
                        let records = store.load_records(&source).await.unwrap_or_default();
                        log::info!("{}: {} records", source, records.len());
                    }
                }
            }
        }
    }

    log::info!("Done!");

    Ok(())
}
