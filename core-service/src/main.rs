//! PhishGuard - Main Entry Point
//!
//! Dataset collection and feature tooling on top of `phishguard_core`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use phishguard_core::constants;
use phishguard_core::logic::collector::{CollectConfig, CollectError, Collector};
use phishguard_core::logic::dataset::{
    limit_per_label, load_work_items, seed_work_items, DatasetStore, SourceOptions, WorkItem,
};
use phishguard_core::logic::features::extractor::OutcomeSummary;
use phishguard_core::logic::features::{extract_from_web, Extraction, FeatureRecord, LayoutInfo};
use phishguard_core::logic::fetcher::{FetchConfig, FixedFetcher, HttpFetcher};
use phishguard_core::logic::model::{self, ModelPaths};

#[derive(Parser)]
#[command(name = "phishguard")]
#[command(about = "Phishing URL feature extraction and dataset collection")]
#[command(version)]
struct Cli {
    /// Verbosity level (-v for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch URLs and merge their feature records into the dataset
    Collect {
        /// Dataset CSV to extend
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// CSV of URLs to collect; the built-in seed list is used when absent
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// URL column in the source (default: alias lookup)
        #[arg(long)]
        url_column: Option<String>,

        /// Label column in the source (default: alias lookup)
        #[arg(long)]
        label_column: Option<String>,

        /// Label for rows when the source has no label column (0 or 1)
        #[arg(long, default_value_t = constants::DEFAULT_SOURCE_LABEL, value_parser = clap::value_parser!(u8).range(0..=1))]
        default_label: u8,

        /// Keep at most N URLs per label
        #[arg(short, long)]
        limit: Option<usize>,

        /// Records per merge-append
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Concurrent fetches
        #[arg(short, long)]
        workers: Option<usize>,

        /// Per-URL fetch timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Print the feature record for one URL as JSON
    Extract {
        url: String,

        /// Skip the fetch; page-derived fields stay zero
        #[arg(long)]
        offline: bool,

        /// Label to attach to the record (0 or 1)
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=1))]
        label: Option<u8>,
    },

    /// Show dataset statistics
    Stats {
        #[arg(short, long)]
        dataset: Option<PathBuf>,
    },

    /// Load the model artifact and check it against the feature layout
    CheckModel {
        #[arg(long)]
        model: Option<PathBuf>,

        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Only check files and metadata, do not open the ONNX session
        #[arg(long)]
        metadata_only: bool,
    },

    /// Print the pinned feature layout as JSON
    Layout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose > 0 { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match cli.command {
        Commands::Collect {
            dataset,
            source,
            url_column,
            label_column,
            default_label,
            limit,
            batch_size,
            workers,
            timeout,
        } => {
            let options = SourceOptions {
                url_column,
                label_column,
                default_label,
            };
            let items = work_items(source.as_deref(), &options, limit)?;

            let mut config = CollectConfig::default();
            if let Some(n) = batch_size {
                config.batch_size = n;
            }
            if let Some(n) = workers {
                config.workers = n;
            }
            let mut fetch = FetchConfig::collection();
            if let Some(secs) = timeout {
                fetch = fetch.with_timeout(Duration::from_secs(secs));
            }

            let path = dataset.unwrap_or_else(|| PathBuf::from(constants::get_dataset_path()));
            collect(items, &path, config, fetch).await
        }
        Commands::Extract { url, offline, label } => {
            let extraction = if offline {
                extract_from_web(&FixedFetcher::offline(), &url, label).await
            } else {
                let fetcher = HttpFetcher::new(FetchConfig::serving())?;
                extract_from_web(&fetcher, &url, label).await
            };
            print_json(&ExtractOutput::from(&extraction))
        }
        Commands::Stats { dataset } => {
            let path = dataset.unwrap_or_else(|| PathBuf::from(constants::get_dataset_path()));
            let store = DatasetStore::new(&path);
            if !store.exists() {
                bail!("Dataset not found: {}", path.display());
            }
            let stats = store.stats()?;
            println!("{}", stats);
            Ok(())
        }
        Commands::CheckModel {
            model: model_path,
            metadata,
            metadata_only,
        } => {
            let defaults = ModelPaths::default();
            let paths = ModelPaths::new(
                model_path.unwrap_or(defaults.model),
                metadata.unwrap_or(defaults.metadata),
            );
            check_model(&paths, metadata_only)
        }
        Commands::Layout => print_json(&LayoutInfo::current()),
    }
}

fn work_items(source: Option<&Path>, options: &SourceOptions, limit: Option<usize>) -> Result<Vec<WorkItem>> {
    let items = match source {
        Some(path) => {
            let load = load_work_items(path, options)?;
            log::info!(
                "Loaded {} URLs from {} (column '{}', label column {:?}): {} legitimate, {} suspicious",
                load.items.len(),
                path.display(),
                load.url_column,
                load.label_column,
                load.count_label(0),
                load.count_label(1)
            );
            if load.skipped_invalid_url + load.skipped_bad_label > 0 {
                log::warn!(
                    "Skipped {} rows with invalid URLs and {} with unknown labels",
                    load.skipped_invalid_url,
                    load.skipped_bad_label
                );
            }
            load.items
        }
        None => {
            log::info!("No source file given, using the built-in seed list");
            seed_work_items()
        }
    };

    Ok(match limit {
        Some(n) => limit_per_label(items, n),
        None => items,
    })
}

async fn collect(items: Vec<WorkItem>, path: &Path, config: CollectConfig, fetch: FetchConfig) -> Result<()> {
    let fetcher = HttpFetcher::new(fetch).context("Cannot build HTTP client")?;
    let collector = Collector::new(fetcher, DatasetStore::new(path), config);

    let shutdown = async {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Ctrl-C received, finishing in-flight URLs");
        }
    };

    match collector.run_until(items, shutdown).await {
        Ok(summary) => {
            println!("{}", summary);
            Ok(())
        }
        Err(CollectError::Persistence { pending, summary, source }) => {
            println!("{}", summary);
            let recovery = recovery_path(path);
            match DatasetStore::new(&recovery).merge_append(&pending) {
                Ok(_) => log::error!(
                    "Dataset not saved; {} records written to {} for manual recovery",
                    pending.len(),
                    recovery.display()
                ),
                Err(e) => log::error!("Recovery write to {} failed too: {}", recovery.display(), e),
            }
            Err(source).context(format!("Failed to save {}", path.display()))
        }
        Err(e) => Err(e.into()),
    }
}

/// `data/training.csv` -> `data/training.recovery.csv`, or the file name alone when its directory is unusable
fn recovery_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("dataset");
    let name = format!("{}.recovery.csv", stem);
    match path.parent() {
        Some(dir) if dir.is_dir() => dir.join(name),
        _ => PathBuf::from(name),
    }
}

fn check_model(paths: &ModelPaths, metadata_only: bool) -> Result<()> {
    let metadata = if metadata_only {
        model::load_metadata(paths)?
    } else {
        model::load(paths)?.metadata
    };

    println!("Model:    {}", paths.model.display());
    println!("Metadata: {}", paths.metadata.display());
    println!("Type:     {}", metadata.model_type);
    if let Some(trained_at) = &metadata.trained_at {
        println!("Trained:  {}", trained_at);
    }
    println!(
        "Features: {} columns, matching layout v{} ({:08x})",
        metadata.feature_columns.len(),
        phishguard_core::logic::features::layout::FEATURE_VERSION,
        phishguard_core::logic::features::layout::layout_hash()
    );
    Ok(())
}

#[derive(Serialize)]
struct ExtractOutput<'a> {
    #[serde(flatten)]
    record: &'a FeatureRecord,
    outcome: OutcomeSummary,
}

impl<'a> From<&'a Extraction> for ExtractOutput<'a> {
    fn from(extraction: &'a Extraction) -> Self {
        Self {
            record: &extraction.record,
            outcome: OutcomeSummary::from(&extraction.outcome),
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
