//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Every default can be overridden by a `PHISHGUARD_*` environment variable.

use std::time::Duration;

/// Default dataset file
pub const DEFAULT_DATASET_PATH: &str = "training_data.csv";

/// Records buffered before a merge-append
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Completions between progress log lines
pub const DEFAULT_PROGRESS_INTERVAL: usize = 50;

/// Workers per available CPU
pub const DEFAULT_WORKER_MULTIPLIER: usize = 4;

/// Hard cap on concurrent fetches
pub const DEFAULT_MAX_WORKERS: usize = 32;

/// Fetch timeout during bulk collection (seconds)
pub const DEFAULT_COLLECT_TIMEOUT_SECS: u64 = 10;

/// Fetch timeout at serving time (seconds)
pub const DEFAULT_SERVING_TIMEOUT_SECS: u64 = 5;

/// Redirect hops followed before giving up
pub const DEFAULT_MAX_REDIRECTS: usize = 30;

/// Browser-like User-Agent sent with every fetch
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Label given to CSV rows that have no label column
pub const DEFAULT_SOURCE_LABEL: u8 = 1;

/// Serialized classifier
pub const DEFAULT_MODEL_PATH: &str = "phishguard_model.onnx";

/// Pinned feature columns + model info
pub const DEFAULT_MODEL_META_PATH: &str = "phishguard_model.json";

/// Probability above which a URL is reported suspicious
pub const SUSPICIOUS_PROBABILITY: f32 = 0.5;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "PhishGuard";

// ============================================
// Helper functions to read from env with fallback
// ============================================

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Get dataset path from environment or use default
pub fn get_dataset_path() -> String {
    std::env::var("PHISHGUARD_DATASET").unwrap_or_else(|_| DEFAULT_DATASET_PATH.to_string())
}

/// Get batch size from environment or use default
pub fn get_batch_size() -> usize {
    env_parse("PHISHGUARD_BATCH_SIZE")
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_BATCH_SIZE)
}

/// Get progress interval from environment or use default
pub fn get_progress_interval() -> usize {
    env_parse("PHISHGUARD_PROGRESS_INTERVAL")
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_PROGRESS_INTERVAL)
}

/// Get worker cap from environment or use default
pub fn get_max_workers() -> usize {
    env_parse("PHISHGUARD_MAX_WORKERS")
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_MAX_WORKERS)
}

/// Get collection fetch timeout from environment or use default
pub fn get_collect_timeout() -> Duration {
    Duration::from_secs(
        env_parse("PHISHGUARD_COLLECT_TIMEOUT_SECS").unwrap_or(DEFAULT_COLLECT_TIMEOUT_SECS),
    )
}

/// Get serving fetch timeout from environment or use default
pub fn get_serving_timeout() -> Duration {
    Duration::from_secs(
        env_parse("PHISHGUARD_SERVING_TIMEOUT_SECS").unwrap_or(DEFAULT_SERVING_TIMEOUT_SECS),
    )
}

/// Get model path from environment or use default
pub fn get_model_path() -> String {
    std::env::var("PHISHGUARD_MODEL").unwrap_or_else(|_| DEFAULT_MODEL_PATH.to_string())
}

/// Get model metadata path from environment or use default
pub fn get_model_meta_path() -> String {
    std::env::var("PHISHGUARD_MODEL_META").unwrap_or_else(|_| DEFAULT_MODEL_META_PATH.to_string())
}

/// Worker count: a multiple of available parallelism, capped
pub fn default_worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus * DEFAULT_WORKER_MULTIPLIER).min(get_max_workers())
}
