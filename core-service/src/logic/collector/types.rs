//! Collector Types - config, run summary, errors

use serde::Serialize;

use crate::constants;
use crate::logic::dataset::DatasetError;
use crate::logic::features::FeatureRecord;

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct CollectConfig {
    /// Records buffered before a merge-append
    pub batch_size: usize,
    /// Completions between progress log lines
    pub progress_interval: usize,
    /// Upper bound on concurrent fetches (further capped by the work count)
    pub workers: usize,
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            batch_size: constants::get_batch_size(),
            progress_interval: constants::get_progress_interval(),
            workers: constants::default_worker_count(),
        }
    }
}

// ============================================================================
// SUMMARY
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectSummary {
    /// Work items handed to the run
    pub requested: usize,
    /// Already present in the dataset
    pub skipped_existing: usize,
    /// Repeated inside this run
    pub skipped_duplicate: usize,
    /// Label other than 0/1
    pub skipped_invalid_label: usize,
    pub workers: usize,
    /// Records produced (succeeded + failed)
    pub processed: usize,
    /// Page fetched and scanned
    pub succeeded: usize,
    /// Degraded to URL-only features
    pub failed: usize,
    /// Dropped from the queue by shutdown
    pub cancelled: usize,
    pub flushes: usize,
    pub failed_flushes: usize,
    /// Row count after the last successful flush
    pub dataset_rows: Option<usize>,
}

impl std::fmt::Display for CollectSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requested {}, skipped {} existing + {} duplicate, processed {} ({} scanned, {} degraded), cancelled {}, {} flush(es)",
            self.requested,
            self.skipped_existing,
            self.skipped_duplicate,
            self.processed,
            self.succeeded,
            self.failed,
            self.cancelled,
            self.flushes
        )?;
        if self.skipped_invalid_label > 0 {
            write!(f, ", {} invalid label(s)", self.skipped_invalid_label)?;
        }
        if self.failed_flushes > 0 {
            write!(f, ", {} failed flush(es)", self.failed_flushes)?;
        }
        if let Some(rows) = self.dataset_rows {
            write!(f, ", dataset now {} rows", rows)?;
        }
        Ok(())
    }
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum CollectError {
    /// Existing dataset could not be read before the run
    Dataset(DatasetError),
    /// Final flush failed; the unwritten records are handed back
    Persistence {
        pending: Vec<FeatureRecord>,
        summary: CollectSummary,
        source: DatasetError,
    },
    /// A background task panicked or was cancelled
    Worker(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dataset(e) => write!(f, "Cannot read dataset: {}", e),
            Self::Persistence { pending, source, .. } => {
                write!(f, "Failed to save {} record(s): {}", pending.len(), source)
            }
            Self::Worker(msg) => write!(f, "Worker task failed: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dataset(e) => Some(e),
            Self::Persistence { source, .. } => Some(source),
            Self::Worker(_) => None,
        }
    }
}

impl From<DatasetError> for CollectError {
    fn from(e: DatasetError) -> Self {
        CollectError::Dataset(e)
    }
}

impl From<tokio::task::JoinError> for CollectError {
    fn from(e: tokio::task::JoinError) -> Self {
        CollectError::Worker(e.to_string())
    }
}
