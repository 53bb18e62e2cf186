//! Dataset Module - persistent training table
//!
//! - `store` - the CSV dataset file: read-all, read-url-set, merge-append
//! - `source` - URL lists the collector is seeded from
//! - `stats` - progress report over an existing dataset

pub mod source;
pub mod stats;
pub mod store;

#[cfg(test)]
mod tests;

use std::path::PathBuf;

pub use source::{
    is_valid_label, limit_per_label, load_work_items, normalize_label, resolve_column,
    seed_work_items, AliasOrder, ColumnMatch, SourceError, SourceLoad, SourceOptions, WorkItem,
};
pub use stats::DatasetStats;
pub use store::{DatasetRead, DatasetStore};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug)]
pub enum DatasetError {
    /// Existing dataset could not be opened or read
    Read { path: PathBuf, source: std::io::Error },
    /// Dataset could not be written (disk full, permissions, missing directory)
    Persistence { path: PathBuf, source: std::io::Error },
    /// Non-IO CSV failure
    Csv(csv::Error),
    /// Header lacks columns of the pinned layout
    SchemaMismatch { path: PathBuf, missing: Vec<String> },
    /// Record carries a label outside {0, 1}
    InvalidLabel { url: String, label: u8 },
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "Failed to read {}: {}", path.display(), source),
            Self::Persistence { path, source } => write!(f, "Failed to write {}: {}", path.display(), source),
            Self::Csv(e) => write!(f, "CSV error: {}", e),
            Self::SchemaMismatch { path, missing } => write!(
                f,
                "{} does not match the feature layout; missing columns: {}",
                path.display(),
                missing.join(", ")
            ),
            Self::InvalidLabel { url, label } => {
                write!(f, "Label {} for {} is not 0 or 1", label, url)
            }
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Persistence { source, .. } => Some(source),
            Self::Csv(e) => Some(e),
            Self::SchemaMismatch { .. } | Self::InvalidLabel { .. } => None,
        }
    }
}

impl From<csv::Error> for DatasetError {
    fn from(e: csv::Error) -> Self {
        DatasetError::Csv(e)
    }
}

impl DatasetError {
    /// True for failures to write the file, the only ones a retry can fix
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence { .. })
    }
}
