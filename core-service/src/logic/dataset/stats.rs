//! Dataset Stats - how far a collection has got

use std::collections::HashSet;

use chrono::{DateTime, Local};
use serde::Serialize;

use super::store::DatasetRead;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_rows: usize,
    pub skipped_rows: usize,
    pub legitimate: usize,
    pub suspicious: usize,
    pub unlabeled: usize,
    pub unique_urls: usize,
    pub duplicate_rows: usize,
    /// Rows whose page-derived fields are all zero (most likely failed fetches)
    pub page_fields_zero: usize,
    pub last_modified: Option<DateTime<Local>>,
}

impl DatasetStats {
    pub fn from_read(read: &DatasetRead, last_modified: Option<DateTime<Local>>) -> Self {
        let mut urls = HashSet::new();
        let mut stats = Self {
            total_rows: read.records.len(),
            skipped_rows: read.skipped_rows,
            legitimate: 0,
            suspicious: 0,
            unlabeled: 0,
            unique_urls: 0,
            duplicate_rows: 0,
            page_fields_zero: 0,
            last_modified,
        };

        for record in &read.records {
            match record.label {
                Some(0) => stats.legitimate += 1,
                Some(_) => stats.suspicious += 1,
                None => stats.unlabeled += 1,
            }
            if !urls.insert(record.url.as_str()) {
                stats.duplicate_rows += 1;
            }
            if record.features.page_fields_zero() {
                stats.page_fields_zero += 1;
            }
        }
        stats.unique_urls = urls.len();
        stats
    }

    /// Minutes since the file was last written
    pub fn minutes_since_update(&self) -> Option<f64> {
        self.last_modified
            .map(|t| (Local::now() - t).num_seconds().max(0) as f64 / 60.0)
    }
}

impl std::fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Total rows:          {}", self.total_rows)?;
        writeln!(f, "  legitimate (0):    {}", self.legitimate)?;
        writeln!(f, "  suspicious (1):    {}", self.suspicious)?;
        if self.unlabeled > 0 {
            writeln!(f, "  unlabeled:         {}", self.unlabeled)?;
        }
        writeln!(f, "Unique URLs:         {}", self.unique_urls)?;
        writeln!(f, "Duplicate rows:      {}", self.duplicate_rows)?;
        writeln!(f, "No page signals:     {}", self.page_fields_zero)?;
        writeln!(f, "Skipped (malformed): {}", self.skipped_rows)?;
        match (self.last_modified, self.minutes_since_update()) {
            (Some(t), Some(minutes)) if minutes < 1.0 => {
                write!(f, "Last update:         {} (under a minute ago, still running?)", t.format("%Y-%m-%d %H:%M:%S"))
            }
            (Some(t), Some(minutes)) => {
                write!(f, "Last update:         {} ({:.1} minutes ago)", t.format("%Y-%m-%d %H:%M:%S"), minutes)
            }
            _ => write!(f, "Last update:         unknown"),
        }
    }
}
