//! Work-Item Sources - URL lists to seed a collection run
//!
//! External lists (PhishTank, UCI, Kaggle exports...) name their columns
//! differently, so columns are resolved through fixed alias tables.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_SOURCE_LABEL;

/// Recognised URL column names, highest priority first (case-insensitive)
pub const URL_COLUMN_ALIASES: &[&str] = &["url", "urls", "website", "domain", "link", "address"];

/// Recognised label column names (case-insensitive); the first header in
/// file order that is one of these wins
pub const LABEL_COLUMN_ALIASES: &[&str] = &[
    "label", "labels", "type", "class", "category", "status",
    "phishing", "is_phishing", "is_phish", "result",
];

const LEGITIMATE_LABELS: &[&str] = &["0", "legitimate", "benign", "safe", "good", "false"];
const SUSPICIOUS_LABELS: &[&str] = &["1", "phishing", "malicious", "suspicious", "true", "bad"];

/// Well-known legitimate sites
const SEED_LEGITIMATE: &[&str] = &[
    "https://www.google.com",
    "https://www.youtube.com",
    "https://www.wikipedia.org",
    "https://www.github.com",
    "https://www.linkedin.com",
    "https://www.reddit.com",
    "https://www.amazon.com",
    "https://www.netflix.com",
    "https://www.instagram.com",
    "https://www.facebook.com",
];

/// Synthetic demo hosts (never resolve, so they exercise the degraded path)
const SEED_SUSPICIOUS: &[&str] = &[
    "http://phishy-demo.test",
    "http://fraud-demo.test",
    "http://secure-verify.test",
];

// ============================================================================
// TYPES
// ============================================================================

/// One (URL, label) pending processing
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkItem {
    pub url: String,
    pub label: u8,
}

impl WorkItem {
    pub fn new(url: impl Into<String>, label: u8) -> Self {
        Self { url: url.into(), label }
    }

    pub fn has_valid_label(&self) -> bool {
        is_valid_label(self.label)
    }
}

/// Dataset labels are binary: 0 legitimate, 1 suspicious
pub fn is_valid_label(label: u8) -> bool {
    matches!(label, 0 | 1)
}

/// Outcome of resolving a column against a header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnMatch {
    Found { index: usize, name: String },
    NotFound,
}

impl ColumnMatch {
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::Found { index, .. } => Some(*index),
            Self::NotFound => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceOptions {
    /// Explicit URL column; wins over the alias table
    pub url_column: Option<String>,
    /// Explicit label column; wins over the alias table
    pub label_column: Option<String>,
    /// Label for every row when the file has no label column (0 or 1)
    pub default_label: u8,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            url_column: None,
            label_column: None,
            default_label: DEFAULT_SOURCE_LABEL,
        }
    }
}

/// Items loaded from one source file plus what was dropped
#[derive(Debug, Clone, Default)]
pub struct SourceLoad {
    pub items: Vec<WorkItem>,
    pub url_column: String,
    pub label_column: Option<String>,
    /// Empty or non-http(s) URL cells
    pub skipped_invalid_url: usize,
    /// Label cells that map to neither 0 nor 1
    pub skipped_bad_label: usize,
}

impl SourceLoad {
    pub fn count_label(&self, label: u8) -> usize {
        self.items.iter().filter(|i| i.label == label).count()
    }
}

#[derive(Debug)]
pub enum SourceError {
    Io { path: PathBuf, source: std::io::Error },
    Csv(csv::Error),
    MissingUrlColumn { path: PathBuf, available: Vec<String> },
    InvalidDefaultLabel(u8),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "Cannot open {}: {}", path.display(), source),
            Self::Csv(e) => write!(f, "CSV error: {}", e),
            Self::MissingUrlColumn { path, available } => write!(
                f,
                "No URL column in {} (looked for {}); available columns: {}",
                path.display(),
                URL_COLUMN_ALIASES.join(", "),
                available.join(", ")
            ),
            Self::InvalidDefaultLabel(label) => {
                write!(f, "Default label must be 0 or 1, got {}", label)
            }
        }
    }
}

impl std::error::Error for SourceError {}

impl From<csv::Error> for SourceError {
    fn from(e: csv::Error) -> Self {
        SourceError::Csv(e)
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// How alias matches are ranked when no requested column is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasOrder {
    /// First alias of the table that any header matches
    Table,
    /// First header, left to right, that matches any alias
    Header,
}

/// Find a column: exact `requested`, then case-insensitive `requested`,
/// then an alias match ranked by `order`.
pub fn resolve_column<S: AsRef<str>>(
    headers: &[S],
    requested: Option<&str>,
    aliases: &[&str],
    order: AliasOrder,
) -> ColumnMatch {
    let found = |index: usize| ColumnMatch::Found {
        index,
        name: headers[index].as_ref().to_string(),
    };
    let matches = |header: &S, name: &str| header.as_ref().trim().eq_ignore_ascii_case(name);

    if let Some(requested) = requested {
        if let Some(i) = headers.iter().position(|h| h.as_ref() == requested) {
            return found(i);
        }
        if let Some(i) = headers.iter().position(|h| matches(h, requested)) {
            return found(i);
        }
    }

    let index = match order {
        AliasOrder::Table => aliases
            .iter()
            .find_map(|alias| headers.iter().position(|h| matches(h, *alias))),
        AliasOrder::Header => headers
            .iter()
            .position(|h| aliases.iter().any(|alias| matches(h, *alias))),
    };
    index.map_or(ColumnMatch::NotFound, found)
}

/// Map a raw label cell to 0/1. Unknown words fall back to numeric
/// coercion (any non-zero number is 1); anything else is None.
pub fn normalize_label(raw: &str) -> Option<u8> {
    let value = raw.trim().to_lowercase();
    if value.is_empty() {
        return None;
    }
    if LEGITIMATE_LABELS.contains(&value.as_str()) {
        return Some(0);
    }
    if SUSPICIOUS_LABELS.contains(&value.as_str()) {
        return Some(1);
    }
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(if n.trunc() == 0.0 { 0 } else { 1 }),
        _ => None,
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// Read work items from an external CSV file
pub fn load_work_items(path: &Path, options: &SourceOptions) -> Result<SourceLoad, SourceError> {
    if !is_valid_label(options.default_label) {
        return Err(SourceError::InvalidDefaultLabel(options.default_label));
    }
    let file = File::open(path).map_err(|e| SourceError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let url_match = resolve_column(
        &headers,
        options.url_column.as_deref(),
        URL_COLUMN_ALIASES,
        AliasOrder::Table,
    );
    let ColumnMatch::Found { index: url_index, name: url_column } = url_match else {
        return Err(SourceError::MissingUrlColumn {
            path: path.to_path_buf(),
            available: headers,
        });
    };
    let label_match = resolve_column(
        &headers,
        options.label_column.as_deref(),
        LABEL_COLUMN_ALIASES,
        AliasOrder::Header,
    );

    log::info!("Using column '{}' for URLs", url_column);
    match &label_match {
        ColumnMatch::Found { name, .. } => log::info!("Using column '{}' for labels", name),
        ColumnMatch::NotFound => log::info!(
            "No label column in {}, labelling every row {}",
            path.display(),
            options.default_label
        ),
    }

    let mut load = SourceLoad {
        url_column,
        label_column: match &label_match {
            ColumnMatch::Found { name, .. } => Some(name.clone()),
            ColumnMatch::NotFound => None,
        },
        ..SourceLoad::default()
    };

    for record in reader.records() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::debug!("Skipping unreadable row in {}: {}", path.display(), e);
                load.skipped_invalid_url += 1;
                continue;
            }
        };

        let url = record.get(url_index).unwrap_or_default().trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            load.skipped_invalid_url += 1;
            continue;
        }

        let label = match label_match.index() {
            Some(i) => match record.get(i).and_then(normalize_label) {
                Some(label) => label,
                None => {
                    load.skipped_bad_label += 1;
                    continue;
                }
            },
            None => options.default_label,
        };

        load.items.push(WorkItem::new(url, label));
    }

    log::info!(
        "Loaded {} URLs from {} ({} legitimate, {} suspicious; skipped {} bad URL, {} bad label)",
        load.items.len(),
        path.display(),
        load.count_label(0),
        load.count_label(1),
        load.skipped_invalid_url,
        load.skipped_bad_label
    );
    Ok(load)
}

/// Built-in seed list for a first run without any external source
pub fn seed_work_items() -> Vec<WorkItem> {
    SEED_LEGITIMATE
        .iter()
        .map(|url| WorkItem::new(*url, 0))
        .chain(SEED_SUSPICIOUS.iter().map(|url| WorkItem::new(*url, 1)))
        .collect()
}

/// Keep the first `limit` items of each label, preserving order
pub fn limit_per_label(items: Vec<WorkItem>, limit: usize) -> Vec<WorkItem> {
    let mut taken: HashMap<u8, usize> = HashMap::new();
    items
        .into_iter()
        .filter(|item| {
            let count = taken.entry(item.label).or_insert(0);
            *count += 1;
            *count <= limit
        })
        .collect()
}
