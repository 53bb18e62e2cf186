//! Dataset Store - CSV file with header `url,label,<layout columns>`
//!
//! Rows are read by header name and malformed rows are skipped, so a row cut
//! short by a killed process never makes the whole file unreadable.
//! `merge_append` is the only mutator: read everything, append, write a
//! sibling temp file, fsync, rename over the original.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use parking_lot::Mutex;

use super::source::is_valid_label;
use super::stats::DatasetStats;
use super::DatasetError;
use crate::logic::features::layout::{dataset_header, FEATURE_COUNT, FEATURE_LAYOUT};
use crate::logic::features::{FeatureRecord, FeatureSet};

/// Result of a tolerant read
#[derive(Debug, Clone, Default)]
pub struct DatasetRead {
    pub records: Vec<FeatureRecord>,
    /// Rows dropped because they could not be parsed
    pub skipped_rows: usize,
}

pub struct DatasetStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

/// Column positions resolved from a header row
struct ColumnMap {
    url: usize,
    label: Option<usize>,
    features: [usize; FEATURE_COUNT],
    width: usize,
}

impl DatasetStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// All parsable rows. A missing file reads as empty.
    pub fn read_all(&self) -> Result<DatasetRead, DatasetError> {
        let Some(mut reader) = self.open_reader()? else {
            return Ok(DatasetRead::default());
        };
        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Ok(DatasetRead::default());
        }
        let columns = self.column_map(&headers)?;

        let mut read = DatasetRead::default();
        for (row, result) in reader.records().enumerate() {
            let parsed = result
                .map_err(|e| e.to_string())
                .and_then(|record| parse_row(&record, &columns));
            match parsed {
                Ok(record) => read.records.push(record),
                Err(reason) => {
                    // header is line 1
                    log::debug!("Skipping row {} of {}: {}", row + 2, self.path.display(), reason);
                    read.skipped_rows += 1;
                }
            }
        }

        if read.skipped_rows > 0 {
            log::warn!(
                "Skipped {} malformed row(s) in {}",
                read.skipped_rows,
                self.path.display()
            );
        }
        Ok(read)
    }

    /// URLs of the rows `read_all` keeps. A URL whose only row is malformed
    /// is left out, since the next `merge_append` drops that row.
    pub fn read_url_set(&self) -> Result<HashSet<String>, DatasetError> {
        Ok(self.read_all()?.records.into_iter().map(|r| r.url).collect())
    }

    /// Append `records` to whatever is on disk and rewrite the file.
    /// Returns the row count of the rewritten file.
    ///
    /// Rows that were already unparsable are not carried over. A record with
    /// a label other than 0/1 fails the call before the file is touched.
    pub fn merge_append(&self, records: &[FeatureRecord]) -> Result<usize, DatasetError> {
        let invalid = records
            .iter()
            .find_map(|r| r.label.filter(|l| !is_valid_label(*l)).map(|label| (r, label)));
        if let Some((record, label)) = invalid {
            return Err(DatasetError::InvalidLabel { url: record.url.clone(), label });
        }
        let _guard = self.write_lock.lock();

        let mut all = self.read_all()?.records;
        all.extend_from_slice(records);

        let tmp = self.temp_path();
        if let Err(e) = self.write_file(&tmp, &all) {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.persistence(e)
        })?;

        log::debug!("Wrote {} rows to {}", all.len(), self.path.display());
        Ok(all.len())
    }

    /// Summary figures for progress checks
    pub fn stats(&self) -> Result<DatasetStats, DatasetError> {
        let read = self.read_all()?;
        let modified = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
            .map(chrono::DateTime::<chrono::Local>::from);
        Ok(DatasetStats::from_read(&read, modified))
    }

    // ------------------------------------------------------------------------

    fn open_reader(&self) -> Result<Option<csv::Reader<File>>, DatasetError> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(
                csv::ReaderBuilder::new().flexible(true).from_reader(file),
            )),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DatasetError::Read { path: self.path.clone(), source: e }),
        }
    }

    fn column_map(&self, headers: &StringRecord) -> Result<ColumnMap, DatasetError> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);

        let mut missing = Vec::new();
        let url = find("url");
        if url.is_none() {
            missing.push("url".to_string());
        }
        let mut features = [0usize; FEATURE_COUNT];
        for (slot, name) in features.iter_mut().zip(FEATURE_LAYOUT) {
            match find(*name) {
                Some(i) => *slot = i,
                None => missing.push(name.to_string()),
            }
        }

        match url {
            Some(url) if missing.is_empty() => Ok(ColumnMap {
                url,
                label: find("label"),
                features,
                width: headers.len(),
            }),
            _ => Err(DatasetError::SchemaMismatch { path: self.path.clone(), missing }),
        }
    }

    fn write_file(&self, path: &Path, records: &[FeatureRecord]) -> Result<(), DatasetError> {
        let file = File::create(path).map_err(|e| self.persistence(e))?;
        let mut writer = csv::Writer::from_writer(file);

        writer.write_record(dataset_header()).map_err(|e| self.csv_write(e))?;
        for record in records {
            writer.write_record(to_row(record)).map_err(|e| self.csv_write(e))?;
        }

        let file = writer.into_inner().map_err(|e| self.persistence(e.into_error()))?;
        file.sync_all().map_err(|e| self.persistence(e))
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.csv".to_string());
        self.path.with_file_name(format!(".{}.tmp", name))
    }

    fn persistence(&self, source: io::Error) -> DatasetError {
        DatasetError::Persistence { path: self.path.clone(), source }
    }

    fn csv_write(&self, e: csv::Error) -> DatasetError {
        if !e.is_io_error() {
            return DatasetError::Csv(e);
        }
        match e.into_kind() {
            csv::ErrorKind::Io(source) => self.persistence(source),
            _ => self.persistence(io::Error::new(io::ErrorKind::Other, "csv write failed")),
        }
    }
}

// ============================================================================
// ROW CODEC
// ============================================================================

fn to_row(record: &FeatureRecord) -> Vec<String> {
    let mut row = Vec::with_capacity(FEATURE_COUNT + 2);
    row.push(record.url.clone());
    row.push(record.label.map(|l| l.to_string()).unwrap_or_default());
    row.extend(record.features.values().iter().map(|v| v.to_string()));
    row
}

fn parse_row(record: &StringRecord, columns: &ColumnMap) -> Result<FeatureRecord, String> {
    if record.len() != columns.width {
        return Err(format!("expected {} fields, found {}", columns.width, record.len()));
    }

    let url = record.get(columns.url).unwrap_or_default();
    if url.is_empty() {
        return Err("empty url".to_string());
    }

    let label = match columns.label.and_then(|i| record.get(i)).map(str::trim) {
        None | Some("") => None,
        Some(raw) => match parse_count(raw) {
            Some(l @ (0 | 1)) => Some(l as u8),
            _ => return Err(format!("bad label '{}'", raw)),
        },
    };

    let mut values = [0u32; FEATURE_COUNT];
    for ((slot, index), name) in values.iter_mut().zip(columns.features).zip(FEATURE_LAYOUT) {
        let raw = record.get(index).unwrap_or_default();
        *slot = parse_count(raw).ok_or_else(|| format!("bad {} '{}'", name, raw))?;
    }

    Ok(FeatureRecord::new(url, label, FeatureSet::from_values(values)))
}

/// Non-negative integer, also accepting the `3.0` form other tools write
fn parse_count(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    if let Ok(v) = raw.parse::<u32>() {
        return Some(v);
    }
    let v = raw.parse::<f64>().ok()?;
    if v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 {
        Some(v as u32)
    } else {
        None
    }
}
