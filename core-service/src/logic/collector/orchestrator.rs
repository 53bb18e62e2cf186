//! Collection Orchestrator - fan URLs out to workers, batch results to disk
//!
//! Workers pull from one shared queue and send extractions back over a
//! channel. The orchestrator task alone owns the batch and the flush state,
//! so appends and flushes are serialized without a lock around them.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::io;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use super::types::{CollectConfig, CollectError, CollectSummary};
use crate::logic::dataset::{DatasetError, DatasetStore, WorkItem};
use crate::logic::features::{extract_from_web, Extraction, FeatureRecord};
use crate::logic::fetcher::PageFetcher;

pub struct Collector<F: PageFetcher> {
    fetcher: Arc<F>,
    store: Arc<DatasetStore>,
    config: CollectConfig,
}

/// Batch plus the bookkeeping that decides when to flush it
struct Batch {
    records: Vec<FeatureRecord>,
    /// Flush when `records.len()` reaches this; grows after a failed flush
    flush_at: usize,
}

impl<F: PageFetcher> Collector<F> {
    pub fn new(fetcher: F, store: DatasetStore, config: CollectConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store: Arc::new(store),
            config,
        }
    }

    pub fn store(&self) -> &DatasetStore {
        &self.store
    }

    /// Run to completion
    pub async fn run(&self, items: Vec<WorkItem>) -> Result<CollectSummary, CollectError> {
        self.run_until(items, std::future::pending()).await
    }

    /// Run until done or until `shutdown` resolves. On shutdown, queued
    /// items are dropped, in-flight fetches finish (or time out) and the
    /// partial batch is flushed.
    pub async fn run_until<S>(&self, items: Vec<WorkItem>, shutdown: S) -> Result<CollectSummary, CollectError>
    where
        S: Future<Output = ()>,
    {
        let mut summary = CollectSummary {
            requested: items.len(),
            ..CollectSummary::default()
        };

        let store = self.store.clone();
        let existing = tokio::task::spawn_blocking(move || store.read_url_set()).await??;
        let pending = self.dedup(items, &existing, &mut summary);
        if !existing.is_empty() {
            log::info!(
                "{} URLs already in {}, {} left to process",
                existing.len(),
                self.store.path().display(),
                pending.len()
            );
        }
        if pending.is_empty() {
            log::info!("Nothing to collect");
            return Ok(summary);
        }

        let total = pending.len();
        let batch_size = self.config.batch_size.max(1);
        summary.workers = self.config.workers.clamp(1, total);
        log::info!("Processing {} URLs using {} workers", total, summary.workers);

        let queue = Arc::new(Mutex::new(VecDeque::from(pending)));
        let (tx, mut rx) = mpsc::channel::<Extraction>(summary.workers * 2);
        let mut workers = JoinSet::new();
        for _ in 0..summary.workers {
            workers.spawn(worker(self.fetcher.clone(), queue.clone(), tx.clone()));
        }
        drop(tx);

        let mut batch = Batch {
            records: Vec::with_capacity(batch_size),
            flush_at: batch_size,
        };
        let mut shutdown = std::pin::pin!(shutdown);
        let mut stopping = false;

        loop {
            tokio::select! {
                received = rx.recv() => {
                    let Some(extraction) = received else { break };

                    summary.processed += 1;
                    if extraction.outcome.is_degraded() {
                        summary.failed += 1;
                    } else {
                        summary.succeeded += 1;
                    }
                    batch.records.push(extraction.record);

                    if batch.records.len() >= batch.flush_at {
                        if let Err(e) = self.flush(&mut batch.records, &mut summary).await {
                            summary.failed_flushes += 1;
                            batch.flush_at += batch_size;
                            log::warn!(
                                "Failed to save progress ({} records kept in memory): {}",
                                batch.records.len(),
                                e
                            );
                        } else {
                            batch.flush_at = batch_size;
                        }
                    }

                    let expected = total - summary.cancelled;
                    if summary.processed % self.config.progress_interval.max(1) == 0 || summary.processed == expected {
                        log::info!(
                            "Progress: {}/{} URLs processed ({}%)",
                            summary.processed,
                            expected,
                            summary.processed * 100 / expected.max(1)
                        );
                    }
                }
                _ = &mut shutdown, if !stopping => {
                    stopping = true;
                    let dropped = queue.lock().drain(..).count();
                    summary.cancelled += dropped;
                    log::warn!(
                        "Shutdown requested: dropped {} queued URLs, waiting for in-flight fetches",
                        dropped
                    );
                }
            }
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                log::error!("Collector worker failed: {}", e);
            }
        }

        if !batch.records.is_empty() {
            if let Err(source) = self.flush(&mut batch.records, &mut summary).await {
                summary.failed_flushes += 1;
                return Err(source.into_collect_error(self.store.path(), batch.records, summary));
            }
        }

        log::info!("Collection finished: {}", summary);
        Ok(summary)
    }

    /// Drop URLs already stored, repeats within this run and labels other than 0/1
    fn dedup(&self, items: Vec<WorkItem>, existing: &HashSet<String>, summary: &mut CollectSummary) -> Vec<WorkItem> {
        let mut seen = HashSet::new();
        items
            .into_iter()
            .filter(|item| {
                if !item.has_valid_label() {
                    log::warn!("Skipping {}: label {} is not 0 or 1", item.url, item.label);
                    summary.skipped_invalid_label += 1;
                    false
                } else if existing.contains(&item.url) {
                    summary.skipped_existing += 1;
                    false
                } else if !seen.insert(item.url.clone()) {
                    summary.skipped_duplicate += 1;
                    false
                } else {
                    true
                }
            })
            .collect()
    }

    /// Merge-append the batch; cleared only on success
    async fn flush(&self, records: &mut Vec<FeatureRecord>, summary: &mut CollectSummary) -> Result<(), FlushError> {
        let store = self.store.clone();
        let snapshot = records.clone();
        let written = snapshot.len();

        let rows = tokio::task::spawn_blocking(move || store.merge_append(&snapshot))
            .await
            .map_err(|e| FlushError::Join(e.to_string()))?
            .map_err(FlushError::Dataset)?;

        records.clear();
        summary.flushes += 1;
        summary.dataset_rows = Some(rows);
        log::info!(
            "Saved {} records to {} ({} total rows)",
            written,
            self.store.path().display(),
            rows
        );
        Ok(())
    }
}

pub(super) enum FlushError {
    Dataset(DatasetError),
    Join(String),
}

impl FlushError {
    /// Error for a failed final flush; the unwritten batch always goes back
    /// to the caller
    pub(super) fn into_collect_error(
        self,
        path: &Path,
        pending: Vec<FeatureRecord>,
        summary: CollectSummary,
    ) -> CollectError {
        let source = match self {
            Self::Dataset(source) => source,
            Self::Join(msg) => DatasetError::Persistence {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::Other, format!("flush task failed: {}", msg)),
            },
        };
        CollectError::Persistence { pending, summary, source }
    }
}

impl std::fmt::Display for FlushError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dataset(e) => write!(f, "{}", e),
            Self::Join(msg) => write!(f, "flush task failed: {}", msg),
        }
    }
}

/// Pull items until the queue is empty or the orchestrator stops listening
async fn worker<F: PageFetcher>(
    fetcher: Arc<F>,
    queue: Arc<Mutex<VecDeque<WorkItem>>>,
    tx: mpsc::Sender<Extraction>,
) {
    loop {
        let next = queue.lock().pop_front();
        let Some(item) = next else { break };

        let extraction = extract_from_web(fetcher.as_ref(), &item.url, Some(item.label)).await;
        if tx.send(extraction).await.is_err() {
            break;
        }
    }
}
