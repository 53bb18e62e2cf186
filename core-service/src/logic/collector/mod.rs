//! Collector Module - concurrent dataset assembly
//!
//! Dedup against the dataset, fetch + extract on a bounded worker pool,
//! merge-append results in batches.

mod orchestrator;
mod types;


pub use orchestrator::Collector;
pub use types::{CollectConfig, CollectError, CollectSummary};
pub use crate::logic::dataset::WorkItem;
