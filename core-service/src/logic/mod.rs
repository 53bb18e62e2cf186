//! Logic Module - extraction, collection and serving engines
//!
//! - `features/` - pinned layout + the one extraction path
//! - `scanner/` - HTML signal scanner
//! - `fetcher/` - timed page fetch with redirect following
//! - `dataset/` - CSV dataset store and work-item sources
//! - `collector/` - concurrent collection orchestrator
//! - `model/` - classifier artifact and ONNX inference
//! - `serving/` - URL -> verdict adapter used by the HTTP server

pub mod collector;
pub mod dataset;
pub mod features;
pub mod fetcher;
pub mod model;
pub mod scanner;
pub mod serving;
