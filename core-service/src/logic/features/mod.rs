//! Features Module - Feature Extraction Engine
//!
//! - `layout` - pinned, versioned column order and keyword lists
//! - `url` - URL-derived features (no network)
//! - `record` - FeatureSet / FeatureRecord
//! - `vector` - versioned model input
//! - `extractor` - the single extraction path used by collector and predictor

pub mod extractor;
pub mod layout;
pub mod record;
pub mod url;
pub mod vector;


// Re-export common types
pub use extractor::{extract, extract_from_web, DegradedReason, Extraction, ExtractionOutcome};
pub use layout::{LayoutInfo, LayoutMismatchError, SchemaMismatchError, FEATURE_COUNT, FEATURE_LAYOUT};
pub use record::{FeatureRecord, FeatureSet};
pub use url::{UrlFeatures, UrlParseError, UrlParts};
pub use vector::FeatureVector;
