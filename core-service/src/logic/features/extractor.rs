//! Feature Extractor - URL × optional page → FeatureRecord
//!
//! Collector and predictor both call into here, so the two paths can never
//! disagree on feature semantics. Extraction never fails: a missing or
//! unusable page zeroes the page-derived fields and the result says why.

use serde::Serialize;

use super::record::{FeatureRecord, FeatureSet};
use super::url::{UrlFeatures, UrlParseError, UrlParts};
use crate::logic::fetcher::{FetchError, FetchedPage, PageFetcher};
use crate::logic::scanner;

/// Why page-derived fields are zero
#[derive(Debug, Clone, PartialEq)]
pub enum DegradedReason {
    /// URL could not be split; no fetch was attempted
    UnparsableUrl(UrlParseError),
    Fetch(FetchError),
}

impl std::fmt::Display for DegradedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnparsableUrl(e) => write!(f, "{}", e),
            Self::Fetch(e) => write!(f, "{}", e),
        }
    }
}

/// Whether the page was actually scanned
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionOutcome {
    Scanned,
    Degraded(DegradedReason),
}

impl ExtractionOutcome {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }
}

/// Record plus how it was obtained
#[derive(Debug, Clone)]
pub struct Extraction {
    pub record: FeatureRecord,
    pub outcome: ExtractionOutcome,
}

/// Summary string for logs and JSON output
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeSummary {
    pub scanned: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}

impl From<&ExtractionOutcome> for OutcomeSummary {
    fn from(outcome: &ExtractionOutcome) -> Self {
        match outcome {
            ExtractionOutcome::Scanned => Self { scanned: true, degraded_reason: None },
            ExtractionOutcome::Degraded(reason) => Self {
                scanned: false,
                degraded_reason: Some(reason.to_string()),
            },
        }
    }
}

/// Pure extraction. `page == None` means no page is available.
pub fn extract(url: &str, label: Option<u8>, page: Option<&FetchedPage>) -> FeatureRecord {
    let features = match UrlParts::parse(url) {
        Ok(parts) => {
            let url_features = UrlFeatures::from_parts(url, &parts);
            match page {
                Some(page) => FeatureSet::from_parts(&url_features, &scanner::scan(&page.body, &parts.netloc)),
                None => FeatureSet::url_only(&url_features),
            }
        }
        Err(_) => FeatureSet::url_only(&UrlFeatures::unparsed(url)),
    };

    FeatureRecord::new(url, label, features)
}

/// Fetch the page, then extract. Fetch failures degrade, never propagate.
pub async fn extract_from_web<F: PageFetcher>(fetcher: &F, url: &str, label: Option<u8>) -> Extraction {
    if let Err(e) = UrlParts::parse(url) {
        log::debug!("Not fetching {}: {}", url, e);
        return Extraction {
            record: extract(url, label, None),
            outcome: ExtractionOutcome::Degraded(DegradedReason::UnparsableUrl(e)),
        };
    }

    match fetcher.fetch(url).await {
        Ok(page) => Extraction {
            record: extract(url, label, Some(&page)),
            outcome: ExtractionOutcome::Scanned,
        },
        Err(e) => {
            log::debug!("Degraded extraction for {}: {}", url, e);
            Extraction {
                record: extract(url, label, None),
                outcome: ExtractionOutcome::Degraded(DegradedReason::Fetch(e)),
            }
        }
    }
}
