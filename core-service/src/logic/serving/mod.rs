//! Serving Adapter - URL in, verdict out
//!
//! Same extractor as the collector, so a served feature vector is built
//! exactly like a training row. The vector is ordered by the column list in
//! the model metadata, which loading has already checked against the layout.

mod types;

#[cfg(test)]
mod tests;

pub use types::{ModelHealth, ModelState, ServingError, Verdict};

use crate::logic::features::{extract_from_web, ExtractionOutcome, FeatureVector};
use crate::logic::fetcher::{FetchConfig, FetchError, HttpFetcher, PageFetcher};
use crate::logic::model::{self, ClassScore, ModelPaths, ThresholdConfig};

pub struct Predictor<F: PageFetcher = HttpFetcher> {
    fetcher: F,
    model: ModelState,
    threshold: ThresholdConfig,
}

impl Predictor<HttpFetcher> {
    /// HTTP fetcher with the serving timeout, model loaded from `paths`
    pub fn from_paths(paths: &ModelPaths, fetch: FetchConfig) -> Result<Self, FetchError> {
        let fetcher = HttpFetcher::new(fetch)?;
        Ok(Self::new(fetcher, ModelState::from_load(model::load(paths))))
    }
}

impl<F: PageFetcher> Predictor<F> {
    pub fn new(fetcher: F, model: ModelState) -> Self {
        match &model {
            ModelState::Ready(m) => log::info!("Predictor ready ({})", m.classifier.name()),
            ModelState::Unavailable(reason) => log::warn!("Predictor not ready: {}", reason),
            ModelState::Incompatible(reason) => log::error!("Predictor model rejected: {}", reason),
        }
        Self {
            fetcher,
            model,
            threshold: ThresholdConfig::default(),
        }
    }

    pub fn with_threshold(mut self, threshold: ThresholdConfig) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn model(&self) -> &ModelState {
        &self.model
    }

    pub fn health(&self) -> ModelHealth {
        ModelHealth::from(&self.model)
    }

    /// Fetch, extract, classify. Fetch failures degrade the features and
    /// still produce a verdict.
    pub async fn predict_url(&self, url: &str) -> Result<Verdict, ServingError> {
        let loaded = match &self.model {
            ModelState::Ready(m) => m,
            ModelState::Unavailable(reason) => return Err(ServingError::NotReady(reason.clone())),
            ModelState::Incompatible(reason) => return Err(ServingError::SchemaMismatch(reason.clone())),
        };

        let url = url.trim();
        if url.is_empty() {
            return Err(ServingError::BadRequest("Missing \"url\" parameter".to_string()));
        }

        let extraction = extract_from_web(&self.fetcher, url, None).await;
        if let ExtractionOutcome::Degraded(reason) = &extraction.outcome {
            log::debug!("Predicting {} without page signals: {}", url, reason);
        }

        let features = extraction.record.features;
        log::debug!("Features for {}: {}", url, FeatureVector::from(&features).to_log_entry());
        let input = features
            .values_for(&loaded.metadata.feature_columns)
            .map_err(|e| ServingError::SchemaMismatch(e.to_string()))?;

        let score: ClassScore = loaded.classifier.predict(&input)?;
        let suspicious = self.threshold.is_suspicious(&score);
        log::info!(
            "{} -> prediction {} (p={:.3}, suspicious={})",
            url,
            score.label,
            score.probability,
            suspicious
        );

        Ok(Verdict {
            suspicious,
            probability: score.probability,
            prediction: score.label,
            features,
            url: extraction.record.url,
        })
    }
}
