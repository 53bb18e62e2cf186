use std::sync::Arc;

use parking_lot::Mutex;

use super::*;
use crate::logic::features::{extract, FEATURE_LAYOUT};
use crate::logic::fetcher::{FetchError, FixedFetcher};
use crate::logic::model::{Classifier, InferenceError, LoadedModel, ModelMetadata};

const PAGE: &str = r#"<form><input type="password"></form> please verify your account"#;

/// Returns a fixed score and remembers the last input
struct Recording {
    score: ClassScore,
    last: Mutex<Vec<f32>>,
}

impl Classifier for Recording {
    fn predict(&self, features: &[f32]) -> Result<ClassScore, InferenceError> {
        *self.last.lock() = features.to_vec();
        Ok(self.score)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

struct Failing;

impl Classifier for Failing {
    fn predict(&self, _features: &[f32]) -> Result<ClassScore, InferenceError> {
        Err(InferenceError("boom".to_string()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

fn ready(label: u8, probability: f32) -> (ModelState, Arc<Recording>) {
    let classifier = Arc::new(Recording {
        score: ClassScore { label, probability },
        last: Mutex::new(Vec::new()),
    });
    let model = LoadedModel::with_classifier(classifier.clone(), ModelMetadata::current("stub")).unwrap();
    (ModelState::Ready(model), classifier)
}

#[tokio::test]
async fn test_verdict_uses_layout_order() {
    let url = "https://secure-login.example.com/verify";
    let (state, classifier) = ready(0, 0.2);
    let predictor = Predictor::new(FixedFetcher::offline().with_page(url, PAGE), state);

    let verdict = predictor.predict_url(url).await.unwrap();
    assert!(!verdict.suspicious);
    assert_eq!(verdict.prediction, 0);
    assert_eq!(verdict.url, url);
    assert_eq!(verdict.features.has_password_field, 1);

    let sent = classifier.last.lock().clone();
    assert_eq!(sent.len(), FEATURE_LAYOUT.len());
    for (i, name) in FEATURE_LAYOUT.iter().enumerate() {
        assert_eq!(sent[i], verdict.features.get(name).unwrap() as f32, "{}", name);
    }
}

#[tokio::test]
async fn test_suspicious_by_label_or_probability() {
    let url = "https://example.com/";
    for (label, probability, expected) in [(1, 0.3, true), (0, 0.7, true), (0, 0.5, false)] {
        let (state, _) = ready(label, probability);
        let predictor = Predictor::new(FixedFetcher::offline().serve_all("<html></html>"), state);
        let verdict = predictor.predict_url(url).await.unwrap();
        assert_eq!(verdict.suspicious, expected, "label {} p {}", label, probability);
        assert_eq!(verdict.probability, probability);
    }
}

#[tokio::test]
async fn test_fetch_failure_still_predicts() {
    let url = "https://down.example.com/login";
    let (state, _) = ready(1, 0.9);
    let fetcher = FixedFetcher::offline().fail_all(FetchError::Status(500));
    let predictor = Predictor::new(fetcher, state);

    let verdict = predictor.predict_url(url).await.unwrap();
    assert!(verdict.suspicious);
    assert_eq!(verdict.features, extract(url, None, None).features);
}

#[tokio::test]
async fn test_not_ready_is_503() {
    let fetcher = FixedFetcher::offline();
    let predictor = Predictor::new(fetcher, ModelState::Unavailable("no artifact".to_string()));

    let err = predictor.predict_url("https://example.com/").await.unwrap_err();
    assert_eq!(err.status_code(), 503);
    assert!(!predictor.health().model_loaded);
    assert_eq!(predictor.health().model_status, "not_ready");
}

#[tokio::test]
async fn test_not_ready_before_fetch() {
    let predictor = Predictor::new(FixedFetcher::offline(), ModelState::Unavailable("x".to_string()));
    let _ = predictor.predict_url("https://example.com/").await;
    assert_eq!(predictor.fetcher.calls(), 0);
}

#[tokio::test]
async fn test_incompatible_model_is_hard_failure() {
    let mut metadata = ModelMetadata::current("stub");
    metadata.feature_columns.reverse();
    let state = ModelState::from_load(LoadedModel::with_classifier(Arc::new(Failing), metadata));
    assert!(matches!(state, ModelState::Incompatible(_)));

    let predictor = Predictor::new(FixedFetcher::offline(), state);
    let err = predictor.predict_url("https://example.com/").await.unwrap_err();
    assert!(matches!(err, ServingError::SchemaMismatch(_)));
    assert_eq!(err.status_code(), 500);
    assert_eq!(predictor.health().model_status, "schema_mismatch");
}

#[tokio::test]
async fn test_blank_url_is_bad_request() {
    let (state, _) = ready(0, 0.1);
    let predictor = Predictor::new(FixedFetcher::offline(), state);
    let err = predictor.predict_url("   ").await.unwrap_err();
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_inference_error_is_500() {
    let model = LoadedModel::with_classifier(Arc::new(Failing), ModelMetadata::current("stub")).unwrap();
    let predictor = Predictor::new(FixedFetcher::offline(), ModelState::Ready(model));
    let err = predictor.predict_url("https://example.com/").await.unwrap_err();
    assert_eq!(err, ServingError::Inference(InferenceError("boom".to_string())));
    assert_eq!(err.status_code(), 500);
}

#[test]
fn test_health_ready() {
    let (state, _) = ready(0, 0.0);
    let health = ModelHealth::from(&state);
    assert!(health.model_loaded);
    assert_eq!(health.model_status, "ready");
    assert_eq!(health.model_type.as_deref(), Some("stub"));
}
