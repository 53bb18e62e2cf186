use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use phishguard_core::logic::fetcher::FixedFetcher;
use phishguard_core::logic::model::{ClassScore, Classifier, InferenceError, LoadedModel, ModelMetadata};
use phishguard_core::logic::serving::{ModelState, Predictor};

use super::*;

struct Fixed(ClassScore);

impl Classifier for Fixed {
    fn predict(&self, _features: &[f32]) -> Result<ClassScore, InferenceError> {
        Ok(self.0)
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

fn app(model: ModelState) -> Router {
    let fetcher = FixedFetcher::offline().serve_all(r#"<form><input type="password"></form>"#);
    create_router(AppState {
        predictor: Arc::new(Predictor::new(fetcher, model)),
    })
}

fn ready(label: u8, probability: f32) -> ModelState {
    let classifier = Arc::new(Fixed(ClassScore { label, probability }));
    ModelState::Ready(LoadedModel::with_classifier(classifier, ModelMetadata::current("stub")).unwrap())
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(body: &str) -> Request<Body> {
    Request::post("/predict")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_predict_ok() {
    let (status, body) = send(app(ready(0, 0.8)), post_json(r#"{"url": "https://login.example.com/"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["suspicious"], json!(true));
    assert_eq!(body["prediction"], json!(0));
    assert_eq!(body["url"], json!("https://login.example.com/"));
    assert_eq!(body["features"]["has_password_field"], json!(1));
    assert_eq!(body["features"].as_object().unwrap().len(), 18);
}

#[tokio::test]
async fn test_predict_missing_url_is_400() {
    let (status, body) = send(app(ready(0, 0.1)), post_json("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], json!(400));
    assert!(body["error"].as_str().unwrap().contains("url"));

    let (status, _) = send(app(ready(0, 0.1)), post_json("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_without_model_is_503() {
    let model = ModelState::Unavailable("Model artifact not found: phishguard_model.onnx".to_string());
    let (status, body) = send(app(model), post_json(r#"{"url": "https://example.com/"}"#)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], json!(503));
}

#[tokio::test]
async fn test_schema_mismatch_is_500() {
    let model = ModelState::Incompatible("Feature schema mismatch; missing: has_punycode".to_string());
    let (status, body) = send(app(model), post_json(r#"{"url": "https://example.com/"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("has_punycode"));
}

#[tokio::test]
async fn test_health_reports_model() {
    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (status, body) = send(app(ready(0, 0.0)), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("healthy"));
    assert_eq!(body["model_loaded"], json!(true));
    assert_eq!(body["model_status"], json!("ready"));

    let request = Request::get("/health").body(Body::empty()).unwrap();
    let (_, body) = send(app(ModelState::Unavailable("missing".to_string())), request).await;
    assert_eq!(body["model_loaded"], json!(false));
}

#[tokio::test]
async fn test_index() {
    let request = Request::get("/").body(Body::empty()).unwrap();
    let (status, body) = send(app(ready(0, 0.0)), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"]["POST /predict"].is_string());
}
