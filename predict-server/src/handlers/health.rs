//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use phishguard_core::logic::features::layout::{layout_hash, FEATURE_VERSION};
use phishguard_core::logic::fetcher::PageFetcher;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model_loaded: bool,
    model_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_detail: Option<String>,
    version: &'static str,
    timestamp: i64,
    feature_version: u8,
    layout_hash: String,
}

pub async fn check<F: PageFetcher>(State(state): State<AppState<F>>) -> Json<HealthResponse> {
    let model = state.predictor.health();
    Json(HealthResponse {
        status: "healthy",
        model_loaded: model.model_loaded,
        model_status: model.model_status,
        model_detail: model.detail,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        feature_version: FEATURE_VERSION,
        layout_hash: format!("{:08x}", layout_hash()),
    })
}
