//! API info

use axum::Json;
use serde_json::{json, Value};

pub async fn info() -> Json<Value> {
    Json(json!({
        "name": "PhishGuard Prediction API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "GET /": "API information",
            "GET /health": "Health check and model status",
            "POST /predict": "Classify a URL, body: {\"url\": \"https://...\"}"
        }
    }))
}
