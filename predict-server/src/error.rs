//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use phishguard_core::logic::serving::ServingError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// No usable model yet
    NotReady(String),

    // Request errors
    BadRequest(String),

    /// Model columns disagree with the feature layout
    SchemaMismatch(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotReady(reason) => {
                tracing::warn!("Prediction refused, model not ready: {}", reason);
                (StatusCode::SERVICE_UNAVAILABLE, "Model not loaded. Server may still be starting.".to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::SchemaMismatch(msg) => {
                tracing::error!("Schema mismatch: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ServingError> for AppError {
    fn from(err: ServingError) -> Self {
        match err {
            ServingError::NotReady(reason) => AppError::NotReady(reason),
            ServingError::BadRequest(msg) => AppError::BadRequest(msg),
            ServingError::SchemaMismatch(msg) => AppError::SchemaMismatch(msg),
            ServingError::Inference(e) => AppError::InternalError(e.to_string()),
        }
    }
}
