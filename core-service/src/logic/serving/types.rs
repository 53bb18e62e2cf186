//! Serving types - verdict, model state, errors

use serde::Serialize;

use crate::logic::features::FeatureSet;
use crate::logic::model::{InferenceError, LoadedModel, ModelError};

/// Answer for one URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub suspicious: bool,
    /// Probability of class 1, in [0, 1]
    pub probability: f32,
    /// Raw predicted class
    pub prediction: u8,
    pub features: FeatureSet,
    pub url: String,
}

/// What the predictor has to work with
#[derive(Debug, Clone)]
pub enum ModelState {
    Ready(LoadedModel),
    /// Artifact missing or unreadable
    Unavailable(String),
    /// Artifact present but its columns disagree with the layout
    Incompatible(String),
}

impl ModelState {
    pub fn from_load(result: Result<LoadedModel, ModelError>) -> Self {
        match result {
            Ok(model) => Self::Ready(model),
            Err(e) if e.is_schema_mismatch() => Self::Incompatible(e.to_string()),
            Err(e) => Self::Unavailable(e.to_string()),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::Unavailable(_) => "not_ready",
            Self::Incompatible(_) => "schema_mismatch",
        }
    }
}

/// Health snapshot
#[derive(Debug, Clone, Serialize)]
pub struct ModelHealth {
    pub model_loaded: bool,
    pub model_status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
}

impl From<&ModelState> for ModelHealth {
    fn from(state: &ModelState) -> Self {
        let (detail, model_type) = match state {
            ModelState::Ready(model) => (None, Some(model.metadata.model_type.clone())),
            ModelState::Unavailable(reason) | ModelState::Incompatible(reason) => (Some(reason.clone()), None),
        };
        Self {
            model_loaded: state.is_ready(),
            model_status: state.label(),
            detail,
            model_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ServingError {
    /// No usable model
    NotReady(String),
    BadRequest(String),
    /// Model columns disagree with the feature layout
    SchemaMismatch(String),
    Inference(InferenceError),
}

impl ServingError {
    /// HTTP status the server answers with
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotReady(_) => 503,
            Self::BadRequest(_) => 400,
            Self::SchemaMismatch(_) | Self::Inference(_) => 500,
        }
    }
}

impl std::fmt::Display for ServingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotReady(reason) => write!(f, "Model not loaded: {}", reason),
            Self::BadRequest(msg) => write!(f, "{}", msg),
            Self::SchemaMismatch(msg) => write!(f, "{}", msg),
            Self::Inference(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ServingError {}

impl From<InferenceError> for ServingError {
    fn from(e: InferenceError) -> Self {
        Self::Inference(e)
    }
}
