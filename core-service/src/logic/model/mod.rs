//! Model Module - classifier artifact, inference, verdict threshold
//!
//! Loading is all-or-nothing: both artifact files present, metadata columns
//! equal to the pinned layout, then the ONNX session.

pub mod artifact;
pub mod inference;
pub mod threshold;


use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::logic::features::{LayoutMismatchError, SchemaMismatchError};

pub use artifact::{ModelMetadata, ModelPaths};
pub use inference::{ClassScore, Classifier, InferenceError, OnnxClassifier};
pub use threshold::ThresholdConfig;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// One of the two artifact files does not exist
    MissingArtifact(PathBuf),
    /// Metadata unreadable or not valid JSON
    Metadata { path: PathBuf, reason: String },
    Schema(SchemaMismatchError),
    Layout(LayoutMismatchError),
    Inference(InferenceError),
}

impl ModelError {
    /// Incompatible with the current layout (as opposed to absent/broken)
    pub fn is_schema_mismatch(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Layout(_))
    }
}

impl std::fmt::Display for ModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingArtifact(path) => write!(f, "Model artifact not found: {}", path.display()),
            Self::Metadata { path, reason } => {
                write!(f, "Invalid model metadata {}: {}", path.display(), reason)
            }
            Self::Schema(e) => write!(f, "{}", e),
            Self::Layout(e) => write!(f, "{}", e),
            Self::Inference(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ModelError {}

impl From<InferenceError> for ModelError {
    fn from(e: InferenceError) -> Self {
        Self::Inference(e)
    }
}

// ============================================================================
// LOADED MODEL
// ============================================================================

/// Validated classifier plus the metadata it was checked against
#[derive(Clone)]
pub struct LoadedModel {
    pub classifier: Arc<dyn Classifier>,
    pub metadata: ModelMetadata,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedModel {
    /// Wrap an already-built classifier after checking its metadata
    pub fn with_classifier(classifier: Arc<dyn Classifier>, metadata: ModelMetadata) -> Result<Self, ModelError> {
        metadata.validate()?;
        Ok(Self {
            classifier,
            metadata,
            loaded_at: Utc::now(),
        })
    }
}

impl std::fmt::Debug for LoadedModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedModel")
            .field("classifier", &self.classifier.name())
            .field("model_type", &self.metadata.model_type)
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

/// Check both files, validate metadata, then open the ONNX session
pub fn load(paths: &ModelPaths) -> Result<LoadedModel, ModelError> {
    let metadata = load_metadata(paths)?;
    let classifier = OnnxClassifier::load(&paths.model)?;
    let model = LoadedModel::with_classifier(Arc::new(classifier), metadata)?;
    log::info!(
        "Model ready: {} ({}, {} features)",
        paths.model.display(),
        model.metadata.model_type,
        model.metadata.feature_columns.len()
    );
    Ok(model)
}

/// Existence + metadata checks only; no ONNX session is created
pub fn load_metadata(paths: &ModelPaths) -> Result<ModelMetadata, ModelError> {
    if let Some(missing) = paths.missing() {
        return Err(ModelError::MissingArtifact(missing.to_path_buf()));
    }
    let metadata = ModelMetadata::load(&paths.metadata)?;
    if let Err(e) = metadata.validate() {
        log::error!("Model {} rejected: {}", paths.model.display(), e);
        return Err(e);
    }
    Ok(metadata)
}
