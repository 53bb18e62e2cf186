//! Model Artifact - classifier file + pinned feature columns
//!
//! A model is only usable together with the column list it was trained on.
//! Both files must exist and the list must equal the current layout.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ModelError;
use crate::constants;
use crate::logic::features::layout::{validate_columns, validate_layout, FEATURE_LAYOUT};

/// Where the two halves of a model live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    /// ONNX classifier
    pub model: PathBuf,
    /// JSON metadata with `feature_columns`
    pub metadata: PathBuf,
}

impl ModelPaths {
    pub fn new(model: impl Into<PathBuf>, metadata: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            metadata: metadata.into(),
        }
    }

    /// First missing file, if any
    pub fn missing(&self) -> Option<&Path> {
        [&self.model, &self.metadata]
            .into_iter()
            .find(|p| !p.is_file())
            .map(PathBuf::as_path)
    }
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::new(constants::get_model_path(), constants::get_model_meta_path())
    }
}

/// Sidecar written by the training side next to the ONNX file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Column order the model was trained with
    pub feature_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_version: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_hash: Option<u32>,
    #[serde(default = "default_model_type")]
    pub model_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trained_at: Option<String>,
}

fn default_model_type() -> String {
    "unknown".to_string()
}

impl ModelMetadata {
    /// Metadata matching the current layout
    pub fn current(model_type: impl Into<String>) -> Self {
        Self {
            feature_columns: FEATURE_LAYOUT.iter().map(|s| s.to_string()).collect(),
            feature_version: Some(crate::logic::features::layout::FEATURE_VERSION),
            layout_hash: Some(crate::logic::features::layout::layout_hash()),
            model_type: model_type.into(),
            trained_at: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|e| ModelError::Metadata {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| ModelError::Metadata {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Column list must equal the layout; version/hash must match when present
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_columns(&self.feature_columns).map_err(ModelError::Schema)?;
        if let (Some(version), Some(hash)) = (self.feature_version, self.layout_hash) {
            validate_layout(version, hash).map_err(ModelError::Layout)?;
        }
        Ok(())
    }
}
