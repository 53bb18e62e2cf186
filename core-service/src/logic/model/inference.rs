//! Inference Engine - ONNX Runtime Integration
//!
//! The classifier is exported with a plain `[N, 2]` float probability
//! output and an int64 label output. Input is one `[1, FEATURE_COUNT]`
//! float tensor in layout order.

use std::path::Path;

use ndarray::Array2;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Value;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// Classifier output for one URL
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    /// Predicted class, 0 = legitimate, 1 = suspicious
    pub label: u8,
    /// Probability of class 1
    pub probability: f32,
}

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct InferenceError(pub String);

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InferenceError: {}", self.0)
    }
}

impl std::error::Error for InferenceError {}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// Trait for classifiers (ONNX, stubs in tests, ...)
pub trait Classifier: Send + Sync {
    /// `features` are in layout order
    fn predict(&self, features: &[f32]) -> Result<ClassScore, InferenceError>;

    fn name(&self) -> &str;
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

pub struct OnnxClassifier {
    /// `Session::run` needs exclusive access
    session: Mutex<Session>,
    label_output: Option<String>,
    probability_output: String,
    name: String,
}

impl OnnxClassifier {
    /// Load ONNX model from file
    pub fn load(model_path: &Path) -> Result<Self, InferenceError> {
        log::info!("Loading ONNX model from: {}", model_path.display());

        if !model_path.exists() {
            return Err(InferenceError(format!("Model not found: {}", model_path.display())));
        }

        let session = Session::builder()
            .map_err(|e| InferenceError(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| InferenceError(format!("Failed to set optimization: {}", e)))?
            .commit_from_file(model_path)
            .map_err(|e| InferenceError(format!("Failed to load model: {}", e)))?;

        let names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
        let probability_output = names
            .iter()
            .find(|n| n.to_lowercase().contains("prob"))
            .or_else(|| names.get(1))
            .or_else(|| names.first())
            .cloned()
            .ok_or_else(|| InferenceError("No output defined".to_string()))?;
        let label_output = names
            .iter()
            .find(|n| **n != probability_output && n.to_lowercase().contains("label"))
            .cloned();

        log::info!(
            "ONNX model loaded (probability output '{}', label output {:?})",
            probability_output,
            label_output
        );

        Ok(Self {
            session: Mutex::new(session),
            label_output,
            probability_output,
            name: model_path.display().to_string(),
        })
    }
}

impl Classifier for OnnxClassifier {
    fn predict(&self, features: &[f32]) -> Result<ClassScore, InferenceError> {
        let input_array = Array2::<f32>::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| InferenceError(format!("Array error: {}", e)))?;
        let input_tensor = Value::from_array(input_array)
            .map_err(|e| InferenceError(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| InferenceError(format!("Inference failed: {}", e)))?;

        let probabilities = outputs
            .get(&self.probability_output)
            .ok_or_else(|| InferenceError(format!("No output '{}'", self.probability_output)))?
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError(format!("Extract error: {}", e)))?
            .1;

        let probability = match probabilities {
            [_, p1, ..] => *p1,
            [p] => *p,
            [] => return Err(InferenceError("Empty probability output".to_string())),
        };

        let label = match &self.label_output {
            Some(name) => {
                let labels = outputs
                    .get(name)
                    .ok_or_else(|| InferenceError(format!("No output '{}'", name)))?
                    .try_extract_tensor::<i64>()
                    .map_err(|e| InferenceError(format!("Extract error: {}", e)))?
                    .1;
                match labels.first() {
                    Some(0) => 0,
                    Some(_) => 1,
                    None => return Err(InferenceError("Empty label output".to_string())),
                }
            }
            None => u8::from(probability > 0.5),
        };

        Ok(ClassScore { label, probability })
    }

    fn name(&self) -> &str {
        &self.name
    }
}
