//! Threshold Configuration
//!
//! Decides the suspicious verdict from a classifier score.

use serde::{Deserialize, Serialize};

use super::inference::ClassScore;
use crate::constants::SUSPICIOUS_PROBABILITY;

/// Threshold Configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Probability of class 1 above which a URL is suspicious
    pub probability: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            probability: SUSPICIOUS_PROBABILITY,
        }
    }
}

impl ThresholdConfig {
    pub fn new(probability: f32) -> Self {
        Self { probability }
    }

    /// Predicted class 1 OR probability strictly above the threshold
    pub fn is_suspicious(&self, score: &ClassScore) -> bool {
        score.label == 1 || score.probability > self.probability
    }
}
