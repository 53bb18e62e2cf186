//! Configuration module

use std::env;
use std::time::Duration;

use phishguard_core::constants;
use phishguard_core::logic::fetcher::FetchConfig;
use phishguard_core::logic::model::ModelPaths;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// ONNX classifier file
    pub model_path: String,

    /// Model metadata (feature columns)
    pub model_meta_path: String,

    /// Page fetch timeout per prediction
    pub fetch_timeout: Duration,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),

            model_path: env::var("MODEL_PATH").unwrap_or_else(|_| constants::get_model_path()),

            model_meta_path: env::var("MODEL_META_PATH").unwrap_or_else(|_| constants::get_model_meta_path()),

            fetch_timeout: env::var("FETCH_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or_else(constants::get_serving_timeout),

            environment: env::var("ENVIRONMENT")
                .unwrap_or_else(|_| "development".to_string()),
        }
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn model_paths(&self) -> ModelPaths {
        ModelPaths::new(&self.model_path, &self.model_meta_path)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig::serving().with_timeout(self.fetch_timeout)
    }
}
