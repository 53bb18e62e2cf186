//! PhishGuard Prediction Server
//!
//! HTTP surface over the phishguard core predictor.
//!
//! # Architecture
//!
//! ```text
//! POST /predict ─▶ Predictor ─▶ PageFetcher ─▶ Feature Extractor ─▶ Classifier (ONNX)
//!                      │
//!                      └─ model artifact + pinned feature columns
//! ```

mod config;
mod error;
mod handlers;

#[cfg(test)]
mod tests;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phishguard_core::logic::fetcher::{HttpFetcher, PageFetcher};
use phishguard_core::logic::serving::Predictor;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging; `log` records from the core are bridged in by tracing-log
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "phishguard_server=debug,phishguard_core=info,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    tracing::info!("PhishGuard Prediction Server starting ({})...", config.environment);
    if !config.is_production() {
        tracing::info!("Model: {} / {}", config.model_path, config.model_meta_path);
    }

    // A missing or rejected model leaves the server up and answering 503
    let predictor = Predictor::from_paths(&config.model_paths(), config.fetch_config())?;

    let state = AppState {
        predictor: Arc::new(predictor),
    };
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutting down");
    }
}

/// Shared application state
pub struct AppState<F: PageFetcher = HttpFetcher> {
    pub predictor: Arc<Predictor<F>>,
}

impl<F: PageFetcher> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            predictor: self.predictor.clone(),
        }
    }
}

/// Create the main router with all routes
fn create_router<F: PageFetcher>(state: AppState<F>) -> Router {
    Router::new()
        .route("/", get(handlers::index::info))
        .route("/health", get(handlers::health::check::<F>))
        .route("/predict", post(handlers::predict::predict::<F>))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
