//! Prediction handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;

use phishguard_core::logic::fetcher::PageFetcher;
use phishguard_core::logic::serving::Verdict;

use crate::{AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub url: Option<String>,
}

pub async fn predict<F: PageFetcher>(
    State(state): State<AppState<F>>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<Verdict>> {
    // an unusable body is answered like a missing url, after the readiness check
    let url = match payload {
        Ok(Json(PredictRequest { url: Some(url) })) => url,
        Ok(_) => String::new(),
        Err(rejection) => {
            tracing::debug!("Unreadable predict body: {}", rejection);
            String::new()
        }
    };

    tracing::info!("Predicting URL: {}", url);
    let verdict = state.predictor.predict_url(&url).await?;
    Ok(Json(verdict))
}
