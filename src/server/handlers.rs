use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::pipeline::PredictionResponse;
use crate::server::error::ApiError;
use crate::server::AppState;

/// Body of `POST /api/predict`. A missing or null list is treated as empty.
#[derive(Debug, Default, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub ingredients: Option<Vec<String>>,
}

/// POST /api/predict - Classify a list of ingredients
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let ingredients = request.ingredients.unwrap_or_default();

    let response = state.predictor.predict(ingredients).await?;

    debug!(
        ingredients = response.ingredients.len(),
        overall = %response.overall_classification,
        "Prediction served"
    );
    Ok(Json(response))
}

/// Any verb other than POST on the predict route.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub assets_ready: bool,
}

/// GET /api/health - Liveness plus asset readiness
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let assets_ready = state.predictor.is_ready();
    Json(HealthResponse {
        status: if assets_ready { "ready" } else { "loading" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        assets_ready,
    })
}
