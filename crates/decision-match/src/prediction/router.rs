use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    routing::{get, post},
    Json, Router,
};

use super::request::{HealthResponse, PredictRequest, PredictResponse, ValidationError};
use super::service::PredictionService;
use crate::error::AppError;

/// `/health` and `/predict` over a shared prediction service. `/predict` reads
/// its body as JSON whatever the declared content type.
pub fn prediction_router(service: Arc<PredictionService>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/predict", post(predict_handler))
        .with_state(service)
}

pub(crate) async fn health_handler(
    State(service): State<Arc<PredictionService>>,
) -> Json<HealthResponse> {
    Json(service.health())
}

pub(crate) async fn predict_handler(
    State(service): State<Arc<PredictionService>>,
    body: Bytes,
) -> Result<Json<PredictResponse>, AppError> {
    let request: PredictRequest = serde_json::from_slice(&body)
        .map_err(|error| ValidationError::Body(format!("invalid JSON body: {error}")))?;
    let request = request.validate()?;
    Ok(Json(service.predict(request)?))
}
