use crate::config::ConfigError;
use crate::labeling::LabelingError;
use crate::prediction::{PredictionError, ValidationError};
use crate::records::RecordsError;
use crate::reports::ReportError;
use crate::scoring::ScoringError;
use crate::telemetry::TelemetryError;
use crate::training::TrainingError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Records(RecordsError),
    Scoring(ScoringError),
    Labeling(LabelingError),
    Training(TrainingError),
    Prediction(PredictionError),
    Report(ReportError),
    Validation(ValidationError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Records(err) => write!(f, "ingest error: {}", err),
            AppError::Scoring(err) => write!(f, "scoring error: {}", err),
            AppError::Labeling(err) => write!(f, "labeling error: {}", err),
            AppError::Training(err) => write!(f, "training error: {}", err),
            AppError::Prediction(err) => write!(f, "prediction error: {}", err),
            AppError::Report(err) => write!(f, "report error: {}", err),
            AppError::Validation(err) => write!(f, "invalid request: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Records(err) => Some(err),
            AppError::Scoring(err) => Some(err),
            AppError::Labeling(err) => Some(err),
            AppError::Training(err) => Some(err),
            AppError::Prediction(err) => Some(err),
            AppError::Report(err) => Some(err),
            AppError::Validation(err) => Some(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Prediction(PredictionError::ModelUnavailable { .. })
            | AppError::Prediction(PredictionError::Artifact(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Records(_)
            | AppError::Scoring(_)
            | AppError::Labeling(_)
            | AppError::Training(_)
            | AppError::Prediction(_)
            | AppError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RecordsError> for AppError {
    fn from(value: RecordsError) -> Self {
        Self::Records(value)
    }
}

impl From<ScoringError> for AppError {
    fn from(value: ScoringError) -> Self {
        Self::Scoring(value)
    }
}

impl From<LabelingError> for AppError {
    fn from(value: LabelingError) -> Self {
        Self::Labeling(value)
    }
}

impl From<TrainingError> for AppError {
    fn from(value: TrainingError) -> Self {
        Self::Training(value)
    }
}

impl From<PredictionError> for AppError {
    fn from(value: PredictionError) -> Self {
        Self::Prediction(value)
    }
}

impl From<ReportError> for AppError {
    fn from(value: ReportError) -> Self {
        Self::Report(value)
    }
}

impl From<ValidationError> for AppError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unavailable_model_maps_to_503_with_error_body() {
        let error = AppError::from(PredictionError::ModelUnavailable {
            reason: "no model artifacts".to_string(),
        });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert!(body["error"]
            .as_str()
            .is_some_and(|message| message.contains("no model artifacts")));
    }

    #[test]
    fn validation_maps_to_422() {
        let response = AppError::from(ValidationError::Missing("job_text")).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn batch_failures_keep_their_source() {
        let error = AppError::from(TrainingError::NoPairs);
        assert_eq!(error.to_string(), format!("training error: {}", TrainingError::NoPairs));
        assert!(std::error::Error::source(&error).is_some());
    }
}
