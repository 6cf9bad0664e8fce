//! Prediction service for (job, candidate) pairs and its HTTP routes.

mod model;
mod request;
pub mod router;
mod service;

#[cfg(test)]
mod tests;

pub use model::{predict_flexible, ModelError, ModelInput, ProbabilityModel};
pub use request::{
    HealthResponse, PredictRequest, PredictResponse, PredictionDetails, ValidPrediction,
    ValidationError,
};
pub use router::prediction_router;
pub use service::{ModelSource, ModelsDir, PredictionError, PredictionService};
