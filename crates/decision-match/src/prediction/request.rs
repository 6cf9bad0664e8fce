use serde::{Deserialize, Serialize};

use crate::training::MatchFeatures;

fn default_mode() -> Option<String> {
    Some("raw".to_string())
}

/// Body of `POST /predict`. Fields are optional here so that missing ones
/// surface as validation errors instead of bare deserialization failures.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub job_text: Option<String>,
    #[serde(default)]
    pub cand_text: Option<String>,
    #[serde(default)]
    pub score_tecnico: Option<f64>,
    #[serde(default)]
    pub situacao_norm: Option<String>,
    #[serde(default = "default_mode")]
    pub mode: Option<String>,
}

/// A request that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPrediction {
    pub features: MatchFeatures,
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("field '{0}' is required")]
    Missing(&'static str),
    #[error("field '{0}' must not be empty")]
    Empty(&'static str),
    #[error("field 'score_tecnico' must be a finite number >= 0")]
    NegativeScore,
    #[error("{0}")]
    Body(String),
}

fn required_text(value: Option<String>, field: &'static str) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::Missing(field))?;
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    Ok(value)
}

impl PredictRequest {
    pub fn validate(self) -> Result<ValidPrediction, ValidationError> {
        let job_text = required_text(self.job_text, "job_text")?;
        let cand_text = required_text(self.cand_text, "cand_text")?;
        let score_tecnico = self
            .score_tecnico
            .ok_or(ValidationError::Missing("score_tecnico"))?;
        if !score_tecnico.is_finite() || score_tecnico < 0.0 {
            return Err(ValidationError::NegativeScore);
        }
        let situacao_norm = required_text(self.situacao_norm, "situacao_norm")?;

        Ok(ValidPrediction {
            features: MatchFeatures {
                job_text,
                cand_text,
                situacao_norm,
                score_tecnico,
            },
            mode: self.mode,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionDetails {
    pub mode: Option<String>,
    pub score_tecnico: f64,
    pub situacao_norm: String,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    pub y_prob: f64,
    pub y_pred: u8,
    pub details: PredictionDetails,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub threshold: f64,
}
