use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use tracing::{info, warn};

use super::model::{predict_flexible, ModelError, ProbabilityModel};
use super::request::{HealthResponse, PredictResponse, PredictionDetails, ValidPrediction};
use crate::training::artifacts::THRESHOLD_FILE;
use crate::training::{latest_model_path, load_model, load_threshold, ArtifactError, DEFAULT_THRESHOLD};

/// Where the service gets its model from.
pub trait ModelSource: Send + Sync {
    fn load_model(&self) -> Result<Arc<dyn ProbabilityModel>, PredictionError>;
    fn load_threshold(&self) -> f64;
}

/// Models and the threshold read from a models directory.
#[derive(Debug, Clone)]
pub struct ModelsDir {
    dir: PathBuf,
}

impl ModelsDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl ModelSource for ModelsDir {
    fn load_model(&self) -> Result<Arc<dyn ProbabilityModel>, PredictionError> {
        let path = latest_model_path(&self.dir).ok_or_else(|| PredictionError::ModelUnavailable {
            reason: format!(
                "no trained model in {}; run `train` or `train-cv` first",
                self.dir.display()
            ),
        })?;
        let model = load_model(&path)?;
        info!(model = %path.display(), "match model loaded");
        Ok(Arc::new(model))
    }

    fn load_threshold(&self) -> f64 {
        let path = self.dir.join(THRESHOLD_FILE);
        if !path.exists() {
            return DEFAULT_THRESHOLD;
        }
        load_threshold(&path).unwrap_or_else(|error| {
            warn!(%error, default = DEFAULT_THRESHOLD, "threshold unreadable; using default");
            DEFAULT_THRESHOLD
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    #[error("model unavailable: {reason}")]
    ModelUnavailable { reason: String },
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Holds the loaded model and threshold, reloading lazily when no model is present.
pub struct PredictionService {
    source: Box<dyn ModelSource>,
    model: RwLock<Option<Arc<dyn ProbabilityModel>>>,
    threshold: RwLock<f64>,
}

impl PredictionService {
    /// Load what is available now; a missing model is not an error until a prediction needs it.
    pub fn new(source: impl ModelSource + 'static) -> Self {
        let threshold = source.load_threshold();
        let model = match source.load_model() {
            Ok(model) => Some(model),
            Err(error) => {
                warn!(%error, "starting without a model");
                None
            }
        };
        Self {
            source: Box::new(source),
            model: RwLock::new(model),
            threshold: RwLock::new(threshold),
        }
    }

    pub fn from_models_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(ModelsDir::new(dir))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
            .read()
            .map(|threshold| *threshold)
            .unwrap_or(DEFAULT_THRESHOLD)
    }

    pub fn model_loaded(&self) -> bool {
        self.model.read().map(|model| model.is_some()).unwrap_or(false)
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse {
            status: "ok".to_string(),
            model_loaded: self.model_loaded(),
            threshold: self.threshold(),
        }
    }

    fn current_model(&self) -> Result<Arc<dyn ProbabilityModel>, PredictionError> {
        if let Some(model) = self.model.read().ok().and_then(|model| model.clone()) {
            return Ok(model);
        }

        let model = self.source.load_model()?;
        let threshold = self.source.load_threshold();
        if let Ok(mut slot) = self.model.write() {
            *slot = Some(model.clone());
        }
        if let Ok(mut slot) = self.threshold.write() {
            *slot = threshold;
        }
        Ok(model)
    }

    pub fn predict(&self, request: ValidPrediction) -> Result<PredictResponse, PredictionError> {
        let model = self.current_model()?;
        let y_prob = predict_flexible(model.as_ref(), &request.features)?;
        let threshold = self.threshold();

        Ok(PredictResponse {
            y_prob,
            y_pred: u8::from(y_prob >= threshold),
            details: PredictionDetails {
                mode: request.mode,
                score_tecnico: request.features.score_tecnico,
                situacao_norm: request.features.situacao_norm,
                threshold,
            },
        })
    }
}
