//! Model, threshold and metrics files under the models directory.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::pipeline::MatchPipeline;

pub const MODEL_FILE: &str = "model.json";
pub const CV_MODEL_FILE: &str = "model_cv.json";
pub const THRESHOLD_FILE: &str = "decision_threshold.json";
pub const METRICS_FILE: &str = "metrics.json";
pub const CV_METRICS_FILE: &str = "metrics_cv.json";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid artifact {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdFile {
    pub threshold: f64,
}

/// Holdout metrics of the baseline model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldoutMetrics {
    pub timestamp: DateTime<Utc>,
    pub n_total: usize,
    pub n_train: usize,
    pub n_val: usize,
    pub pos_rate_total: f64,
    pub pos_rate_train: f64,
    pub pos_rate_val: f64,
    /// `None` when the validation part holds a single class.
    pub auc_val: Option<f64>,
    pub accuracy_val: f64,
    pub f1_val: f64,
    pub precision_val: f64,
    pub recall_val: f64,
    pub threshold_train: f64,
    pub threshold_final: f64,
}

/// Fold means and sample standard deviations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationMetrics {
    pub n_total: usize,
    pub n_splits: usize,
    pub pos_rate_total: f64,
    pub auc_mean: Option<f64>,
    pub auc_std: Option<f64>,
    pub accuracy_mean: f64,
    pub accuracy_std: f64,
    pub f1_mean: f64,
    pub f1_std: f64,
    pub precision_mean: f64,
    pub precision_std: f64,
    pub recall_mean: f64,
    pub recall_std: f64,
}

/// Pretty-printed JSON, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let io_error = |source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let body = serde_json::to_string_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, body).map_err(io_error)
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let raw = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ArtifactError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_model(path: &Path) -> Result<MatchPipeline, ArtifactError> {
    read_json(path)
}

pub fn load_threshold(path: &Path) -> Result<f64, ArtifactError> {
    read_json::<ThresholdFile>(path).map(|file| file.threshold)
}

/// The most recently modified of the cross-validated and the holdout model.
pub fn latest_model_path(models_dir: &Path) -> Option<PathBuf> {
    [CV_MODEL_FILE, MODEL_FILE]
        .iter()
        .map(|name| models_dir.join(name))
        .filter_map(|path| {
            let modified = fs::metadata(&path).and_then(|meta| meta.modified()).ok()?;
            Some((modified, path))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}
