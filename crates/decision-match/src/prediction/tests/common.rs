use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::prediction::{
    ModelError, ModelInput, ModelSource, PredictionError, PredictionService, ProbabilityModel,
};

/// Returns a fixed probability for the shapes it accepts and records every attempt.
pub(super) struct ShapeModel {
    pub(super) probability: f64,
    pub(super) accepts: &'static [&'static str],
    pub(super) attempts: Mutex<Vec<&'static str>>,
}

impl ShapeModel {
    pub(super) fn new(probability: f64, accepts: &'static [&'static str]) -> Self {
        Self {
            probability,
            accepts,
            attempts: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn attempts(&self) -> Vec<&'static str> {
        self.attempts.lock().expect("attempts lock").clone()
    }
}

impl ProbabilityModel for ShapeModel {
    fn predict_proba(&self, input: ModelInput<'_>) -> Result<f64, ModelError> {
        let shape = input.shape();
        self.attempts.lock().expect("attempts lock").push(shape);
        if self.accepts.contains(&shape) {
            Ok(self.probability)
        } else {
            Err(ModelError::UnsupportedInput { shape })
        }
    }
}

/// Hands out a model only after `available` is set, counting load attempts.
pub(super) struct StubSource {
    pub(super) model: Arc<ShapeModel>,
    pub(super) available: Mutex<bool>,
    pub(super) loads: AtomicUsize,
    pub(super) threshold: f64,
}

impl StubSource {
    pub(super) fn new(model: ShapeModel, available: bool, threshold: f64) -> Arc<Self> {
        Arc::new(Self {
            model: Arc::new(model),
            available: Mutex::new(available),
            loads: AtomicUsize::new(0),
            threshold,
        })
    }

    pub(super) fn make_available(&self) {
        *self.available.lock().expect("available lock") = true;
    }

    pub(super) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelSource for Arc<StubSource> {
    fn load_model(&self) -> Result<Arc<dyn ProbabilityModel>, PredictionError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if *self.available.lock().expect("available lock") {
            Ok(self.model.clone())
        } else {
            Err(PredictionError::ModelUnavailable {
                reason: "no model yet".to_string(),
            })
        }
    }

    fn load_threshold(&self) -> f64 {
        self.threshold
    }
}

pub(super) fn service_with(model: ShapeModel, available: bool, threshold: f64) -> (PredictionService, Arc<StubSource>) {
    let source = StubSource::new(model, available, threshold);
    (PredictionService::new(source.clone()), source)
}

pub(super) fn valid_body() -> Value {
    json!({
        "job_text": "desenvolvedor python sql",
        "cand_text": "analista python",
        "score_tecnico": 0.25,
        "situacao_norm": "prospect"
    })
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
