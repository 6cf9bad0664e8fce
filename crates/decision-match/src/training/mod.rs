//! Baseline match model: dataset assembly, fitting, evaluation and artifacts.

pub mod artifacts;
mod dataset;
pub mod evaluation;
mod logistic;
mod pipeline;
pub mod split;

pub use artifacts::{
    latest_model_path, load_model, load_threshold, ArtifactError, CrossValidationMetrics,
    HoldoutMetrics, ThresholdFile,
};
pub use dataset::{
    explicit_examples, resolve_labels, DatasetRow, MatchFeatures, TrainingCorpus, TrainingExample,
};
pub use evaluation::DEFAULT_THRESHOLD;
pub use logistic::{LogisticModel, LogisticRegression};
pub use pipeline::{combined_text, MatchPipeline};

use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::info;

use crate::records::RecordsError;
use crate::scoring::tfidf::TfidfError;
use crate::stats::{mean, std_dev};
use evaluation::{choose_threshold, evaluate, positive_rate, Evaluation};
use split::{stratified_k_fold, stratified_split, CV_FOLDS, HOLDOUT_FRACTION, SPLIT_SEED};

#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("no (job, candidate) pairs found; check the structure of the JSON inputs")]
    NoPairs,
    #[error("labeling left a single class across {examples} examples")]
    SingleClass { examples: usize },
    #[error("a class has {members} members; at least {required} are needed to stratify")]
    ClassTooSmall { members: usize, required: usize },
    #[error(transparent)]
    Records(#[from] RecordsError),
    #[error(transparent)]
    Vectorizer(#[from] TfidfError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

fn columns(examples: &[TrainingExample], indices: &[usize]) -> (Vec<MatchFeatures>, Vec<u8>) {
    indices
        .iter()
        .map(|index| (examples[*index].features.clone(), examples[*index].y))
        .unzip()
}

/// A model fitted on training rows with its threshold chosen on those rows.
fn fit_with_threshold(
    features: &[MatchFeatures],
    labels: &[u8],
) -> Result<(MatchPipeline, f64), TrainingError> {
    let pipeline = MatchPipeline::fit(features, labels)?;
    let probabilities = pipeline.predict_proba_batch(features)?;
    let threshold = choose_threshold(&probabilities, labels);
    Ok((pipeline, threshold))
}

/// Fitted baseline with its final threshold and holdout metrics.
#[derive(Debug, Clone)]
pub struct HoldoutRun {
    pub model: MatchPipeline,
    pub metrics: HoldoutMetrics,
}

/// Holdout evaluation on a stratified 80/20 split, then a refit on every example.
pub fn train_holdout(examples: &[TrainingExample]) -> Result<HoldoutRun, TrainingError> {
    let all_labels: Vec<u8> = examples.iter().map(|example| example.y).collect();
    let split = stratified_split(&all_labels, HOLDOUT_FRACTION, SPLIT_SEED)?;
    let (train_features, train_labels) = columns(examples, &split.train);
    let (val_features, val_labels) = columns(examples, &split.test);

    let (model, threshold_train) = fit_with_threshold(&train_features, &train_labels)?;
    let val_probabilities = model.predict_proba_batch(&val_features)?;
    let validation = evaluate(&val_labels, &val_probabilities, threshold_train);

    let all_features: Vec<MatchFeatures> = examples.iter().map(|e| e.features.clone()).collect();
    let (model, threshold_final) = fit_with_threshold(&all_features, &all_labels)?;

    let metrics = HoldoutMetrics {
        timestamp: Utc::now(),
        n_total: examples.len(),
        n_train: split.train.len(),
        n_val: split.test.len(),
        pos_rate_total: positive_rate(&all_labels),
        pos_rate_train: positive_rate(&train_labels),
        pos_rate_val: positive_rate(&val_labels),
        auc_val: validation.auc,
        accuracy_val: validation.accuracy,
        f1_val: validation.f1,
        precision_val: validation.precision,
        recall_val: validation.recall,
        threshold_train,
        threshold_final,
    };
    info!(
        n_total = metrics.n_total,
        n_train = metrics.n_train,
        n_val = metrics.n_val,
        auc_val = ?metrics.auc_val,
        accuracy_val = metrics.accuracy_val,
        f1_val = metrics.f1_val,
        threshold_train,
        threshold_final,
        "holdout evaluation finished"
    );
    Ok(HoldoutRun { model, metrics })
}

/// Fold metrics summarized, plus a model refitted on every example.
#[derive(Debug, Clone)]
pub struct CrossValidationRun {
    pub model: MatchPipeline,
    pub metrics: CrossValidationMetrics,
    pub folds: Vec<Evaluation>,
}

/// Stratified k-fold evaluation; each fold picks its threshold on its own training part.
pub fn cross_validate(
    examples: &[TrainingExample],
    n_splits: usize,
) -> Result<CrossValidationRun, TrainingError> {
    let all_labels: Vec<u8> = examples.iter().map(|example| example.y).collect();
    let splits = stratified_k_fold(&all_labels, n_splits, SPLIT_SEED)?;

    let mut folds = Vec::with_capacity(splits.len());
    for (fold, split) in splits.iter().enumerate() {
        let (train_features, train_labels) = columns(examples, &split.train);
        let (test_features, test_labels) = columns(examples, &split.test);
        let (model, threshold) = fit_with_threshold(&train_features, &train_labels)?;
        let evaluation = evaluate(&test_labels, &model.predict_proba_batch(&test_features)?, threshold);
        info!(
            fold = fold + 1,
            auc = ?evaluation.auc,
            accuracy = evaluation.accuracy,
            f1 = evaluation.f1,
            threshold,
            "cross-validation fold finished"
        );
        folds.push(evaluation);
    }

    let summary = |metric: fn(&Evaluation) -> f64| {
        let values: Vec<f64> = folds.iter().map(metric).collect();
        (
            mean(&values).unwrap_or(0.0),
            std_dev(&values, 1).unwrap_or(0.0),
        )
    };
    let aucs: Vec<f64> = folds.iter().filter_map(|fold| fold.auc).collect();
    let (accuracy_mean, accuracy_std) = summary(|fold: &Evaluation| fold.accuracy);
    let (f1_mean, f1_std) = summary(|fold: &Evaluation| fold.f1);
    let (precision_mean, precision_std) = summary(|fold: &Evaluation| fold.precision);
    let (recall_mean, recall_std) = summary(|fold: &Evaluation| fold.recall);

    let all_features: Vec<MatchFeatures> = examples.iter().map(|e| e.features.clone()).collect();
    let model = MatchPipeline::fit(&all_features, &all_labels)?;

    Ok(CrossValidationRun {
        model,
        metrics: CrossValidationMetrics {
            n_total: examples.len(),
            n_splits,
            pos_rate_total: positive_rate(&all_labels),
            auc_mean: mean(&aucs),
            auc_std: std_dev(&aucs, 1),
            accuracy_mean,
            accuracy_std,
            f1_mean,
            f1_std,
            precision_mean,
            precision_std,
            recall_mean,
            recall_std,
        },
        folds,
    })
}

/// Paths written by a training stage.
#[derive(Debug, Clone)]
pub struct TrainingOutputs {
    pub model: PathBuf,
    pub metrics: PathBuf,
    pub threshold: Option<PathBuf>,
}

/// `train`: explicit plus score-extreme labels, holdout metrics, final model and threshold.
pub fn train_baseline(
    corpus: &TrainingCorpus,
    models_dir: &Path,
) -> Result<(HoldoutMetrics, TrainingOutputs), TrainingError> {
    let examples = resolve_labels(corpus.rows())?;
    let run = train_holdout(&examples)?;

    let outputs = TrainingOutputs {
        model: models_dir.join(artifacts::MODEL_FILE),
        metrics: models_dir.join(artifacts::METRICS_FILE),
        threshold: Some(models_dir.join(artifacts::THRESHOLD_FILE)),
    };
    artifacts::write_json(&outputs.model, &run.model)?;
    if let Some(path) = &outputs.threshold {
        artifacts::write_json(
            path,
            &ThresholdFile {
                threshold: run.metrics.threshold_final,
            },
        )?;
    }
    artifacts::write_json(&outputs.metrics, &run.metrics)?;
    info!(model = %outputs.model.display(), "baseline model saved");
    Ok((run.metrics, outputs))
}

/// `train-cv`: explicitly labeled pairs only, five stratified folds.
pub fn train_cross_validated(
    corpus: &TrainingCorpus,
    models_dir: &Path,
) -> Result<(CrossValidationMetrics, TrainingOutputs), TrainingError> {
    let examples = explicit_examples(corpus.rows())?;
    let run = cross_validate(&examples, CV_FOLDS)?;

    let outputs = TrainingOutputs {
        model: models_dir.join(artifacts::CV_MODEL_FILE),
        metrics: models_dir.join(artifacts::CV_METRICS_FILE),
        threshold: None,
    };
    artifacts::write_json(&outputs.model, &run.model)?;
    artifacts::write_json(&outputs.metrics, &run.metrics)?;
    info!(
        model = %outputs.model.display(),
        auc_mean = ?run.metrics.auc_mean,
        "cross-validated model saved"
    );
    Ok((run.metrics, outputs))
}
