use crate::cli::{DirArgs, LabelArgs, StrategyArg};
use crate::infra::apply_dir_overrides;
use decision_match::config::{AppConfig, PathsConfig, WeakLabelParams};
use decision_match::error::AppError;
use decision_match::labeling::{label_by_score, label_by_status_file, LabelSummary};
use decision_match::records::{ingest as ingest_raw, IngestSummary, InterimTables, RawInputs};
use decision_match::reports::{run_drift_report, run_interview_reports, DriftOutputs, InterviewReportSummary};
use decision_match::scoring::{score_pairs, ScoringSummary, SCORES_FILE};
use decision_match::telemetry;
use decision_match::training::{
    train_baseline, train_cross_validated, CrossValidationMetrics, HoldoutMetrics,
    TrainingCorpus, TrainingOutputs,
};
use tracing::{info, warn};

/// Environment configuration with the command-line directory overrides, logging installed.
pub(crate) fn load_config(dirs: &DirArgs) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    apply_dir_overrides(&mut config.paths, dirs);
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

fn format_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.4}"))
}

pub(crate) fn ingest(paths: &PathsConfig) -> Result<IngestSummary, AppError> {
    let inputs = RawInputs::locate(paths)?;
    let summary = ingest_raw(&inputs, &paths.interim_dir())?;
    println!(
        "Ingested {} jobs, {} prospects, {} applicants into {}",
        summary.jobs,
        summary.prospects,
        summary.applicants,
        paths.interim_dir().display()
    );
    Ok(summary)
}

pub(crate) fn score(paths: &PathsConfig) -> Result<ScoringSummary, AppError> {
    let tables = InterimTables::in_dir(&paths.interim_dir());
    let summary = score_pairs(&tables, &paths.processed_dir())?;
    println!(
        "Scored {} pairs across {} jobs -> {}",
        summary.pairs,
        summary.jobs,
        summary.output.display()
    );
    Ok(summary)
}

pub(crate) fn label(paths: &PathsConfig, args: &LabelArgs) -> Result<LabelSummary, AppError> {
    let prospects = InterimTables::in_dir(&paths.interim_dir()).prospects;
    let summary = match args.strategy {
        StrategyArg::Score => {
            let config_file = paths.weak_labels_yaml();
            let (params, from_file) = WeakLabelParams::load(&config_file);
            let params = params.with_overrides(args.top_k, args.min_score, args.quantile);
            info!(
                top_k = params.top_k,
                min_score = params.min_score,
                quantile = params.quantile,
                "weak label parameters"
            );
            label_by_score(
                &prospects,
                &paths.processed_dir().join(SCORES_FILE),
                &paths.processed_dir(),
                &params,
                from_file.then_some(config_file.as_path()),
            )?
        }
        StrategyArg::Status => label_by_status_file(&prospects, &paths.processed_dir())?,
    };
    println!(
        "Labeled {} pairs ({} positive, {} negative) -> {}",
        summary.counts.total,
        summary.counts.positivos,
        summary.counts.negativos,
        summary.output.display()
    );
    Ok(summary)
}

fn load_corpus(paths: &PathsConfig) -> Result<TrainingCorpus, AppError> {
    let inputs = RawInputs::locate(paths)?;
    Ok(TrainingCorpus::load(&inputs)?)
}

pub(crate) fn train(paths: &PathsConfig) -> Result<(HoldoutMetrics, TrainingOutputs), AppError> {
    let corpus = load_corpus(paths)?;
    let (metrics, outputs) = train_baseline(&corpus, &paths.models_dir)?;
    println!(
        "Holdout on {} validation pairs: AUC {} | accuracy {:.4} | F1 {:.4} | threshold {:.3}",
        metrics.n_val,
        format_metric(metrics.auc_val),
        metrics.accuracy_val,
        metrics.f1_val,
        metrics.threshold_final
    );
    println!("Model saved to {}", outputs.model.display());
    Ok((metrics, outputs))
}

pub(crate) fn train_cv(
    paths: &PathsConfig,
) -> Result<(CrossValidationMetrics, TrainingOutputs), AppError> {
    let corpus = load_corpus(paths)?;
    let (metrics, outputs) = train_cross_validated(&corpus, &paths.models_dir)?;
    println!(
        "{}-fold CV on {} pairs: AUC {} ± {} | F1 {:.4} ± {:.4}",
        metrics.n_splits,
        metrics.n_total,
        format_metric(metrics.auc_mean),
        format_metric(metrics.auc_std),
        metrics.f1_mean,
        metrics.f1_std
    );
    println!("Model saved to {}", outputs.model.display());
    Ok((metrics, outputs))
}

pub(crate) fn interviews(paths: &PathsConfig) -> Result<InterviewReportSummary, AppError> {
    let summary = run_interview_reports(paths)?;
    println!(
        "Analysed {} interview answers, {} tables, report at {}",
        summary.interviews,
        summary.tables.len(),
        summary.report.display()
    );
    Ok(summary)
}

pub(crate) fn drift(paths: &PathsConfig) -> Result<DriftOutputs, AppError> {
    let corpus = load_corpus(paths)?;
    let outputs = run_drift_report(&corpus, &paths.docs_dir)?;
    println!(
        "Drift on score_tecnico: PSI {:.4} | KS {:.4} -> {}",
        outputs.summary.psi,
        outputs.summary.ks,
        outputs.html.display()
    );
    Ok(outputs)
}

/// Every batch stage in dependency order. The interview report is skipped
/// when there is no interview file.
pub(crate) fn run_all(paths: &PathsConfig, args: &LabelArgs) -> Result<(), AppError> {
    ingest(paths)?;
    score(paths)?;
    label(paths, args)?;
    train(paths)?;
    if paths.interviews_csv().exists() {
        interviews(paths)?;
    } else {
        warn!(
            path = %paths.interviews_csv().display(),
            "interview file missing, skipping the interview report"
        );
    }
    println!("Pipeline finished. See {}", paths.docs_dir.display());
    Ok(())
}
