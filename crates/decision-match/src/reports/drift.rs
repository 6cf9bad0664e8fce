//! Distribution drift of `score_tecnico` between a reference and a current sample.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::charts::{escape, histogram_svg, Series};
use super::{write_text, ReportError};
use crate::stats::quantile;
use crate::training::split::{stratified_split, HOLDOUT_FRACTION, SPLIT_SEED};
use crate::training::{explicit_examples, TrainingCorpus};

pub const DRIFT_HTML_FILE: &str = "drift_report.html";
pub const DRIFT_SUMMARY_FILE: &str = "drift_summary.json";

const PSI_BINS: usize = 10;
const PSI_SMOOTHING: f64 = 1e-6;
const HISTOGRAM_BINS: usize = 40;
const FEATURE: &str = "score_tecnico";
const METHOD: &str = "psi_ks";

/// Population Stability Index with bins cut at the deciles of `expected`.
pub fn population_stability_index(expected: &[f64], actual: &[f64], bins: usize) -> f64 {
    let mut edges = vec![f64::NEG_INFINITY];
    for step in 1..bins {
        if let Some(edge) = quantile(expected, step as f64 / bins as f64) {
            edges.push(edge);
        }
    }
    edges.push(f64::INFINITY);
    edges.sort_by(f64::total_cmp);
    edges.dedup();

    let expected_share = bin_shares(expected, &edges);
    let actual_share = bin_shares(actual, &edges);
    expected_share
        .iter()
        .zip(&actual_share)
        .map(|(e, a)| (a - e) * (a / e).ln())
        .sum()
}

/// Smoothed share of `values` in each `[edge, next)` bin; the last bin is closed.
fn bin_shares(values: &[f64], edges: &[f64]) -> Vec<f64> {
    let bins = edges.len().saturating_sub(1).max(1);
    let mut counts = vec![0usize; bins];
    for value in values.iter().filter(|v| !v.is_nan()) {
        let upper = edges.partition_point(|edge| edge <= value);
        let index = upper.saturating_sub(1).min(bins - 1);
        counts[index] += 1;
    }
    let total: usize = counts.iter().sum();
    let denominator = total as f64 + PSI_SMOOTHING * bins as f64;
    counts
        .into_iter()
        .map(|count| (count as f64 + PSI_SMOOTHING) / denominator)
        .collect()
}

/// Two-sample Kolmogorov-Smirnov statistic from a merge walk over both sorted samples.
pub fn kolmogorov_smirnov(expected: &[f64], actual: &[f64]) -> f64 {
    let mut e: Vec<f64> = expected.to_vec();
    let mut a: Vec<f64> = actual.to_vec();
    if e.is_empty() || a.is_empty() {
        return 0.0;
    }
    e.sort_by(f64::total_cmp);
    a.sort_by(f64::total_cmp);

    let (mut i, mut j) = (0, 0);
    let mut statistic: f64 = 0.0;
    while i < e.len() && j < a.len() {
        if e[i] <= a[j] {
            i += 1;
        } else {
            j += 1;
        }
        let gap = (i as f64 / e.len() as f64 - j as f64 / a.len() as f64).abs();
        statistic = statistic.max(gap);
    }
    statistic
}

/// Contents of `drift_summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftSummary {
    pub generated_at: DateTime<Utc>,
    pub feature: String,
    pub method: String,
    pub n_ref: usize,
    pub n_cur: usize,
    pub psi: f64,
    pub ks: f64,
}

impl DriftSummary {
    pub fn compare(reference: &[f64], current: &[f64]) -> Self {
        Self {
            generated_at: Utc::now(),
            feature: FEATURE.to_string(),
            method: METHOD.to_string(),
            n_ref: reference.len(),
            n_cur: current.len(),
            psi: population_stability_index(reference, current, PSI_BINS),
            ks: kolmogorov_smirnov(reference, current),
        }
    }
}

fn psi_reading(psi: f64) -> &'static str {
    if psi < 0.1 {
        "baixo"
    } else if psi <= 0.25 {
        "moderado"
    } else {
        "alto"
    }
}

/// Standalone HTML page with the metrics table and an inline histogram.
pub fn render_html(summary: &DriftSummary, reference: &[f64], current: &[f64]) -> String {
    let title = "Drift Report";
    let chart = histogram_svg(
        &format!("Distribuições: {}", summary.feature),
        &summary.feature,
        &[
            Series {
                name: "Referência (treino)",
                values: reference,
                color: "#4c72b0",
            },
            Series {
                name: "Atual (validação/proxy)",
                values: current,
                color: "#dd8452",
            },
        ],
        HISTOGRAM_BINS,
    );

    format!(
        r#"<!DOCTYPE html>
<html lang="pt-br">
<head>
<meta charset="utf-8" />
<title>{title}</title>
<style>
body {{ font-family: system-ui, -apple-system, Segoe UI, Roboto, Arial, sans-serif; max-width: 980px; margin: 24px auto; padding: 0 12px; }}
h1,h2 {{ margin: 0 0 12px 0; }}
.card {{ border: 1px solid #eee; border-radius: 10px; padding: 16px; margin-bottom: 16px; }}
table {{ border-collapse: collapse; width: 100%; }}
th, td {{ border: 1px solid #ddd; padding: 8px; }}
th {{ background: #fafafa; text-align: left; }}
.small {{ color: #666; font-size: 12px; }}
</style>
</head>
<body>
  <h1>{title}</h1>
  <div class="small">Gerado em {generated} | n_ref={n_ref} | n_cur={n_cur}</div>
  <div class="card">
    <h2>Resumo</h2>
    <table>
      <tr><th>métrica</th><th>valor</th><th>interpretação</th></tr>
      <tr><td>PSI</td><td>{psi:.4}</td><td>{reading}; PSI &lt; 0.1: baixo; 0.1 a 0.25: moderado; &gt; 0.25: alto</td></tr>
      <tr><td>KS</td><td>{ks:.4}</td><td>KS &gt; 0.1 costuma indicar mudança relevante</td></tr>
    </table>
  </div>
  <div class="card">
    <h2>Distribuições: {feature}</h2>
    {chart}
  </div>
  <div class="small">Fonte: comparação entre amostra de treino (referência) e validação (proxy de produção).</div>
</body>
</html>
"#,
        generated = summary.generated_at.to_rfc3339(),
        n_ref = summary.n_ref,
        n_cur = summary.n_cur,
        psi = summary.psi,
        reading = psi_reading(summary.psi),
        ks = summary.ks,
        feature = escape(&summary.feature),
    )
}

/// Files written by [`run_drift_report`].
#[derive(Debug, Clone)]
pub struct DriftOutputs {
    pub summary: DriftSummary,
    pub html: PathBuf,
    pub json: PathBuf,
}

/// Compare the training and validation parts of the explicitly labeled pairs.
pub fn run_drift_report(corpus: &TrainingCorpus, docs_dir: &Path) -> Result<DriftOutputs, ReportError> {
    let examples = explicit_examples(corpus.rows())?;
    let labels: Vec<u8> = examples.iter().map(|e| e.y).collect();
    let split = stratified_split(&labels, HOLDOUT_FRACTION, SPLIT_SEED)?;
    let reference: Vec<f64> = split
        .train
        .iter()
        .map(|i| examples[*i].features.score_tecnico)
        .collect();
    let current: Vec<f64> = split
        .test
        .iter()
        .map(|i| examples[*i].features.score_tecnico)
        .collect();

    let summary = DriftSummary::compare(&reference, &current);
    let html = docs_dir.join(DRIFT_HTML_FILE);
    let json = docs_dir.join(DRIFT_SUMMARY_FILE);
    write_text(&html, &render_html(&summary, &reference, &current))?;
    super::write_json(&json, &summary)?;

    info!(
        n_ref = summary.n_ref,
        n_cur = summary.n_cur,
        psi = summary.psi,
        ks = summary.ks,
        html = %html.display(),
        "drift report written"
    );
    Ok(DriftOutputs { summary, html, json })
}
