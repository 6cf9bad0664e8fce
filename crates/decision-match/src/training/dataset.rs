use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::TrainingError;
use crate::labeling::label_from_text;
use crate::records::{read_json, section_text, RawInputs, RecordsError};
use crate::scoring::score_tecnico;
use crate::stats::quantile;

const JOB_SECTIONS: &[&str] = &["informacoes_basicas", "perfil_vaga", "beneficios"];
const APPLICANT_SECTIONS: &[&str] = &[
    "infos_basicas",
    "informacoes_pessoais",
    "informacoes_profissionais",
    "formacao_e_idiomas",
    "cargo_atual",
];
const APPLICANT_CV_KEYS: &[&str] = &["cv_pt", "cv_en"];

const CANDIDATE_KEYS: &[&str] = &["codigo"];
const STATUS_KEYS: &[&str] = &["situacao_candidado", "situacao", "status"];
const COMMENT_KEYS: &[&str] = &["comentario"];

/// Unlabeled rows are score-labeled only when at least this many exist.
const MIN_UNLABELED_FOR_SCORE_LABELS: usize = 10;
const POSITIVE_PERCENTILE: f64 = 0.70;
const NEGATIVE_PERCENTILE: f64 = 0.30;

/// The four inputs the match model sees for one pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchFeatures {
    pub job_text: String,
    pub cand_text: String,
    pub situacao_norm: String,
    pub score_tecnico: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingExample {
    pub vaga_code: String,
    pub candidato_code: String,
    pub features: MatchFeatures,
    pub y: u8,
}

/// A pair as read from the raw documents, with its explicit label if any.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub vaga_code: String,
    pub candidato_code: String,
    pub features: MatchFeatures,
    pub explicit_label: Option<u8>,
}

impl DatasetRow {
    fn labeled(self, y: u8) -> TrainingExample {
        TrainingExample {
            vaga_code: self.vaga_code,
            candidato_code: self.candidato_code,
            features: self.features,
            y,
        }
    }
}

/// Raw `Jobs.json`, `Prospects.json` and `Applicants.json` documents.
#[derive(Debug, Clone)]
pub struct TrainingCorpus {
    pub jobs: Value,
    pub prospects: Value,
    pub applicants: Value,
}

impl TrainingCorpus {
    pub fn load(inputs: &RawInputs) -> Result<Self, RecordsError> {
        Ok(Self {
            jobs: read_json(&inputs.jobs)?,
            prospects: read_json(&inputs.prospects)?,
            applicants: read_json(&inputs.applicants)?,
        })
    }

    /// One row per prospect object listed under a job.
    pub fn rows(&self) -> Vec<DatasetRow> {
        let empty = Map::new();
        let Some(prospects) = self.prospects.as_object() else {
            return Vec::new();
        };

        let mut rows = Vec::new();
        for (vaga_code, blob) in prospects {
            let Some(blob) = blob.as_object() else {
                continue;
            };
            let listed = [blob.get("prospects"), blob.get("prospeccoes")]
                .into_iter()
                .flatten()
                .find(|value| is_truthy(value));
            let Some(Value::Array(items)) = listed else {
                continue;
            };

            let job = object_at(&self.jobs, vaga_code).unwrap_or(&empty);
            let job_text = section_text(job, JOB_SECTIONS, &[]);

            for item in items.iter().filter_map(Value::as_object) {
                let candidato_code = first_key(item, CANDIDATE_KEYS)
                    .map(|value| text_of(Some(value)))
                    .unwrap_or_default();
                let status = text_of(first_key(item, STATUS_KEYS));
                let explicit_label = label_from_text(&status)
                    .or_else(|| first_key(item, COMMENT_KEYS).and_then(|c| label_from_text(&text_of(Some(c)))));

                let applicant = object_at(&self.applicants, &candidato_code).unwrap_or(&empty);
                let cand_text = section_text(applicant, APPLICANT_SECTIONS, APPLICANT_CV_KEYS);
                let score = score_tecnico(&job_text, &cand_text);

                rows.push(DatasetRow {
                    vaga_code: vaga_code.clone(),
                    candidato_code,
                    features: MatchFeatures {
                        job_text: job_text.clone(),
                        cand_text,
                        situacao_norm: status,
                        score_tecnico: score,
                    },
                    explicit_label,
                });
            }
        }
        rows
    }
}

fn object_at<'a>(document: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    document.as_object()?.get(key)?.as_object()
}

/// Value of the first of `keys` present in `item`, matching keys case-insensitively.
fn first_key<'a>(item: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|wanted| {
        item.iter()
            .find(|(key, _)| key.to_lowercase() == *wanted)
            .map(|(_, value)| value)
    })
}

fn text_of(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Number(_) => true,
    }
}

/// Keep the last row of each (job, candidate) pair, in order of those last rows.
fn dedup_last(examples: Vec<TrainingExample>) -> Vec<TrainingExample> {
    let mut last: HashMap<(String, String), usize> = HashMap::new();
    for (index, example) in examples.iter().enumerate() {
        last.insert(
            (example.vaga_code.clone(), example.candidato_code.clone()),
            index,
        );
    }
    examples
        .into_iter()
        .enumerate()
        .filter(|(index, example)| {
            last.get(&(example.vaga_code.clone(), example.candidato_code.clone())) == Some(index)
        })
        .map(|(_, example)| example)
        .collect()
}

fn ensure_two_classes(examples: &[TrainingExample]) -> Result<(), TrainingError> {
    let positives = examples.iter().filter(|example| example.y == 1).count();
    if positives == 0 || positives == examples.len() {
        return Err(TrainingError::SingleClass {
            examples: examples.len(),
        });
    }
    Ok(())
}

/// Only rows with an explicit status or comment label, deduplicated.
pub fn explicit_examples(rows: Vec<DatasetRow>) -> Result<Vec<TrainingExample>, TrainingError> {
    if rows.is_empty() {
        return Err(TrainingError::NoPairs);
    }
    let examples = dedup_last(
        rows.into_iter()
            .filter_map(|row| row.explicit_label.map(|y| row.labeled(y)))
            .collect(),
    );
    ensure_two_classes(&examples)?;
    Ok(examples)
}

/// Explicit labels plus score-extreme labels for the unlabeled rows.
///
/// With at least ten unlabeled rows, those scoring at or above the 70th
/// percentile of the unlabeled scores become positive and those at or below
/// the 30th become negative; the middle band, or every unlabeled row when
/// fewer exist, is dropped.
pub fn resolve_labels(rows: Vec<DatasetRow>) -> Result<Vec<TrainingExample>, TrainingError> {
    if rows.is_empty() {
        return Err(TrainingError::NoPairs);
    }

    let unlabeled_scores: Vec<f64> = rows
        .iter()
        .filter(|row| row.explicit_label.is_none())
        .map(|row| row.features.score_tecnico)
        .collect();
    let cutoffs = if unlabeled_scores.len() >= MIN_UNLABELED_FOR_SCORE_LABELS {
        quantile(&unlabeled_scores, POSITIVE_PERCENTILE)
            .zip(quantile(&unlabeled_scores, NEGATIVE_PERCENTILE))
    } else {
        None
    };

    let total_rows = rows.len();
    let examples: Vec<TrainingExample> = rows
        .into_iter()
        .filter_map(|row| {
            let y = match (row.explicit_label, cutoffs) {
                (Some(y), _) => Some(y),
                (None, Some((_, negative))) if row.features.score_tecnico <= negative => Some(0),
                (None, Some((positive, _))) if row.features.score_tecnico >= positive => Some(1),
                (None, _) => None,
            };
            y.map(|y| row.labeled(y))
        })
        .collect();
    let examples = dedup_last(examples);

    info!(
        rows = total_rows,
        unlabeled = unlabeled_scores.len(),
        examples = examples.len(),
        positives = examples.iter().filter(|example| example.y == 1).count(),
        "training labels resolved"
    );
    ensure_two_classes(&examples)?;
    Ok(examples)
}
