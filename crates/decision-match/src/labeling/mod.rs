//! Label assembly for (job, candidate) pairs.

mod status;
mod weak;

pub use status::{is_positive, label_by_status, label_from_text, StatusLabel};
pub use weak::{label_group, label_pairs, LabeledPair, ScoredProspect};

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::WeakLabelParams;
use crate::records::{read_prospects_csv, FlatTable, ProspectRecord, RecordsError};

pub const LABELS_FILE: &str = "labels_by_candidato_vaga.csv";
pub const LABELS_META_FILE: &str = "labels_meta.json";

const SCORE_COLUMNS: &[&str] = &["score_tecnico", "score", "score_modelo", "score_similarity"];

#[derive(Debug, thiserror::Error)]
pub enum LabelingError {
    #[error(transparent)]
    Records(#[from] RecordsError),
    #[error("failed to write labels to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("failed to hash {path}: {source}")]
    Hash {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write label metadata to {path}: {source}")]
    Meta {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// How pair labels are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelStrategy {
    /// Similarity rank per job, thresholds nudged by status.
    Score,
    /// Explicit statuses and comments only.
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LabelCounts {
    pub total: usize,
    pub positivos: usize,
    pub negativos: usize,
}

impl LabelCounts {
    fn from_labels(labels: impl Iterator<Item = u8>) -> Self {
        let (mut total, mut positivos) = (0, 0);
        for y in labels {
            total += 1;
            positivos += usize::from(y == 1);
        }
        Self {
            total,
            positivos,
            negativos: total - positivos,
        }
    }
}

/// Audit record written next to the labels.
#[derive(Debug, Clone, Serialize)]
pub struct LabelsMeta {
    pub generated_at_utc: DateTime<Utc>,
    pub strategy: LabelStrategy,
    pub params: Option<WeakLabelParams>,
    pub config_file_used: Option<PathBuf>,
    pub scores_csv_exists: bool,
    /// Hex MD5 of the scores file the labels were computed from.
    pub scores_csv_md5: Option<String>,
    pub scores_rows: usize,
    pub output_csv: PathBuf,
    pub counts: LabelCounts,
}

#[derive(Debug, Clone)]
pub struct LabelSummary {
    pub counts: LabelCounts,
    pub output: PathBuf,
    pub meta: PathBuf,
}

/// Read scores keyed by (job, candidate), using the first known score column.
/// Unparseable cells count as 0.0; a later row for the same pair wins.
pub fn read_pair_scores(path: &Path) -> Result<HashMap<(String, String), f64>, RecordsError> {
    let table = FlatTable::read_csv(path)?;
    let (Some(job), Some(candidate)) = (
        table.column_index("vaga_code"),
        table.column_index("candidato_code"),
    ) else {
        return Err(RecordsError::MissingColumn {
            path: path.to_path_buf(),
            column: "vaga_code/candidato_code".to_string(),
        });
    };
    let Some(score) = SCORE_COLUMNS
        .iter()
        .find_map(|column| table.column_index(column))
    else {
        warn!(path = %path.display(), "no score column found, scores default to 0.0");
        return Ok(HashMap::new());
    };

    Ok(table
        .rows()
        .map(|row| {
            let value = row[score].trim().parse::<f64>().ok().filter(|v| v.is_finite());
            ((row[job].clone(), row[candidate].clone()), value.unwrap_or(0.0))
        })
        .collect())
}

/// Hex MD5 digest of the file at `path`, `None` when it does not exist.
pub fn file_md5(path: &Path) -> std::io::Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let mut hasher = Md5::new();
    hasher.update(fs::read(path)?);
    let digest = hasher.finalize();
    Ok(Some(digest.iter().map(|byte| format!("{byte:02x}")).collect()))
}

/// Valid pairs with duplicates collapsed to their last occurrence.
fn last_occurrences(prospects: Vec<ProspectRecord>) -> Vec<ProspectRecord> {
    let mut last_index: HashMap<(String, String), usize> = HashMap::new();
    let valid: Vec<ProspectRecord> = prospects.into_iter().filter(ProspectRecord::has_pair).collect();
    for (index, prospect) in valid.iter().enumerate() {
        last_index.insert(
            (prospect.vaga_code.clone(), prospect.candidato_code.clone()),
            index,
        );
    }
    valid
        .into_iter()
        .enumerate()
        .filter(|(index, prospect)| {
            last_index.get(&(prospect.vaga_code.clone(), prospect.candidato_code.clone()))
                == Some(index)
        })
        .map(|(_, prospect)| prospect)
        .collect()
}

/// Weak-label the interim prospects using `scores.csv` when present.
pub fn label_by_score(
    prospects_csv: &Path,
    scores_csv: &Path,
    processed_dir: &Path,
    params: &WeakLabelParams,
    config_file: Option<&Path>,
) -> Result<LabelSummary, LabelingError> {
    let prospects = last_occurrences(read_prospects_csv(prospects_csv)?);
    info!(pairs = prospects.len(), "prospects loaded for labeling");

    let scores_csv_exists = scores_csv.exists();
    let scores = if scores_csv_exists {
        read_pair_scores(scores_csv)?
    } else {
        warn!(path = %scores_csv.display(), "scores file missing, every score is 0.0");
        HashMap::new()
    };

    let scored: Vec<ScoredProspect> = prospects
        .into_iter()
        .map(|prospect| {
            let score_tecnico = scores
                .get(&(prospect.vaga_code.clone(), prospect.candidato_code.clone()))
                .copied()
                .unwrap_or(0.0);
            ScoredProspect {
                vaga_code: prospect.vaga_code,
                candidato_code: prospect.candidato_code,
                nome: prospect.nome,
                situacao: prospect.situacao,
                situacao_norm: prospect.situacao_norm,
                score_tecnico,
            }
        })
        .collect();

    let labels = label_pairs(scored, params);
    let output = processed_dir.join(LABELS_FILE);
    write_rows(&output, &labels)?;

    let counts = LabelCounts::from_labels(labels.iter().map(|pair| pair.y));
    info!(
        total = counts.total,
        positivos = counts.positivos,
        negativos = counts.negativos,
        path = %output.display(),
        "weak labels written"
    );

    let scores_csv_md5 = file_md5(scores_csv).map_err(|source| LabelingError::Hash {
        path: scores_csv.to_path_buf(),
        source,
    })?;
    let meta = LabelsMeta {
        generated_at_utc: Utc::now(),
        strategy: LabelStrategy::Score,
        params: Some(params.clone()),
        config_file_used: config_file.map(Path::to_path_buf),
        scores_csv_exists,
        scores_csv_md5,
        scores_rows: scores.len(),
        output_csv: output.clone(),
        counts,
    };
    let meta_path = write_meta(processed_dir, &meta)?;

    Ok(LabelSummary {
        counts,
        output,
        meta: meta_path,
    })
}

/// Label the interim prospects from their statuses and comments only.
pub fn label_by_status_file(prospects_csv: &Path, processed_dir: &Path) -> Result<LabelSummary, LabelingError> {
    let prospects = read_prospects_csv(prospects_csv)?;
    let labels = label_by_status(&prospects);
    let output = processed_dir.join(LABELS_FILE);
    write_rows(&output, &labels)?;

    let counts = LabelCounts::from_labels(labels.iter().map(|label| label.y));
    info!(
        total = counts.total,
        positivos = counts.positivos,
        path = %output.display(),
        "status labels written"
    );

    let meta = LabelsMeta {
        generated_at_utc: Utc::now(),
        strategy: LabelStrategy::Status,
        params: None,
        config_file_used: None,
        scores_csv_exists: false,
        scores_csv_md5: None,
        scores_rows: 0,
        output_csv: output.clone(),
        counts,
    };
    let meta_path = write_meta(processed_dir, &meta)?;

    Ok(LabelSummary {
        counts,
        output,
        meta: meta_path,
    })
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), LabelingError> {
    let write_error = |source| LabelingError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| write_error(csv::Error::from(err)))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(write_error)?;
    for row in rows {
        writer.serialize(row).map_err(write_error)?;
    }
    writer
        .flush()
        .map_err(|err| write_error(csv::Error::from(err)))
}

fn write_meta(dir: &Path, meta: &LabelsMeta) -> Result<PathBuf, LabelingError> {
    let path = dir.join(LABELS_META_FILE);
    let body = serde_json::to_string_pretty(meta).map_err(|err| LabelingError::Meta {
        path: path.clone(),
        source: std::io::Error::from(err),
    })?;
    fs::write(&path, body).map_err(|source| LabelingError::Meta {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::write_prospects;

    fn prospect(vaga: &str, cand: &str, status: &str) -> ProspectRecord {
        ProspectRecord {
            vaga_code: vaga.to_string(),
            candidato_code: cand.to_string(),
            situacao: status.to_string(),
            situacao_norm: crate::text::normalize_status(status),
            ..ProspectRecord::default()
        }
    }

    #[test]
    fn duplicates_keep_the_last_occurrence() {
        let kept = last_occurrences(vec![
            prospect("1", "a", "Inscrito"),
            prospect("1", "b", ""),
            prospect("1", "a", "Desistiu"),
            prospect("1", "", "sem codigo"),
        ]);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].candidato_code, "b");
        assert_eq!(kept[1].situacao, "Desistiu");
    }

    #[test]
    fn score_labels_and_meta_are_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prospects_csv = dir.path().join("interim/prospects.csv");
        write_prospects(
            &prospects_csv,
            &[
                prospect("1", "a", "Inscrito"),
                prospect("1", "b", ""),
                prospect("1", "c", ""),
                prospect("2", "d", ""),
            ],
        )
        .expect("prospects");

        let scores_csv = dir.path().join("processed/scores.csv");
        std::fs::create_dir_all(scores_csv.parent().expect("parent")).expect("dir");
        std::fs::write(
            &scores_csv,
            "vaga_code,candidato_code,score_tecnico\n1,a,0.9\n1,b,0.1\n1,c,0.0\n2,d,not-a-number\n",
        )
        .expect("scores");

        let summary = label_by_score(
            &prospects_csv,
            &scores_csv,
            &dir.path().join("processed"),
            &WeakLabelParams::default(),
            None,
        )
        .expect("labels");

        assert_eq!(summary.counts.total, 4);
        assert_eq!(summary.counts.positivos, 1);

        let mut reader = csv::Reader::from_path(&summary.output).expect("labels csv");
        let labels: Vec<LabeledPair> = reader
            .deserialize()
            .collect::<Result<_, _>>()
            .expect("rows");
        assert_eq!(labels[0].candidato_code, "a");
        assert_eq!(labels[0].y, 1);
        assert_eq!(labels[3].score_tecnico, 0.0);

        let meta: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&summary.meta).expect("meta"))
                .expect("json");
        assert_eq!(meta["strategy"], "score");
        assert_eq!(meta["scores_csv_exists"], true);
        let digest = meta["scores_csv_md5"].as_str().expect("md5 recorded");
        assert_eq!(digest.len(), 32);
        assert_eq!(Some(digest.to_string()), file_md5(&scores_csv).expect("hash"));
        assert_eq!(meta["params"]["top_k"], 2);
        assert_eq!(meta["counts"]["positivos"], 1);
    }

    #[test]
    fn md5_matches_known_digest_and_skips_missing_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scores.csv");
        std::fs::write(&path, "abc").expect("write");
        assert_eq!(
            file_md5(&path).expect("hash").as_deref(),
            Some("900150983cd24fb0d6963f7d28e17f72")
        );
        assert_eq!(file_md5(&dir.path().join("absent.csv")).expect("no file"), None);
    }

    #[test]
    fn alternative_score_column_is_used() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("scores.csv");
        std::fs::write(&path, "vaga_code,candidato_code,score_similarity\n1,a,0.4\n").expect("write");
        let scores = read_pair_scores(&path).expect("scores");
        assert_eq!(scores[&("1".to_string(), "a".to_string())], 0.4);
    }

    #[test]
    fn status_strategy_writes_pair_labels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prospects_csv = dir.path().join("prospects.csv");
        write_prospects(
            &prospects_csv,
            &[prospect("1", "a", "Contratado"), prospect("1", "b", "Prospect")],
        )
        .expect("prospects");

        let summary = label_by_status_file(&prospects_csv, dir.path()).expect("labels");
        assert_eq!(summary.counts.total, 2);
        assert_eq!(summary.counts.positivos, 1);
    }
}
