use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::text::normalize_status;

pub const WEAK_LABELS_FILE: &str = "weak_labels.yaml";

const DEFAULT_TOP_K: usize = 2;
const DEFAULT_MIN_SCORE: f64 = 0.02;
const DEFAULT_QUANTILE: f64 = 0.85;
const DEFAULT_STATUS_ADJUSTMENT: f64 = 0.10;

const BOOST_STATUSES: &[&str] = &[
    "encaminhado ao requisitante",
    "entrevista tecnica",
    "prospect",
    "inscrito",
];

const PENALTY_STATUSES: &[&str] = &[
    "desistiu",
    "desistencia",
    "nao aprovado",
    "nao aprovado pelo cliente",
    "nao aprovado pelo rh",
    "nao aprovado pelo requisitante",
    "sem interesse nesta vaga",
];

/// Effective weak-labeling policy for one run.
///
/// Status sets hold normalized statuses (see [`normalize_status`]), so accented
/// and unaccented spellings of the same status compare equal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeakLabelParams {
    pub top_k: usize,
    pub min_score: f64,
    pub quantile: f64,
    /// Fractional threshold shift applied to boost (down) and penalty (up) statuses.
    pub status_adjustment: f64,
    pub boost_statuses: BTreeSet<String>,
    pub penalty_statuses: BTreeSet<String>,
    pub hard_positive_statuses: BTreeSet<String>,
    pub hard_negative_statuses: BTreeSet<String>,
    /// Restrict a group where everyone came out positive to its top-k.
    pub cap_all_positive: bool,
    /// Promote the best candidate when nobody is positive but the top score beats the base threshold.
    pub force_top_one: bool,
}

impl Default for WeakLabelParams {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_score: DEFAULT_MIN_SCORE,
            quantile: DEFAULT_QUANTILE,
            status_adjustment: DEFAULT_STATUS_ADJUSTMENT,
            boost_statuses: status_set(BOOST_STATUSES.iter().copied()),
            penalty_statuses: status_set(PENALTY_STATUSES.iter().copied()),
            hard_positive_statuses: BTreeSet::new(),
            hard_negative_statuses: BTreeSet::new(),
            cap_all_positive: true,
            force_top_one: true,
        }
    }
}

impl WeakLabelParams {
    /// Apply the keys present in a YAML policy file on top of `self`.
    pub fn merge_file(mut self, file: LabelPolicyFile) -> Self {
        if let Some(top_k) = file.top_k {
            self.top_k = top_k;
        }
        if let Some(min_score) = file.min_score {
            self.min_score = min_score;
        }
        if let Some(quantile) = file.quantile {
            self.quantile = quantile;
        }
        if let Some(adjustment) = file.status_adjustment {
            self.status_adjustment = adjustment;
        }
        if let Some(statuses) = file.boost_statuses {
            self.boost_statuses = status_set(statuses.iter().map(String::as_str));
        }
        if let Some(statuses) = file.penalty_statuses {
            self.penalty_statuses = status_set(statuses.iter().map(String::as_str));
        }
        if let Some(statuses) = file.hard_positive_statuses {
            self.hard_positive_statuses = status_set(statuses.iter().map(String::as_str));
        }
        if let Some(statuses) = file.hard_negative_statuses {
            self.hard_negative_statuses = status_set(statuses.iter().map(String::as_str));
        }
        if let Some(flag) = file.cap_all_positive {
            self.cap_all_positive = flag;
        }
        if let Some(flag) = file.force_top_one {
            self.force_top_one = flag;
        }
        self
    }

    /// Apply command-line overrides, which take precedence over the YAML file.
    pub fn with_overrides(
        mut self,
        top_k: Option<usize>,
        min_score: Option<f64>,
        quantile: Option<f64>,
    ) -> Self {
        if let Some(top_k) = top_k {
            self.top_k = top_k;
        }
        if let Some(min_score) = min_score {
            self.min_score = min_score;
        }
        if let Some(quantile) = quantile {
            self.quantile = quantile.clamp(0.0, 1.0);
        }
        self
    }

    /// Defaults merged with the YAML file at `path` when it exists and parses.
    ///
    /// Returns whether the file contributed to the result.
    pub fn load(path: &Path) -> (Self, bool) {
        match LabelPolicyFile::read(path) {
            Ok(Some(file)) => {
                info!(path = %path.display(), "weak label policy loaded");
                (Self::default().merge_file(file), true)
            }
            Ok(None) => (Self::default(), false),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring weak label policy file");
                (Self::default(), false)
            }
        }
    }
}

fn status_set<'a>(statuses: impl Iterator<Item = &'a str>) -> BTreeSet<String> {
    statuses
        .map(normalize_status)
        .filter(|status| !status.is_empty())
        .collect()
}

/// Optional keys accepted in `configs/weak_labels.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct LabelPolicyFile {
    pub top_k: Option<usize>,
    pub min_score: Option<f64>,
    pub quantile: Option<f64>,
    pub status_adjustment: Option<f64>,
    pub boost_statuses: Option<Vec<String>>,
    pub penalty_statuses: Option<Vec<String>>,
    pub hard_positive_statuses: Option<Vec<String>>,
    pub hard_negative_statuses: Option<Vec<String>>,
    pub cap_all_positive: Option<bool>,
    pub force_top_one: Option<bool>,
}

impl LabelPolicyFile {
    /// Parse the policy file; `Ok(None)` when it does not exist or holds no mapping.
    pub fn read(path: &Path) -> Result<Option<Self>, PolicyFileError> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(path)?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Option<Self>, PolicyFileError> {
        let value: serde_yaml::Value = serde_yaml::from_str(raw)?;
        if !value.is_mapping() {
            return Ok(None);
        }
        Ok(Some(serde_yaml::from_value(value)?))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyFileError {
    #[error("failed to read policy file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid policy file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_balance() {
        let params = WeakLabelParams::default();
        assert_eq!(params.top_k, 2);
        assert!((params.min_score - 0.02).abs() < f64::EPSILON);
        assert!((params.quantile - 0.85).abs() < f64::EPSILON);
        assert!(params.boost_statuses.contains("entrevista tecnica"));
        assert!(params.penalty_statuses.contains("nao aprovado pelo rh"));
        assert!(params.hard_positive_statuses.is_empty());
        assert!(params.cap_all_positive && params.force_top_one);
    }

    #[test]
    fn yaml_overrides_only_present_keys() {
        let file = LabelPolicyFile::parse("top_k: 3\nquantile: 0.5\n")
            .expect("valid yaml")
            .expect("mapping");
        let params = WeakLabelParams::default().merge_file(file);
        assert_eq!(params.top_k, 3);
        assert!((params.quantile - 0.5).abs() < f64::EPSILON);
        assert!((params.min_score - 0.02).abs() < f64::EPSILON);
    }

    #[test]
    fn yaml_statuses_are_normalized() {
        let file = LabelPolicyFile::parse("penalty_statuses:\n  - \"Não Aprovado\"\n")
            .expect("valid yaml")
            .expect("mapping");
        let params = WeakLabelParams::default().merge_file(file);
        assert_eq!(params.penalty_statuses.len(), 1);
        assert!(params.penalty_statuses.contains("nao aprovado"));
    }

    #[test]
    fn non_mapping_yaml_is_ignored() {
        assert!(LabelPolicyFile::parse("- 1\n- 2\n").expect("valid yaml").is_none());
    }

    #[test]
    fn cli_overrides_win_over_file() {
        let file = LabelPolicyFile::parse("top_k: 5\nmin_score: 0.1\n")
            .expect("valid yaml")
            .expect("mapping");
        let params = WeakLabelParams::default()
            .merge_file(file)
            .with_overrides(Some(1), None, Some(0.9));
        assert_eq!(params.top_k, 1);
        assert!((params.min_score - 0.1).abs() < f64::EPSILON);
        assert!((params.quantile - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn load_falls_back_on_broken_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(WEAK_LABELS_FILE);
        std::fs::write(&path, "top_k: [unclosed").expect("write");
        let (params, used) = WeakLabelParams::load(&path);
        assert!(!used);
        assert_eq!(params, WeakLabelParams::default());

        let (_, used) = WeakLabelParams::load(&dir.path().join("absent.yaml"));
        assert!(!used);
    }
}
