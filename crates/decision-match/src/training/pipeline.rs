//! Text plus score features feeding a logistic regression.

use serde::{Deserialize, Serialize};

use super::dataset::MatchFeatures;
use super::logistic::{LogisticModel, LogisticRegression};
use super::TrainingError;
use crate::scoring::tfidf::{SparseVector, TfidfConfig, TfidfVectorizer};
use crate::stats::std_dev;

/// Tagged text seen by the vectorizer for one pair.
pub fn combined_text(features: &MatchFeatures) -> String {
    format!(
        "[JOB]{} [CAND]{} [SIT]{} [SCORE]{:?}",
        features.job_text, features.cand_text, features.situacao_norm, features.score_tecnico
    )
}

/// The fitted match model: a TF-IDF vocabulary over the combined text, a
/// scaled `score_tecnico` column appended after it, and the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPipeline {
    vectorizer: TfidfVectorizer,
    score_scale: f64,
    classifier: LogisticModel,
}

impl MatchPipeline {
    pub fn fit(features: &[MatchFeatures], labels: &[u8]) -> Result<Self, TrainingError> {
        if features.is_empty() {
            return Err(TrainingError::NoPairs);
        }

        let texts: Vec<String> = features.iter().map(combined_text).collect();
        let mut vectorizer = TfidfVectorizer::new(TfidfConfig::word(1, 1));
        vectorizer.fit(&texts)?;

        let scores: Vec<f64> = features.iter().map(|f| f.score_tecnico).collect();
        let score_scale = std_dev(&scores, 0)
            .filter(|deviation| *deviation > 0.0)
            .unwrap_or(1.0);

        let mut pipeline = Self {
            vectorizer,
            score_scale,
            classifier: LogisticModel {
                weights: Vec::new(),
                intercept: 0.0,
            },
        };
        let rows = texts
            .iter()
            .zip(&scores)
            .map(|(text, score)| pipeline.row(text, *score))
            .collect::<Result<Vec<_>, _>>()?;
        pipeline.classifier = LogisticRegression::default().fit(&rows, labels, pipeline.n_features());
        Ok(pipeline)
    }

    pub fn n_features(&self) -> usize {
        self.vectorizer.vocabulary_len() + 1
    }

    fn row(&self, text: &str, score: f64) -> Result<SparseVector, TrainingError> {
        let mut row = self.vectorizer.transform(text)?;
        let scaled = score / self.score_scale;
        if scaled != 0.0 {
            row.push(self.vectorizer.vocabulary_len(), scaled);
        }
        Ok(row)
    }

    /// Probability that the pair is a match.
    pub fn predict_proba(&self, features: &MatchFeatures) -> Result<f64, TrainingError> {
        let row = self.row(&combined_text(features), features.score_tecnico)?;
        Ok(self.classifier.predict_proba(&row))
    }

    pub fn predict_proba_batch(&self, features: &[MatchFeatures]) -> Result<Vec<f64>, TrainingError> {
        features.iter().map(|f| self.predict_proba(f)).collect()
    }
}
