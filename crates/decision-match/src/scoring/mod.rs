//! Relevance scores between job and candidate texts.

mod batch;
mod overlap;
mod rubric;
mod similarity;
pub mod tfidf;

pub use batch::{score_pairs, write_scores, PairScore, ScoringSummary, SCORES_FILE};
pub use overlap::score_tecnico;
pub use rubric::{score_text, RubricScores};
pub use similarity::compute_similarity;

use std::path::PathBuf;

use crate::records::RecordsError;

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error(transparent)]
    Records(#[from] RecordsError),
    #[error("failed to write scores to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
