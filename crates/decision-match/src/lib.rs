//! Job/candidate matching prototype: record ingestion, heuristic and TF-IDF
//! scoring, weak labeling, a logistic-regression baseline and the prediction
//! service that serves it.

pub mod config;
pub mod error;
pub mod labeling;
pub mod prediction;
pub mod records;
pub mod reports;
pub mod scoring;
pub mod stats;
pub mod telemetry;
pub mod text;
pub mod training;
