//! Raw hiring records: JSON loaders, flattened CSV tables and interview answers.

mod assembly;
mod flatten;
mod interviews;
mod prospects;
mod table;

pub use assembly::{section_text, TextProfile};
pub use flatten::flatten_object;
pub use interviews::{read_interviews, InterviewRecord};
pub use prospects::{parse_prospects, ProspectParseStats, ProspectRecord, UNKNOWN_JOB_CODE};
pub use table::FlatTable;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::info;

use crate::config::{ConfigError, PathsConfig};

pub const JOBS_FILE: &str = "Jobs.json";
pub const PROSPECTS_FILE: &str = "Prospects.json";
pub const APPLICANTS_FILE: &str = "Applicants.json";

pub const JOB_ID_COLUMN: &str = "vaga_code";
pub const CANDIDATE_ID_COLUMN: &str = "candidato_code";

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path} has no '{column}' column")]
    MissingColumn { path: PathBuf, column: String },
}

impl RecordsError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Parse a whole JSON document from disk.
pub fn read_json(path: &Path) -> Result<Value, RecordsError> {
    let raw = fs::read_to_string(path).map_err(|source| RecordsError::io(path, source))?;
    serde_json::from_str(&raw).map_err(|source| RecordsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Flatten a `{code: payload}` document into a table keyed by `id_column`.
/// Non-object payloads land in a `raw` column.
pub fn flatten_keyed(document: &Value, id_column: &str) -> FlatTable {
    let entries = document.as_object().into_iter().flatten();
    FlatTable::from_records(
        id_column,
        entries.map(|(code, payload)| {
            let columns = match payload {
                Value::Object(object) => flatten_object(object),
                other => {
                    let mut wrapped = Map::new();
                    wrapped.insert("raw".to_string(), other.clone());
                    flatten_object(&wrapped)
                }
            };
            (code.clone(), columns)
        }),
    )
}

pub fn load_jobs(path: &Path) -> Result<FlatTable, RecordsError> {
    Ok(flatten_keyed(&read_json(path)?, JOB_ID_COLUMN))
}

pub fn load_applicants(path: &Path) -> Result<FlatTable, RecordsError> {
    Ok(flatten_keyed(&read_json(path)?, CANDIDATE_ID_COLUMN))
}

pub fn load_prospects(path: &Path) -> Result<Vec<ProspectRecord>, RecordsError> {
    let (records, _) = parse_prospects(read_json(path)?);
    Ok(records)
}

pub fn write_prospects(path: &Path, records: &[ProspectRecord]) -> Result<(), RecordsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| RecordsError::io(path, source))?;
    }
    let mut writer = csv::Writer::from_path(path).map_err(|source| RecordsError::csv(path, source))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|source| RecordsError::csv(path, source))?;
    }
    writer.flush().map_err(|source| RecordsError::io(path, source))?;
    Ok(())
}

pub fn read_prospects_csv(path: &Path) -> Result<Vec<ProspectRecord>, RecordsError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| RecordsError::csv(path, source))?;
    reader
        .deserialize::<ProspectRecord>()
        .map(|record| record.map_err(|source| RecordsError::csv(path, source)))
        .collect()
}

/// Locations of the three raw input documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawInputs {
    pub jobs: PathBuf,
    pub prospects: PathBuf,
    pub applicants: PathBuf,
}

impl RawInputs {
    pub fn locate(paths: &PathsConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            jobs: paths.find_raw(JOBS_FILE)?,
            prospects: paths.find_raw(PROSPECTS_FILE)?,
            applicants: paths.find_raw(APPLICANTS_FILE)?,
        })
    }
}

/// Interim CSVs produced by [`ingest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterimTables {
    pub jobs: PathBuf,
    pub prospects: PathBuf,
    pub applicants: PathBuf,
}

impl InterimTables {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            jobs: dir.join("jobs.csv"),
            prospects: dir.join("prospects.csv"),
            applicants: dir.join("applicants.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub jobs: usize,
    pub prospects: usize,
    pub applicants: usize,
    pub tables: InterimTables,
}

/// Normalize the raw documents into the interim CSV tables.
pub fn ingest(inputs: &RawInputs, interim_dir: &Path) -> Result<IngestSummary, RecordsError> {
    let tables = InterimTables::in_dir(interim_dir);

    let jobs = load_jobs(&inputs.jobs)?;
    info!(rows = jobs.len(), columns = jobs.headers().len(), "jobs loaded");
    jobs.write_csv(&tables.jobs)?;

    let prospects = load_prospects(&inputs.prospects)?;
    write_prospects(&tables.prospects, &prospects)?;

    let applicants = load_applicants(&inputs.applicants)?;
    info!(
        rows = applicants.len(),
        columns = applicants.headers().len(),
        "applicants loaded"
    );
    applicants.write_csv(&tables.applicants)?;

    info!(dir = %interim_dir.display(), "interim tables written");
    Ok(IngestSummary {
        jobs: jobs.len(),
        prospects: prospects.len(),
        applicants: applicants.len(),
        tables,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_payloads_are_wrapped_in_raw_column() {
        let table = flatten_keyed(&json!({ "1": "texto solto", "2": { "a": "b" } }), "vaga_code");
        assert_eq!(table.headers(), ["vaga_code", "raw", "a"]);
    }

    #[test]
    fn ingest_writes_three_interim_tables() {
        let dir = tempfile::tempdir().expect("tempdir");
        let raw = dir.path().join("raw");
        std::fs::create_dir_all(&raw).expect("raw dir");
        let inputs = RawInputs {
            jobs: raw.join(JOBS_FILE),
            prospects: raw.join(PROSPECTS_FILE),
            applicants: raw.join(APPLICANTS_FILE),
        };
        std::fs::write(
            &inputs.jobs,
            json!({ "10": { "informacoes_basicas": { "titulo_vaga": "Dev" } } }).to_string(),
        )
        .expect("jobs");
        std::fs::write(
            &inputs.prospects,
            json!({ "10": { "titulo": "Dev", "prospects": [ { "codigo": "7", "situacao_candidado": "Inscrito" } ] } })
                .to_string(),
        )
        .expect("prospects");
        std::fs::write(
            &inputs.applicants,
            json!({ "7": { "infos_basicas": { "nome": "Ana" } } }).to_string(),
        )
        .expect("applicants");

        let summary = ingest(&inputs, &dir.path().join("interim")).expect("ingest");
        assert_eq!((summary.jobs, summary.prospects, summary.applicants), (1, 1, 1));

        let prospects = read_prospects_csv(&summary.tables.prospects).expect("prospects csv");
        assert_eq!(prospects[0].candidato_code, "7");
        assert_eq!(prospects[0].situacao_norm, "inscrito");

        let jobs = FlatTable::read_csv(&summary.tables.jobs).expect("jobs csv");
        assert_eq!(jobs.headers(), ["vaga_code", "informacoes_basicas__titulo_vaga"]);
    }

    #[test]
    fn malformed_json_reports_the_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(JOBS_FILE);
        std::fs::write(&path, "{ not json").expect("write");
        let error = load_jobs(&path).expect_err("invalid");
        assert!(matches!(error, RecordsError::Json { .. }));
        assert!(error.to_string().contains(JOBS_FILE));
    }
}
