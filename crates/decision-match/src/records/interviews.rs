use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use super::RecordsError;

/// One interview answer from `entrevistas.csv`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub candidato: String,
    #[serde(default)]
    pub vaga: String,
    #[serde(default)]
    pub pergunta: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub resposta: Option<String>,
    #[serde(default)]
    pub data: String,
}

pub fn read_interviews(path: &Path) -> Result<Vec<InterviewRecord>, RecordsError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|source| RecordsError::csv(path, source))?;

    let headers = reader
        .headers()
        .map_err(|source| RecordsError::csv(path, source))?
        .clone();
    if !headers.iter().any(|header| header == "resposta") {
        return Err(RecordsError::MissingColumn {
            path: path.to_path_buf(),
            column: "resposta".to_string(),
        });
    }

    reader
        .deserialize::<InterviewRecord>()
        .map(|record| record.map_err(|source| RecordsError::csv(path, source)))
        .collect()
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|text| !text.trim().is_empty()))
}
