use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use super::flatten::scalar_text;
use crate::text::normalize_status;

/// Placeholder job code used when `Prospects.json` is a bare list.
pub const UNKNOWN_JOB_CODE: &str = "(sem_vaga_code)";

const CANDIDATE_KEYS: &[&str] = &["codigo", "id_candidato", "id", "codigo_candidato"];
const NAME_KEYS: &[&str] = &["nome", "name"];
const COMMENT_KEYS: &[&str] = &["comentario", "comment", "observacao"];
const STATUS_KEYS: &[&str] = &[
    "situacao",
    "situacao_candidato",
    "situacao_candidado",
    "status",
];

/// One application of a candidate to a job. Empty strings stand for absent values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProspectRecord {
    pub vaga_code: String,
    #[serde(default)]
    pub titulo_vaga: String,
    #[serde(default)]
    pub modalidade: String,
    #[serde(default)]
    pub candidato_code: String,
    #[serde(default)]
    pub nome: String,
    #[serde(default)]
    pub comentario: String,
    #[serde(default)]
    pub situacao: String,
    #[serde(default)]
    pub situacao_norm: String,
    #[serde(default)]
    pub recrutador: String,
    #[serde(default)]
    pub data_candidatura: String,
    #[serde(default)]
    pub ultima_atualizacao: String,
}

impl ProspectRecord {
    /// Both codes are present.
    pub fn has_pair(&self) -> bool {
        !self.vaga_code.trim().is_empty() && !self.candidato_code.trim().is_empty()
    }

    fn placeholder(job: &JobHeader, comment: String) -> Self {
        Self {
            vaga_code: job.code.clone(),
            titulo_vaga: job.title.clone(),
            modalidade: job.modality.clone(),
            comentario: comment,
            ..Self::default()
        }
    }

    fn from_item(job: &JobHeader, item: &Map<String, Value>) -> Self {
        let situacao = first_text(item, STATUS_KEYS);
        Self {
            vaga_code: job.code.clone(),
            titulo_vaga: job.title.clone(),
            modalidade: job.modality.clone(),
            candidato_code: first_text(item, CANDIDATE_KEYS),
            nome: first_text(item, NAME_KEYS),
            comentario: first_text(item, COMMENT_KEYS),
            situacao_norm: normalize_status(&situacao),
            situacao,
            recrutador: first_text(item, &["recrutador"]),
            data_candidatura: first_text(item, &["data_candidatura"]),
            ultima_atualizacao: first_text(item, &["ultima_atualizacao"]),
        }
    }
}

struct JobHeader {
    code: String,
    title: String,
    modality: String,
}

/// Counters describing how tolerant parsing had to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProspectParseStats {
    pub string_items: usize,
    pub parsed_string_items: usize,
}

/// Turn the `Prospects.json` document into one record per listed prospect.
///
/// Accepts the keyed form `{vaga_code: {titulo, modalidade, prospects: [...]}}`
/// and a bare top-level list. Items that are strings are parsed as JSON when
/// possible and otherwise kept as a comment; items that are neither objects nor
/// strings become placeholder rows carrying their JSON text. Jobs without
/// prospects produce no rows.
pub fn parse_prospects(document: Value) -> (Vec<ProspectRecord>, ProspectParseStats) {
    let jobs = match document {
        Value::Array(items) => {
            let mut payload = Map::new();
            payload.insert("prospects".to_string(), Value::Array(items));
            vec![(UNKNOWN_JOB_CODE.to_string(), Value::Object(payload))]
        }
        Value::Object(map) => map.into_iter().collect(),
        _ => Vec::new(),
    };

    let mut records = Vec::new();
    let mut stats = ProspectParseStats::default();

    for (code, payload) in jobs {
        let (header, items) = job_items(code, payload);
        for item in items {
            let item = match item {
                Value::String(text) => {
                    stats.string_items += 1;
                    match serde_json::from_str::<Value>(&text) {
                        Ok(Value::Object(parsed)) => {
                            stats.parsed_string_items += 1;
                            Value::Object(parsed)
                        }
                        _ => {
                            records.push(ProspectRecord::placeholder(&header, text));
                            continue;
                        }
                    }
                }
                other => other,
            };

            match item {
                Value::Object(fields) => records.push(ProspectRecord::from_item(&header, &fields)),
                other => records.push(ProspectRecord::placeholder(&header, other.to_string())),
            }
        }
    }

    info!(
        rows = records.len(),
        string_items = stats.string_items,
        parsed_string_items = stats.parsed_string_items,
        "prospects parsed"
    );
    (records, stats)
}

fn job_items(code: String, payload: Value) -> (JobHeader, Vec<Value>) {
    let mut header = JobHeader {
        code,
        title: String::new(),
        modality: String::new(),
    };

    let items = match payload {
        Value::Object(map) => {
            header.title = map.get("titulo").map(scalar_text).unwrap_or_default();
            header.modality = map.get("modalidade").map(scalar_text).unwrap_or_default();
            match map.get("prospects") {
                Some(Value::Array(items)) => items.clone(),
                Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
                    Ok(Value::Array(items)) => items,
                    Ok(Value::Null) => Vec::new(),
                    Ok(other) => vec![other],
                    Err(_) => vec![Value::String(text.clone())],
                },
                _ => map
                    .values()
                    .find_map(|value| value.as_array().cloned())
                    .unwrap_or_default(),
            }
        }
        Value::Array(items) => items,
        other => vec![other],
    };

    (header, items)
}

/// First key among `keys` holding a non-empty value, as text.
fn first_text(item: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .filter_map(|key| item.get(*key))
        .map(scalar_text)
        .find(|value| !value.trim().is_empty())
        .unwrap_or_default()
}
