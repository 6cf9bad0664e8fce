//! Assembling one free-text blob per job or candidate.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use super::flatten::scalar_text;
use super::table::FlatTable;
use crate::text::normalize_text;

/// Which columns of a flattened table describe the entity, and in what order.
pub struct TextProfile {
    preferred: &'static [&'static str],
    priorities: Vec<Regex>,
}

static JOB_PROFILE: LazyLock<TextProfile> = LazyLock::new(|| {
    TextProfile::new(
        &[
            "titulo",
            "titulo_vaga",
            "descricao",
            "descricao_vaga",
            "perfil",
            "perfil_da_vaga",
            "competencias",
            "competencias_tecnicas",
            "atividades",
            "responsabilidades",
            "requisitos",
            "beneficios",
        ],
        &[
            "titulo", "perfil", "competenc", "atividades", "requisit", "descri", "benef",
        ],
    )
});

static CANDIDATE_PROFILE: LazyLock<TextProfile> = LazyLock::new(|| {
    TextProfile::new(
        &[
            "nome",
            "area_atuacao",
            "conhecimentos_tecnicos",
            "skills",
            "competencias",
            "experiencias",
            "experiencia",
            "historico_profissional",
            "cv",
            "resumo",
            "objetivo",
        ],
        &[
            "conhec|skill|competenc",
            "experien",
            "cv|curriculo",
            "area",
            "resumo|objetivo",
        ],
    )
});

impl TextProfile {
    fn new(preferred: &'static [&'static str], priorities: &[&str]) -> Self {
        let priorities = priorities
            .iter()
            .filter_map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .ok()
            })
            .collect();
        Self {
            preferred,
            priorities,
        }
    }

    pub fn job() -> &'static Self {
        &JOB_PROFILE
    }

    pub fn candidate() -> &'static Self {
        &CANDIDATE_PROFILE
    }

    fn priority(&self, column: &str) -> usize {
        self.priorities
            .iter()
            .position(|pattern| pattern.is_match(column))
            .unwrap_or(self.priorities.len() + 1)
    }

    /// Preferred textual columns present in `table` (all textual columns when
    /// none is), stably ordered by the first matching priority pattern.
    pub fn ranked_columns(&self, table: &FlatTable) -> Vec<usize> {
        let textual = table.textual_columns();
        let mut chosen: Vec<usize> = self
            .preferred
            .iter()
            .filter_map(|name| table.column_index(name))
            .filter(|index| textual.contains(index))
            .collect();
        if chosen.is_empty() {
            chosen = textual;
        }
        chosen.sort_by_key(|&index| self.priority(&table.headers()[index]));
        chosen
    }

    /// Text per distinct id, built from the ranked columns and falling back to
    /// every textual column for rows where those are all blank. The first row
    /// of a repeated id wins.
    pub fn texts_by_id(&self, table: &FlatTable, id_column: &str) -> HashMap<String, String> {
        let Some(id_index) = table.column_index(id_column) else {
            return HashMap::new();
        };
        let primary = self.ranked_columns(table);
        let fallback = table.textual_columns();

        let mut texts = HashMap::new();
        for row in table.rows() {
            let id = row[id_index].trim();
            if id.is_empty() || texts.contains_key(id) {
                continue;
            }
            let mut text = join_cells(row, &primary);
            if text.is_empty() {
                text = join_cells(row, &fallback);
            }
            texts.insert(id.to_string(), text);
        }
        texts
    }
}

fn join_cells(row: &[String], columns: &[usize]) -> String {
    columns
        .iter()
        .map(|&index| normalize_text(&row[index]))
        .filter(|cell| !cell.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the listed sub-objects of a raw record, after the optional top-level
/// `leading` keys (CV blocks, for instance). Sub-objects contribute their scalar
/// values, scalar lists and one further level of nesting.
pub fn section_text(record: &Map<String, Value>, sections: &[&str], leading: &[&str]) -> String {
    let mut parts = Vec::new();

    for key in leading {
        match record.get(*key) {
            Some(Value::Array(items)) => push_part(&mut parts, list_text(items)),
            Some(value) => push_part(&mut parts, scalar_text(value)),
            None => {}
        }
    }

    for key in sections {
        match record.get(*key) {
            Some(Value::Object(section)) => {
                for value in section.values() {
                    match value {
                        Value::Object(nested) => {
                            for inner in nested.values() {
                                push_value(&mut parts, inner);
                            }
                        }
                        other => push_value(&mut parts, other),
                    }
                }
            }
            Some(Value::Array(items)) => push_part(&mut parts, list_text(items)),
            _ => {}
        }
    }

    parts.join(" ").trim().to_string()
}

fn push_value(parts: &mut Vec<String>, value: &Value) {
    match value {
        Value::Array(items) => push_part(parts, list_text(items)),
        Value::String(_) | Value::Number(_) => push_part(parts, scalar_text(value)),
        _ => {}
    }
}

fn push_part(parts: &mut Vec<String>, part: String) {
    if !part.trim().is_empty() {
        parts.push(part);
    }
}

fn list_text(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::Object(_) | Value::Array(_) => item.to_string(),
            scalar => scalar_text(scalar),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jobs_table() -> FlatTable {
        FlatTable::from_records(
            "vaga_code",
            vec![
                (
                    "1".to_string(),
                    vec![
                        ("beneficios".to_string(), "VR".to_string()),
                        ("titulo".to_string(), "Dev  RUST".to_string()),
                        ("local".to_string(), "SP".to_string()),
                    ],
                ),
                (
                    "2".to_string(),
                    vec![
                        ("beneficios".to_string(), String::new()),
                        ("titulo".to_string(), String::new()),
                        ("local".to_string(), "Recife".to_string()),
                    ],
                ),
                (
                    "1".to_string(),
                    vec![("titulo".to_string(), "duplicada".to_string())],
                ),
            ],
        )
    }

    #[test]
    fn preferred_columns_are_ranked_by_priority() {
        let table = jobs_table();
        let ranked: Vec<_> = TextProfile::job()
            .ranked_columns(&table)
            .into_iter()
            .map(|index| table.headers()[index].clone())
            .collect();
        assert_eq!(ranked, vec!["titulo", "beneficios"]);
    }

    #[test]
    fn blank_rows_fall_back_to_every_textual_column() {
        let texts = TextProfile::job().texts_by_id(&jobs_table(), "vaga_code");
        assert_eq!(texts["1"], "dev rust vr");
        assert_eq!(texts["2"], "recife");
    }

    #[test]
    fn without_preferred_columns_all_textual_columns_are_used() {
        let table = FlatTable::from_records(
            "candidato_code",
            vec![(
                "9".to_string(),
                vec![
                    ("infos__local".to_string(), "Recife".to_string()),
                    ("infos__conhecimentos".to_string(), "SQL".to_string()),
                ],
            )],
        );
        let texts = TextProfile::candidate().texts_by_id(&table, "candidato_code");
        assert_eq!(texts["9"], "sql recife");
    }

    #[test]
    fn section_text_reads_leading_keys_then_sections() {
        let record = json!({
            "cv_pt": "Experiência em Rust",
            "infos_basicas": { "nome": "Ana", "idade": 30, "ativo": true },
            "formacao_e_idiomas": { "idiomas": { "ingles": "fluente" }, "cursos": ["aws", "gcp"] },
            "ignorado": { "x": "y" }
        });
        let Value::Object(record) = record else { unreachable!() };
        let text = section_text(
            &record,
            &["infos_basicas", "formacao_e_idiomas"],
            &["cv_pt", "cv_en"],
        );
        assert_eq!(text, "Experiência em Rust 30 Ana aws gcp fluente");
    }
}
