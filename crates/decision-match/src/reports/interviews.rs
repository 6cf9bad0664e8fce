//! Term frequencies, rubric scores and answer lengths of interview answers.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::{write_csv_rows, ReportError};
use crate::records::InterviewRecord;
use crate::scoring::{score_text, RubricScores};
use crate::text::{basic_clean, content_terms};

pub const CLEAN_FILE: &str = "entrevistas_clean.csv";
pub const TOP_TERMS_FILE: &str = "top_terms.csv";
pub const TOP_TERMS_BY_VAGA_FILE: &str = "top_terms_by_vaga.csv";
pub const TOP_TERMS_BY_CANDIDATO_FILE: &str = "top_terms_by_candidato.csv";
pub const SCORES_BY_RESPONSE_FILE: &str = "scores_by_response.csv";
pub const SCORES_BY_CANDIDATO_FILE: &str = "scores_by_candidato.csv";
pub const SCORES_BY_VAGA_FILE: &str = "scores_by_vaga.csv";
pub const AVG_WORDS_BY_VAGA_FILE: &str = "metrics_avg_words_by_vaga.csv";
pub const AVG_WORDS_BY_CANDIDATO_FILE: &str = "metrics_avg_words_by_candidato.csv";

const TOP_TERMS: usize = 15;
const TOP_TERMS_PER_GROUP: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanInterview {
    pub id: String,
    pub candidato: String,
    pub vaga: String,
    pub pergunta: String,
    pub resposta: String,
    pub data: String,
    pub resposta_clean: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseScores {
    pub id: String,
    pub candidato: String,
    pub vaga: String,
    pub score_tecnico: f64,
    pub score_comunicacao: f64,
    pub score_comportamental: f64,
    pub resposta_clean: String,
}

/// Which interview column a per-group table is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupBy {
    Vaga,
    Candidato,
}

impl GroupBy {
    pub fn column(self) -> &'static str {
        match self {
            GroupBy::Vaga => "vaga",
            GroupBy::Candidato => "candidato",
        }
    }

    fn key(self, interview: &CleanInterview) -> &str {
        match self {
            GroupBy::Vaga => &interview.vaga,
            GroupBy::Candidato => &interview.candidato,
        }
    }
}

/// Rows of a per-group table, groups in key order.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouped<T> {
    pub by: GroupBy,
    pub rows: Vec<(String, T)>,
}

/// Most common terms; equal counts keep first-seen order.
pub fn top_terms<'a>(texts: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<TermCount> {
    let mut order: Vec<TermCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for text in texts {
        for term in content_terms(text) {
            match positions.get(&term) {
                Some(&position) => order[position].count += 1,
                None => {
                    positions.insert(term.clone(), order.len());
                    order.push(TermCount { term, count: 1 });
                }
            }
        }
    }
    order.sort_by(|a, b| b.count.cmp(&a.count));
    order.truncate(limit);
    order
}

fn group<'a>(interviews: &'a [CleanInterview], by: GroupBy) -> BTreeMap<&'a str, Vec<&'a CleanInterview>> {
    let mut groups: BTreeMap<&str, Vec<&CleanInterview>> = BTreeMap::new();
    for interview in interviews {
        groups.entry(by.key(interview)).or_default().push(interview);
    }
    groups
}

fn mean_of(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Everything derived from one interview file.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewAnalytics {
    pub clean: Vec<CleanInterview>,
    pub top_terms: Vec<TermCount>,
    pub terms_by_vaga: Grouped<TermCount>,
    pub terms_by_candidato: Grouped<TermCount>,
    pub scores_by_response: Vec<ResponseScores>,
    pub scores_by_candidato: Grouped<RubricScores>,
    pub scores_by_vaga: Grouped<RubricScores>,
    pub words_by_vaga: Grouped<f64>,
    pub words_by_candidato: Grouped<f64>,
}

impl InterviewAnalytics {
    pub fn from_records(records: Vec<InterviewRecord>) -> Self {
        let clean: Vec<CleanInterview> = records
            .into_iter()
            .map(|record| CleanInterview {
                resposta_clean: basic_clean(record.resposta.as_deref()),
                resposta: record.resposta.unwrap_or_default(),
                id: record.id,
                candidato: record.candidato,
                vaga: record.vaga,
                pergunta: record.pergunta,
                data: record.data,
            })
            .collect();

        let top = top_terms(clean.iter().map(|c| c.resposta_clean.as_str()), TOP_TERMS);
        let scores_by_response: Vec<ResponseScores> = clean
            .iter()
            .map(|interview| {
                let scores = score_text(&interview.resposta_clean);
                ResponseScores {
                    id: interview.id.clone(),
                    candidato: interview.candidato.clone(),
                    vaga: interview.vaga.clone(),
                    score_tecnico: scores.score_tecnico,
                    score_comunicacao: scores.score_comunicacao,
                    score_comportamental: scores.score_comportamental,
                    resposta_clean: interview.resposta_clean.clone(),
                }
            })
            .collect();

        Self {
            terms_by_vaga: terms_by(&clean, GroupBy::Vaga),
            terms_by_candidato: terms_by(&clean, GroupBy::Candidato),
            scores_by_candidato: scores_by(&clean, GroupBy::Candidato),
            scores_by_vaga: scores_by(&clean, GroupBy::Vaga),
            words_by_vaga: average_words_by(&clean, GroupBy::Vaga),
            words_by_candidato: average_words_by(&clean, GroupBy::Candidato),
            top_terms: top,
            scores_by_response,
            clean,
        }
    }

    /// Write every table into `dir`, returning the paths in write order.
    pub fn write_tables(&self, dir: &Path) -> Result<Vec<PathBuf>, ReportError> {
        let mut written = Vec::new();
        let mut target = |name: &str| {
            let path = dir.join(name);
            written.push(path.clone());
            path
        };

        write_csv_rows(&target(CLEAN_FILE), &self.clean)?;
        write_csv_rows(&target(TOP_TERMS_FILE), &self.top_terms)?;
        write_grouped(&target(TOP_TERMS_BY_VAGA_FILE), &self.terms_by_vaga, &["term", "count"], |t| {
            vec![t.term.clone(), t.count.to_string()]
        })?;
        write_grouped(
            &target(TOP_TERMS_BY_CANDIDATO_FILE),
            &self.terms_by_candidato,
            &["term", "count"],
            |t| vec![t.term.clone(), t.count.to_string()],
        )?;
        write_csv_rows(&target(SCORES_BY_RESPONSE_FILE), &self.scores_by_response)?;
        let score_columns = ["score_tecnico", "score_comunicacao", "score_comportamental"];
        let score_cells = |s: &RubricScores| {
            vec![
                s.score_tecnico.to_string(),
                s.score_comunicacao.to_string(),
                s.score_comportamental.to_string(),
            ]
        };
        write_grouped(&target(SCORES_BY_CANDIDATO_FILE), &self.scores_by_candidato, &score_columns, score_cells)?;
        write_grouped(&target(SCORES_BY_VAGA_FILE), &self.scores_by_vaga, &score_columns, score_cells)?;
        write_grouped(&target(AVG_WORDS_BY_VAGA_FILE), &self.words_by_vaga, &["avg_words"], |v| {
            vec![v.to_string()]
        })?;
        write_grouped(
            &target(AVG_WORDS_BY_CANDIDATO_FILE),
            &self.words_by_candidato,
            &["avg_words"],
            |v| vec![v.to_string()],
        )?;
        Ok(written)
    }
}

fn terms_by(interviews: &[CleanInterview], by: GroupBy) -> Grouped<TermCount> {
    let rows = group(interviews, by)
        .into_iter()
        .flat_map(|(key, members)| {
            top_terms(members.iter().map(|m| m.resposta_clean.as_str()), TOP_TERMS_PER_GROUP)
                .into_iter()
                .map(move |term| (key.to_string(), term))
        })
        .collect();
    Grouped { by, rows }
}

/// Mean rubric scores per group, sorted descending by technical, then
/// communication, then behavioural score.
fn scores_by(interviews: &[CleanInterview], by: GroupBy) -> Grouped<RubricScores> {
    let mut rows: Vec<(String, RubricScores)> = group(interviews, by)
        .into_iter()
        .map(|(key, members)| {
            let scores: Vec<RubricScores> =
                members.iter().map(|m| score_text(&m.resposta_clean)).collect();
            let mean = RubricScores {
                score_tecnico: mean_of(scores.iter().map(|s| s.score_tecnico)),
                score_comunicacao: mean_of(scores.iter().map(|s| s.score_comunicacao)),
                score_comportamental: mean_of(scores.iter().map(|s| s.score_comportamental)),
            };
            (key.to_string(), mean)
        })
        .collect();
    rows.sort_by(|(_, a), (_, b)| {
        b.score_tecnico
            .total_cmp(&a.score_tecnico)
            .then_with(|| b.score_comunicacao.total_cmp(&a.score_comunicacao))
            .then_with(|| b.score_comportamental.total_cmp(&a.score_comportamental))
    });
    Grouped { by, rows }
}

/// Mean word count of the cleaned answers per group, longest first.
fn average_words_by(interviews: &[CleanInterview], by: GroupBy) -> Grouped<f64> {
    let mut rows: Vec<(String, f64)> = group(interviews, by)
        .into_iter()
        .map(|(key, members)| {
            let words = members
                .iter()
                .map(|m| m.resposta_clean.split_whitespace().count() as f64);
            (key.to_string(), mean_of(words))
        })
        .collect();
    rows.sort_by(|(_, a), (_, b)| b.total_cmp(a));
    Grouped { by, rows }
}

fn write_grouped<T>(
    path: &Path,
    grouped: &Grouped<T>,
    columns: &[&str],
    cells: impl Fn(&T) -> Vec<String>,
) -> Result<(), ReportError> {
    let mut header = vec![grouped.by.column().to_string()];
    header.extend(columns.iter().map(|c| c.to_string()));
    let rows = grouped.rows.iter().map(|(key, value)| {
        let mut row = vec![key.clone()];
        row.extend(cells(value));
        row
    });
    super::write_csv_records(path, &header, rows)
}
