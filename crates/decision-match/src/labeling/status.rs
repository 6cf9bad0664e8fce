//! Labels read directly from application statuses and recruiter comments.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::records::ProspectRecord;
use crate::text::normalize_status;

/// Statuses that are positive on their own.
const POSITIVE_STATUSES: &[&str] = &[
    "contratado",
    "contratada",
    "aprovado",
    "aprovada",
    "admitido",
    "admitida",
    "hired",
    "approved",
    "aprovado cliente",
    "aprovada cliente",
    "aprovado pelo cliente",
    "aprovada pelo cliente",
    "proposta aceita",
    "oferta aceita",
    "alocado",
    "alocada",
    "colocado",
    "colocada",
    "selecionado",
    "selecionada",
];

static POSITIVE_ROOTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bcontrat|\baprov|\badmit|\bhir|\bproposta aceita|\boferta aceita|\baloc|\bcoloc|\bselecion")
        .expect("valid positive roots regex")
});

const POSITIVE_KEYS: &[&str] = &[
    "aprovado",
    "aprovacao",
    "aprovada",
    "aprovado cliente",
    "aprovado entrevista",
    "contratado",
    "oferta aceita",
    "finalista",
    "hired",
];

const NEGATIVE_KEYS: &[&str] = &[
    "reprovado",
    "reprova",
    "descartado",
    "nao avancou",
    "nao selecionado",
    "rejeitado",
    "desistiu",
    "sem perfil",
    "bloqueado",
    "fail",
    "sem interesse",
];

/// Outcome implied by free text: `Some(1)` for a positive key, `Some(0)` for a
/// negative one, `None` when nothing matches. Positive keys are checked first,
/// so "nao aprovado" still reads as positive.
pub fn label_from_text(text: &str) -> Option<u8> {
    let text = normalize_status(text);
    if POSITIVE_KEYS.iter().any(|key| text.contains(key)) {
        return Some(1);
    }
    if NEGATIVE_KEYS.iter().any(|key| text.contains(key)) {
        return Some(0);
    }
    None
}

/// Whether a normalized status, or failing that the normalized comment,
/// describes a positive outcome.
pub fn is_positive(status: &str, comment: &str) -> bool {
    if POSITIVE_STATUSES.contains(&status) {
        return true;
    }
    let mentions_positive = |text: &str| !text.is_empty() && POSITIVE_ROOTS.is_match(text);
    mentions_positive(status) || mentions_positive(comment)
}

/// One (job, candidate) pair labeled from its statuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusLabel {
    pub vaga_code: String,
    pub candidato_code: String,
    pub y: u8,
    pub nome: String,
    pub situacoes: String,
    pub comentarios: String,
}

#[derive(Default)]
struct PairAccumulator {
    y: u8,
    nome: Option<String>,
    statuses: BTreeSet<String>,
    comments: BTreeSet<String>,
}

/// Label every pair positive when any of its rows is positive. Distinct
/// statuses and comments are kept for auditing. Sorted positives first, then
/// by job and candidate code.
pub fn label_by_status(prospects: &[ProspectRecord]) -> Vec<StatusLabel> {
    let mut pairs: HashMap<(String, String), PairAccumulator> = HashMap::new();

    for prospect in prospects.iter().filter(|prospect| prospect.has_pair()) {
        let status = normalize_status(&prospect.situacao);
        let comment = normalize_status(&prospect.comentario);
        let entry = pairs
            .entry((prospect.vaga_code.clone(), prospect.candidato_code.clone()))
            .or_default();

        entry.y = entry.y.max(u8::from(is_positive(&status, &comment)));
        if entry.nome.is_none() && !prospect.nome.is_empty() {
            entry.nome = Some(prospect.nome.clone());
        }
        if !status.is_empty() {
            entry.statuses.insert(status);
        }
        if !comment.is_empty() {
            entry.comments.insert(comment);
        }
    }

    let mut labels: Vec<StatusLabel> = pairs
        .into_iter()
        .map(|((vaga_code, candidato_code), pair)| StatusLabel {
            vaga_code,
            candidato_code,
            y: pair.y,
            nome: pair.nome.unwrap_or_default(),
            situacoes: pair.statuses.into_iter().collect::<Vec<_>>().join(", "),
            comentarios: pair.comments.into_iter().collect::<Vec<_>>().join("; "),
        })
        .collect();

    labels.sort_by(|a, b| {
        b.y.cmp(&a.y)
            .then_with(|| a.vaga_code.cmp(&b.vaga_code))
            .then_with(|| a.candidato_code.cmp(&b.candidato_code))
    });
    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prospect(vaga: &str, cand: &str, situacao: &str, comentario: &str) -> ProspectRecord {
        ProspectRecord {
            vaga_code: vaga.to_string(),
            candidato_code: cand.to_string(),
            nome: format!("cand {cand}"),
            situacao: situacao.to_string(),
            comentario: comentario.to_string(),
            ..ProspectRecord::default()
        }
    }

    #[test]
    fn label_from_text_reads_keywords() {
        assert_eq!(label_from_text("Contratado pela Decision"), Some(1));
        assert_eq!(label_from_text("Aprovação do cliente"), Some(1));
        assert_eq!(label_from_text("Desistiu da vaga"), Some(0));
        assert_eq!(label_from_text("Reprovado na entrevista"), Some(0));
        assert_eq!(label_from_text("Encaminhado ao Requisitante"), None);
        assert_eq!(label_from_text(""), None);
    }

    #[test]
    fn positive_from_status_set_roots_or_comment() {
        assert!(is_positive("aprovado pelo cliente", ""));
        assert!(is_positive("em processo de contratacao", ""));
        assert!(is_positive("inscrito", "candidato selecionado na final"));
        assert!(!is_positive("desistiu", "sem retorno"));
        assert!(!is_positive("prospect", "aguardando retorno"));
    }

    #[test]
    fn approval_root_wins_over_a_leading_negation() {
        assert_eq!(label_from_text("Não Aprovado pelo RH"), Some(1));
        assert_eq!(label_from_text("nao selecionado"), Some(0));
        assert!(is_positive("nao aprovado pelo rh", ""));
        assert!(is_positive("prospect", "nao contratado ainda"));
    }

    #[test]
    fn pairs_take_the_max_label_and_join_statuses() {
        let labels = label_by_status(&[
            prospect("2", "b", "Prospect", ""),
            prospect("1", "a", "Inscrito", "ligar"),
            prospect("1", "a", "Contratado pela Decision", "ok"),
            prospect("", "z", "Contratado", ""),
        ]);

        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].candidato_code, "a");
        assert_eq!(labels[0].y, 1);
        assert_eq!(labels[0].situacoes, "contratado pela decision, inscrito");
        assert_eq!(labels[0].comentarios, "ligar; ok");
        assert_eq!(labels[1].y, 0);
    }
}
