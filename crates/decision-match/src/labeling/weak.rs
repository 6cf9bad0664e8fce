//! Score-first weak labels: the similarity rank decides, the status only
//! nudges the per-candidate threshold.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::WeakLabelParams;
use crate::stats::quantile;
use crate::text::normalize_status;

/// A prospect with its similarity score, before labeling.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredProspect {
    pub vaga_code: String,
    pub candidato_code: String,
    pub nome: String,
    pub situacao: String,
    pub situacao_norm: String,
    pub score_tecnico: f64,
}

/// Weakly labeled (job, candidate) pair; `y` is inferred, not ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPair {
    pub vaga_code: String,
    pub candidato_code: String,
    pub nome: String,
    pub situacao: String,
    pub situacao_norm: String,
    pub score_tecnico: f64,
    pub y: u8,
}

impl LabeledPair {
    fn new(prospect: ScoredProspect, y: bool) -> Self {
        Self {
            vaga_code: prospect.vaga_code,
            candidato_code: prospect.candidato_code,
            nome: prospect.nome,
            situacao: prospect.situacao,
            situacao_norm: prospect.situacao_norm,
            score_tecnico: prospect.score_tecnico,
            y: u8::from(y),
        }
    }
}

/// Label the candidates of one job. The result is ordered by score, highest first.
pub fn label_group(mut group: Vec<ScoredProspect>, params: &WeakLabelParams) -> Vec<LabeledPair> {
    if group.is_empty() {
        return Vec::new();
    }
    group.sort_by(|a, b| {
        b.score_tecnico
            .partial_cmp(&a.score_tecnico)
            .unwrap_or(Ordering::Equal)
    });

    let statuses: Vec<String> = group
        .iter()
        .map(|prospect| normalize_status(&prospect.situacao_norm))
        .collect();
    let hard_positive = |i: usize| params.hard_positive_statuses.contains(&statuses[i]);
    let hard_negative = |i: usize| params.hard_negative_statuses.contains(&statuses[i]);
    let apply_hard_rules = |labels: &mut [bool]| {
        for (i, label) in labels.iter_mut().enumerate() {
            if hard_positive(i) {
                *label = true;
            }
            if hard_negative(i) {
                *label = false;
            }
        }
    };

    let n = group.len();
    let scores: Vec<f64> = group.iter().map(|prospect| prospect.score_tecnico).collect();
    let top_score = scores[0];
    let mut labels = vec![false; n];

    if top_score.is_nan() || top_score <= 0.0 {
        apply_hard_rules(&mut labels);
        return zip_labels(group, labels);
    }

    let base = params
        .min_score
        .max(quantile(&scores, params.quantile).unwrap_or(0.0));
    let k = params.top_k.min(n).max(1);

    for (i, label) in labels.iter_mut().enumerate() {
        let mut threshold = base;
        if params.boost_statuses.contains(&statuses[i]) {
            threshold = base * (1.0 - params.status_adjustment);
        }
        if params.penalty_statuses.contains(&statuses[i]) {
            threshold = base * (1.0 + params.status_adjustment);
        }
        *label = i < k && scores[i] >= threshold;
    }
    apply_hard_rules(&mut labels);

    if params.cap_all_positive && n > 1 && labels.iter().all(|label| *label) {
        for (i, label) in labels.iter_mut().enumerate() {
            *label = i < k && !hard_negative(i);
        }
    }

    if params.force_top_one && !labels.iter().any(|label| *label) && top_score > base && !hard_negative(0) {
        labels[0] = true;
    }

    zip_labels(group, labels)
}

fn zip_labels(group: Vec<ScoredProspect>, labels: Vec<bool>) -> Vec<LabeledPair> {
    group
        .into_iter()
        .zip(labels)
        .map(|(prospect, y)| LabeledPair::new(prospect, y))
        .collect()
}

/// Label every job group, keeping groups in first-appearance order.
pub fn label_pairs(prospects: Vec<ScoredProspect>, params: &WeakLabelParams) -> Vec<LabeledPair> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: std::collections::HashMap<String, Vec<ScoredProspect>> =
        std::collections::HashMap::new();
    for prospect in prospects {
        let group = groups.entry(prospect.vaga_code.clone()).or_insert_with(|| {
            order.push(prospect.vaga_code.clone());
            Vec::new()
        });
        group.push(prospect);
    }

    order
        .into_iter()
        .filter_map(|code| groups.remove(&code))
        .flat_map(|group| label_group(group, params))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(code: &str, score: f64, status: &str) -> ScoredProspect {
        ScoredProspect {
            vaga_code: "v1".to_string(),
            candidato_code: code.to_string(),
            nome: String::new(),
            situacao: status.to_string(),
            situacao_norm: status.to_string(),
            score_tecnico: score,
        }
    }

    fn positives(labels: &[LabeledPair]) -> Vec<&str> {
        labels
            .iter()
            .filter(|pair| pair.y == 1)
            .map(|pair| pair.candidato_code.as_str())
            .collect()
    }

    #[test]
    fn top_candidate_above_quantile_is_positive() {
        let labels = label_group(
            vec![scored("b", 0.1, ""), scored("a", 0.9, ""), scored("c", 0.0, "")],
            &WeakLabelParams::default(),
        );
        assert_eq!(labels[0].candidato_code, "a");
        assert_eq!(positives(&labels), vec!["a"]);
    }

    #[test]
    fn zero_signal_group_is_all_negative() {
        let labels = label_group(
            vec![scored("a", 0.0, ""), scored("b", 0.0, "")],
            &WeakLabelParams::default(),
        );
        assert!(positives(&labels).is_empty());
    }

    #[test]
    fn zero_signal_still_honours_hard_positive_statuses() {
        let mut params = WeakLabelParams::default();
        params.hard_positive_statuses.insert("contratado".to_string());
        let labels = label_group(vec![scored("a", 0.0, "Contratado")], &params);
        assert_eq!(positives(&labels), vec!["a"]);
    }

    #[test]
    fn boost_status_lowers_threshold() {
        // base = max(0.02, q85 of [0.5, 0.52]) = 0.517; 0.5 clears only 0.9 * base.
        let params = WeakLabelParams::default();
        let without = label_group(vec![scored("a", 0.52, ""), scored("b", 0.5, "")], &params);
        assert_eq!(positives(&without), vec!["a"]);

        let with = label_group(
            vec![scored("a", 0.52, ""), scored("b", 0.5, "Entrevista Técnica")],
            &params,
        );
        assert_eq!(positives(&with), vec!["a", "b"]);
    }

    #[test]
    fn penalty_status_raises_threshold_and_force_top_one_rescues() {
        let params = WeakLabelParams::default();
        let labels = label_group(
            vec![scored("a", 0.5, "Desistiu"), scored("b", 0.1, "")],
            &params,
        );
        // threshold for a: 1.1 * base(0.44) = 0.484 -> still positive
        assert_eq!(positives(&labels), vec!["a"]);

        let labels = label_group(vec![scored("a", 0.5, "Desistiu"), scored("b", 0.49, "")], &params);
        // base = 0.4985: a needs 0.548 and b falls short, so force_top_one promotes a
        assert_eq!(positives(&labels), vec!["a"]);

        let mut strict = params.clone();
        strict.force_top_one = false;
        let labels = label_group(vec![scored("a", 0.5, "Desistiu"), scored("b", 0.49, "")], &strict);
        assert!(positives(&labels).is_empty());
    }

    #[test]
    fn never_more_than_top_k_positives() {
        let mut params = WeakLabelParams::default();
        params.top_k = 2;
        params.quantile = 0.0;
        let group: Vec<_> = (0..6)
            .map(|i| scored(&format!("c{i}"), 0.5 + i as f64 * 0.01, "inscrito"))
            .collect();
        let labels = label_group(group, &params);
        assert_eq!(positives(&labels).len(), 2);
    }

    #[test]
    fn all_positive_group_is_capped_to_top_k() {
        let mut params = WeakLabelParams::default();
        params.top_k = 1;
        params
            .hard_positive_statuses
            .insert("aprovado".to_string());
        let labels = label_group(
            vec![scored("a", 0.9, "aprovado"), scored("b", 0.2, "aprovado")],
            &params,
        );
        assert_eq!(positives(&labels), vec!["a"]);
    }

    #[test]
    fn groups_keep_first_appearance_order() {
        let mut first = scored("a", 0.3, "");
        first.vaga_code = "v2".to_string();
        let labels = label_pairs(
            vec![first, scored("b", 0.4, ""), scored("c", 0.1, "")],
            &WeakLabelParams::default(),
        );
        let codes: Vec<_> = labels.iter().map(|pair| pair.vaga_code.as_str()).collect();
        assert_eq!(codes, vec!["v2", "v1", "v1"]);
    }
}
