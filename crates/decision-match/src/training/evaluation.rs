//! Binary classification metrics and decision threshold selection.

use serde::{Deserialize, Serialize};

/// Threshold used when one cannot be chosen from data.
pub const DEFAULT_THRESHOLD: f64 = 0.59;

const THRESHOLD_MIN: f64 = 0.2;
const THRESHOLD_MAX: f64 = 0.8;
const THRESHOLD_STEPS: usize = 61;

/// Area under the ROC curve from the rank statistic, averaging tied ranks.
/// `None` unless both classes are present.
pub fn roc_auc(labels: &[u8], scores: &[f64]) -> Option<f64> {
    let n = labels.len().min(scores.len());
    let positives = labels[..n].iter().filter(|y| **y == 1).count();
    let negatives = n - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| scores[*a].total_cmp(&scores[*b]));

    let mut ranks = vec![0.0; n];
    let mut start = 0;
    while start < n {
        let mut end = start + 1;
        while end < n && scores[order[end]] == scores[order[start]] {
            end += 1;
        }
        // ranks are 1-based; ties share the mean of their positions
        let average = (start + end + 1) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = average;
        }
        start = end;
    }

    let positive_rank_sum: f64 = (0..n).filter(|i| labels[*i] == 1).map(|i| ranks[i]).sum();
    let positives = positives as f64;
    let u = positive_rank_sum - positives * (positives + 1.0) / 2.0;
    Some(u / (positives * negatives as f64))
}

pub fn accuracy(labels: &[u8], predicted: &[u8]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    let hits = labels.iter().zip(predicted).filter(|(y, p)| y == p).count();
    hits as f64 / labels.len() as f64
}

/// Precision, recall and F1 of the positive class; each is 0 when undefined.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BinaryScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

pub fn binary_scores(labels: &[u8], predicted: &[u8]) -> BinaryScores {
    let mut true_positive = 0usize;
    let mut false_positive = 0usize;
    let mut false_negative = 0usize;
    for (y, p) in labels.iter().zip(predicted) {
        match (*y, *p) {
            (1, 1) => true_positive += 1,
            (0, 1) => false_positive += 1,
            (1, 0) => false_negative += 1,
            _ => {}
        }
    }

    let ratio = |num: usize, den: usize| if den == 0 { 0.0 } else { num as f64 / den as f64 };
    let precision = ratio(true_positive, true_positive + false_positive);
    let recall = ratio(true_positive, true_positive + false_negative);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };
    BinaryScores {
        precision,
        recall,
        f1,
    }
}

pub fn apply_threshold(probabilities: &[f64], threshold: f64) -> Vec<u8> {
    probabilities
        .iter()
        .map(|p| u8::from(*p >= threshold))
        .collect()
}

/// Candidate thresholds: 61 evenly spaced points from 0.2 to 0.8.
pub fn threshold_grid() -> impl Iterator<Item = f64> {
    let step = (THRESHOLD_MAX - THRESHOLD_MIN) / (THRESHOLD_STEPS - 1) as f64;
    (0..THRESHOLD_STEPS).map(move |i| THRESHOLD_MIN + step * i as f64)
}

/// Grid threshold maximizing `accuracy + auc - 1`; the first of equal
/// maxima wins. Falls back to [`DEFAULT_THRESHOLD`] when AUC is undefined.
pub fn choose_threshold(probabilities: &[f64], labels: &[u8]) -> f64 {
    let Some(auc) = roc_auc(labels, probabilities) else {
        return DEFAULT_THRESHOLD;
    };

    let mut best: Option<(f64, f64)> = None;
    for threshold in threshold_grid() {
        let value = accuracy(labels, &apply_threshold(probabilities, threshold)) + auc - 1.0;
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some((threshold, value));
        }
    }
    best.map_or(DEFAULT_THRESHOLD, |(threshold, _)| threshold)
}

/// Metrics of one set of predictions at a fixed threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub auc: Option<f64>,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

pub fn evaluate(labels: &[u8], probabilities: &[f64], threshold: f64) -> Evaluation {
    let predicted = apply_threshold(probabilities, threshold);
    let scores = binary_scores(labels, &predicted);
    Evaluation {
        auc: roc_auc(labels, probabilities),
        accuracy: accuracy(labels, &predicted),
        precision: scores.precision,
        recall: scores.recall,
        f1: scores.f1,
    }
}

pub fn positive_rate(labels: &[u8]) -> f64 {
    if labels.is_empty() {
        return 0.0;
    }
    labels.iter().filter(|y| **y == 1).count() as f64 / labels.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auc_counts_ties_as_half() {
        assert_eq!(roc_auc(&[0, 0, 1, 1], &[0.1, 0.4, 0.35, 0.8]), Some(0.75));
        assert_eq!(roc_auc(&[0, 1], &[0.5, 0.5]), Some(0.5));
        assert_eq!(roc_auc(&[1, 1], &[0.2, 0.9]), None);
    }

    #[test]
    fn undefined_ratios_are_zero() {
        let scores = binary_scores(&[0, 0, 1], &[0, 0, 0]);
        assert_eq!(scores, BinaryScores::default());

        let scores = binary_scores(&[1, 0, 1, 1], &[1, 1, 0, 1]);
        assert!((scores.precision - 2.0 / 3.0).abs() < 1e-12);
        assert!((scores.recall - 2.0 / 3.0).abs() < 1e-12);
        assert!((scores.f1 - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn grid_spans_point_two_to_point_eight() {
        let grid: Vec<f64> = threshold_grid().collect();
        assert_eq!(grid.len(), 61);
        assert!((grid[0] - 0.2).abs() < 1e-12);
        assert!((grid[60] - 0.8).abs() < 1e-12);
        assert!((grid[1] - 0.21).abs() < 1e-12);
    }

    #[test]
    fn threshold_picks_first_best_grid_point() {
        // Every threshold in (0.305, 0.7] separates perfectly; the first is 0.31.
        let threshold = choose_threshold(&[0.305, 0.7], &[0, 1]);
        assert!((threshold - 0.31).abs() < 1e-9);
    }

    #[test]
    fn threshold_defaults_for_single_class() {
        assert_eq!(choose_threshold(&[0.3, 0.7], &[1, 1]), DEFAULT_THRESHOLD);
    }

    #[test]
    fn evaluation_bundles_metrics() {
        let evaluation = evaluate(&[0, 1, 1, 0], &[0.2, 0.9, 0.4, 0.6], 0.5);
        assert_eq!(evaluation.auc, Some(0.75));
        assert_eq!(evaluation.accuracy, 0.5);
        assert_eq!(evaluation.precision, 0.5);
        assert_eq!(evaluation.recall, 0.5);
    }
}
