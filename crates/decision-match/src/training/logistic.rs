//! L2-regularized binary logistic regression over sparse rows.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::scoring::tfidf::SparseVector;

/// Solver settings. `c` is the inverse regularization strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogisticRegression {
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-4,
        }
    }
}

/// Fitted coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl LogisticModel {
    pub fn decision(&self, row: &SparseVector) -> f64 {
        row.entries()
            .iter()
            .filter_map(|(index, value)| self.weights.get(*index).map(|w| w * value))
            .sum::<f64>()
            + self.intercept
    }

    pub fn predict_proba(&self, row: &SparseVector) -> f64 {
        sigmoid(self.decision(row))
    }
}

impl LogisticRegression {
    /// Minimize the mean log loss plus `||w||² / (2·C·n)` with an accelerated
    /// gradient method; the intercept is not penalized. Deterministic for a
    /// given input.
    pub fn fit(&self, rows: &[SparseVector], labels: &[u8], n_features: usize) -> LogisticModel {
        let n = rows.len().min(labels.len());
        if n == 0 {
            return LogisticModel {
                weights: vec![0.0; n_features],
                intercept: 0.0,
            };
        }
        let rows = &rows[..n];
        let targets: Vec<f64> = labels[..n].iter().map(|y| f64::from(*y)).collect();
        let penalty = 1.0 / (self.c * n as f64);

        let max_row_norm = rows
            .iter()
            .map(|row| row.norm().powi(2) + 1.0)
            .fold(0.0, f64::max);
        let step = 1.0 / (0.25 * max_row_norm + penalty);

        let dimension = n_features + 1;
        let mut current = vec![0.0; dimension];
        let mut lookahead = current.clone();
        let mut momentum = 1.0f64;
        let mut converged = false;
        let mut iterations = 0;

        for iteration in 0..self.max_iter {
            iterations = iteration + 1;
            let gradient = gradient(rows, &targets, &lookahead, penalty, n_features);
            let gradient_norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt();
            if gradient_norm < self.tol {
                current = lookahead;
                converged = true;
                break;
            }

            let next: Vec<f64> = lookahead
                .iter()
                .zip(&gradient)
                .map(|(x, g)| x - step * g)
                .collect();

            // Restart when the step moves against the momentum direction.
            let against: f64 = lookahead
                .iter()
                .zip(&next)
                .zip(&current)
                .map(|((y, x_next), x)| (y - x_next) * (x_next - x))
                .sum();
            if against > 0.0 {
                momentum = 1.0;
            }

            let next_momentum = (1.0 + (1.0 + 4.0 * momentum * momentum).sqrt()) / 2.0;
            let blend = (momentum - 1.0) / next_momentum;
            lookahead = next
                .iter()
                .zip(&current)
                .map(|(x_next, x)| x_next + blend * (x_next - x))
                .collect();
            current = next;
            momentum = next_momentum;
        }

        if converged {
            debug!(iterations, "logistic regression converged");
        } else {
            warn!(
                max_iter = self.max_iter,
                "logistic regression did not converge; using last iterate"
            );
        }

        let intercept = current[n_features];
        current.truncate(n_features);
        LogisticModel {
            weights: current,
            intercept,
        }
    }
}

/// Gradient of the objective; the last coordinate is the intercept.
fn gradient(
    rows: &[SparseVector],
    targets: &[f64],
    params: &[f64],
    penalty: f64,
    n_features: usize,
) -> Vec<f64> {
    let n = rows.len() as f64;
    let intercept = params[n_features];
    let mut gradient = vec![0.0; n_features + 1];

    for (row, target) in rows.iter().zip(targets) {
        let z: f64 = row
            .entries()
            .iter()
            .filter(|(index, _)| *index < n_features)
            .map(|(index, value)| params[*index] * value)
            .sum::<f64>()
            + intercept;
        let residual = (sigmoid(z) - target) / n;
        for (index, value) in row.entries() {
            if *index < n_features {
                gradient[*index] += residual * value;
            }
        }
        gradient[n_features] += residual;
    }

    for (g, w) in gradient.iter_mut().zip(params).take(n_features) {
        *g += penalty * w;
    }
    gradient
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[(usize, f64)]) -> SparseVector {
        let mut row = SparseVector::default();
        for (index, value) in values {
            row.push(*index, *value);
        }
        row
    }

    #[test]
    fn sigmoid_is_stable_at_extremes() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn separates_by_the_informative_feature() {
        let rows = vec![
            row(&[(0, 1.0)]),
            row(&[(0, 1.0), (2, 0.5)]),
            row(&[(1, 1.0)]),
            row(&[(1, 1.0), (2, 0.5)]),
        ];
        let model = LogisticRegression::default().fit(&rows, &[1, 1, 0, 0], 3);

        assert!(model.weights[0] > 0.0);
        assert!(model.weights[1] < 0.0);
        assert!(model.predict_proba(&rows[0]) > 0.5);
        assert!(model.predict_proba(&rows[2]) < 0.5);
    }

    #[test]
    fn intercept_tracks_class_balance_without_features() {
        let rows = vec![SparseVector::default(); 4];
        let model = LogisticRegression::default().fit(&rows, &[1, 0, 0, 0], 2);
        // Unpenalized intercept converges to the log-odds of the base rate.
        assert!((model.intercept - (0.25f64 / 0.75).ln()).abs() < 1e-3);
        assert_eq!(model.weights, vec![0.0, 0.0]);
    }

    #[test]
    fn fitting_is_deterministic() {
        let rows = vec![row(&[(0, 0.3)]), row(&[(1, 0.7)]), row(&[(0, 0.9), (1, 0.1)])];
        let solver = LogisticRegression::default();
        assert_eq!(solver.fit(&rows, &[1, 0, 1], 2), solver.fit(&rows, &[1, 0, 1], 2));
    }
}
