//! L2-regularized logistic regression with class-balanced weights
//!
//! Fitted by full-batch gradient descent on standardized inputs. No
//! randomness: the same data always yields the same coefficients.

use serde::{Deserialize, Serialize};

use super::{class_balanced_weights, sigmoid};
use crate::{Error, Result};

/// Logistic regression hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    /// Inverse regularization strength
    pub c: f64,
    /// Gradient descent step size
    pub learning_rate: f64,
    /// Iteration cap
    pub max_iter: usize,
    /// Stop once the gradient norm falls below this
    pub tolerance: f64,
    /// Reweight classes inversely to their frequency
    pub class_balanced: bool,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            learning_rate: 0.1,
            max_iter: 1000,
            tolerance: 1e-6,
            class_balanced: true,
        }
    }
}

/// Fitted logistic regression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    coefficients: Vec<f64>,
    intercept: f64,
    iterations: usize,
}

impl LogisticModel {
    /// Fit on (already scaled) rows and 0/1 labels.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit(rows: &[Vec<f64>], labels: &[bool], config: &LogisticConfig) -> Self {
        let dim = rows.first().map_or(0, Vec::len);
        let weights = if config.class_balanced {
            class_balanced_weights(labels)
        } else {
            vec![1.0; labels.len()]
        };
        let total_weight: f64 = weights.iter().sum::<f64>().max(f64::EPSILON);
        // penalty ½‖β‖² / C, expressed per unit of sample weight
        let alpha = 1.0 / (config.c.max(f64::EPSILON) * total_weight);

        let mut coefficients = vec![0.0; dim];
        let mut intercept = 0.0;
        let mut iterations = 0;

        for _ in 0..config.max_iter {
            iterations += 1;
            let mut grad = vec![0.0; dim];
            let mut grad_intercept = 0.0;

            for ((row, &label), &w) in rows.iter().zip(labels).zip(&weights) {
                let p = sigmoid(dot(&coefficients, row) + intercept);
                let err = w * (p - f64::from(u8::from(label)));
                for (g, x) in grad.iter_mut().zip(row) {
                    *g += err * x;
                }
                grad_intercept += err;
            }

            let mut norm = 0.0;
            for (g, beta) in grad.iter_mut().zip(&coefficients) {
                *g = *g / total_weight + alpha * beta;
                norm += *g * *g;
            }
            grad_intercept /= total_weight;
            norm += grad_intercept * grad_intercept;

            for (beta, g) in coefficients.iter_mut().zip(&grad) {
                *beta -= config.learning_rate * g;
            }
            intercept -= config.learning_rate * grad_intercept;

            if norm.sqrt() < config.tolerance {
                break;
            }
        }

        tracing::debug!(iterations, "logistic regression converged");
        Self {
            coefficients,
            intercept,
            iterations,
        }
    }

    /// Positive-class probability for a scaled row
    #[must_use]
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(dot(&self.coefficients, row) + self.intercept)
    }

    /// Coefficients in column order
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Intercept
    #[must_use]
    pub const fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Gradient steps taken
    #[must_use]
    pub const fn iterations(&self) -> usize {
        self.iterations
    }

    /// Check the weight vector against the expected column count
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactCorrupt`] for a length mismatch.
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.coefficients.len() != n_features {
            return Err(Error::ArtifactCorrupt(format!(
                "logistic model has {} coefficients, schema has {n_features}",
                self.coefficients.len()
            )));
        }
        Ok(())
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
