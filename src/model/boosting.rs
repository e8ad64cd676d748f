//! Gradient-boosted trees on the binomial log-loss
//!
//! ```text
//! F0(x)  = ln(p / (1 - p))                     p = positive rate
//! r_i    = y_i - sigmoid(F(x_i))               negative gradient
//! tree_m = CART fit on r (squared error)
//! leaf   = Σ r_i / Σ p_i (1 - p_i)             one Newton step per leaf
//! F(x)  += learning_rate * tree_m(x)
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::sigmoid;
use super::tree::{normalize, DecisionTree, TreeParams};
use crate::{Error, Result};

/// Gradient boosting hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every tree
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples to split a node
    pub min_samples_split: usize,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_split: 2,
        }
    }
}

/// Fitted boosting ensemble.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingModel {
    initial_log_odds: f64,
    learning_rate: f64,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl GradientBoostingModel {
    /// Fit on unscaled rows.
    ///
    /// Every split considers all columns, so `rng` is only threaded through
    /// to the tree builder; the result does not depend on it.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fit<R: Rng>(
        rows: &[Vec<f64>],
        labels: &[bool],
        config: &BoostingConfig,
        rng: &mut R,
    ) -> Self {
        let n = rows.len();
        let n_features = rows.first().map_or(0, Vec::len);
        let targets: Vec<f64> = labels.iter().map(|&l| f64::from(u8::from(l))).collect();

        let positive_rate = if n == 0 {
            0.5
        } else {
            targets.iter().sum::<f64>() / n as f64
        };
        let prior = positive_rate.clamp(1e-6, 1.0 - 1e-6);
        let initial_log_odds = (prior / (1.0 - prior)).ln();

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: None,
        };
        let unit_weights = vec![1.0; n];
        let mut raw = vec![initial_log_odds; n];
        let mut trees = Vec::with_capacity(config.n_estimators);

        for _ in 0..config.n_estimators {
            let probs: Vec<f64> = raw.iter().map(|&f| sigmoid(f)).collect();
            let residuals: Vec<f64> = targets.iter().zip(&probs).map(|(y, p)| y - p).collect();

            let mut tree = DecisionTree::fit(rows, &residuals, &unit_weights, params, rng);

            let leaves: Vec<usize> = rows.iter().map(|row| tree.leaf_index(row)).collect();
            let mut numerator = vec![0.0; tree.node_count()];
            let mut denominator = vec![0.0; tree.node_count()];
            for ((&leaf, r), p) in leaves.iter().zip(&residuals).zip(&probs) {
                numerator[leaf] += r;
                denominator[leaf] += p * (1.0 - p);
            }
            let steps: Vec<f64> = numerator
                .iter()
                .zip(&denominator)
                .map(|(num, den)| if *den > 1e-12 { num / den } else { 0.0 })
                .collect();
            for &leaf in &leaves {
                tree.set_leaf_value(leaf, steps[leaf]);
            }

            for (f, &leaf) in raw.iter_mut().zip(&leaves) {
                *f += config.learning_rate * steps[leaf];
            }
            trees.push(tree);
        }

        tracing::debug!(rounds = trees.len(), initial_log_odds, "gradient boosting fitted");
        Self {
            initial_log_odds,
            learning_rate: config.learning_rate,
            trees,
            n_features,
        }
    }

    /// Raw additive score (log-odds)
    #[must_use]
    pub fn decision_function(&self, row: &[f64]) -> f64 {
        self.initial_log_odds
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict(row))
                .sum::<f64>()
    }

    /// Positive-class probability
    #[must_use]
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        sigmoid(self.decision_function(row))
    }

    /// Squared-error gain importances averaged over rounds, summing to 1
    #[must_use]
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.n_features];
        for tree in &self.trees {
            for (acc, v) in total.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
        }
        normalize(&total)
    }

    /// Prior log-odds the ensemble starts from
    #[must_use]
    pub const fn initial_log_odds(&self) -> f64 {
        self.initial_log_odds
    }

    /// Number of boosting rounds
    #[must_use]
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Check every round against the expected column count
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactCorrupt`] for a mismatched or broken tree.
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.n_features != n_features {
            return Err(Error::ArtifactCorrupt(format!(
                "boosting expects {} columns, schema has {n_features}",
                self.n_features
            )));
        }
        self.trees.iter().try_for_each(|t| t.validate(n_features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn dataset() -> (Vec<Vec<f64>>, Vec<bool>) {
        let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i), f64::from(i % 4)]).collect();
        let labels = (0..40).map(|i| i >= 12).collect();
        (rows, labels)
    }

    fn small_config() -> BoostingConfig {
        BoostingConfig {
            n_estimators: 20,
            max_depth: 3,
            ..BoostingConfig::default()
        }
    }

    #[test]
    fn test_initial_log_odds_is_prior() {
        let (rows, labels) = dataset();
        let config = BoostingConfig {
            n_estimators: 0,
            ..small_config()
        };
        let model = GradientBoostingModel::fit(&rows, &labels, &config, &mut StdRng::seed_from_u64(0));

        let expected = (0.7_f64 / 0.3).ln();
        assert!((model.initial_log_odds() - expected).abs() < 1e-12);
        assert!((model.predict_proba(&[0.0, 0.0]) - 0.7).abs() < 1e-9);
        assert_eq!(model.n_trees(), 0);
    }

    #[test]
    fn test_boosting_fits_training_data() {
        let (rows, labels) = dataset();
        let model = GradientBoostingModel::fit(&rows, &labels, &small_config(), &mut StdRng::seed_from_u64(0));

        assert!(model.predict_proba(&[30.0, 2.0]) > 0.9);
        assert!(model.predict_proba(&[2.0, 2.0]) < 0.1);
    }

    #[test]
    fn test_independent_of_rng() {
        let (rows, labels) = dataset();
        let a = GradientBoostingModel::fit(&rows, &labels, &small_config(), &mut StdRng::seed_from_u64(1));
        let b = GradientBoostingModel::fit(&rows, &labels, &small_config(), &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_importances_favor_signal_column() {
        let (rows, labels) = dataset();
        let model = GradientBoostingModel::fit(&rows, &labels, &small_config(), &mut StdRng::seed_from_u64(0));
        let importances = model.feature_importances();

        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(importances[0] > importances[1]);
    }
}
