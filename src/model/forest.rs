//! Bagged random forest of CART trees
//!
//! Each tree sees a bootstrap resample (expressed as per-sample counts
//! multiplied into class-balanced weights) and `sqrt(n_features)` candidate
//! columns per split. Per-tree seeds are drawn from the caller's RNG before
//! any tree is grown, so the `rayon` build is identical to the serial one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::class_balanced_weights;
use super::tree::{normalize, DecisionTree, TreeParams};
use crate::{Error, Result};

/// Random forest hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples to split a node
    pub min_samples_split: usize,
    /// Reweight classes inversely to their frequency
    pub class_balanced: bool,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 10,
            min_samples_split: 2,
            class_balanced: true,
        }
    }
}

/// Fitted random forest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestModel {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForestModel {
    /// Grow `config.n_estimators` trees on unscaled rows.
    #[must_use]
    pub fn fit<R: Rng>(rows: &[Vec<f64>], labels: &[bool], config: &ForestConfig, rng: &mut R) -> Self {
        let n_features = rows.first().map_or(0, Vec::len);
        let base_weights = if config.class_balanced {
            class_balanced_weights(labels)
        } else {
            vec![1.0; labels.len()]
        };
        let targets: Vec<f64> = labels.iter().map(|&l| f64::from(u8::from(l))).collect();
        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: Some(max_features(n_features)),
        };

        let seeds: Vec<u64> = (0..config.n_estimators).map(|_| rng.gen()).collect();
        let grow = |seed: &u64| {
            let mut tree_rng = StdRng::seed_from_u64(*seed);
            let weights = bootstrap_weights(&base_weights, &mut tree_rng);
            DecisionTree::fit(rows, &targets, &weights, params, &mut tree_rng)
        };

        #[cfg(feature = "rayon")]
        let trees: Vec<DecisionTree> = {
            use rayon::prelude::*;
            seeds.par_iter().map(grow).collect()
        };
        #[cfg(not(feature = "rayon"))]
        let trees: Vec<DecisionTree> = seeds.iter().map(grow).collect();

        tracing::debug!(trees = trees.len(), "random forest grown");
        Self { trees, n_features }
    }

    /// Mean positive fraction over the leaves `row` reaches
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict(row)).sum();
        (sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    /// Impurity-decrease importances averaged over trees, summing to 1
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

    /// Fitted trees
    #[must_use]
    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    /// Check every tree against the expected column count
    ///
    /// # Errors
    ///
    /// Returns [`Error::ArtifactCorrupt`] for a mismatched or broken tree.
    pub fn validate(&self, n_features: usize) -> Result<()> {
        if self.n_features != n_features {
            return Err(Error::ArtifactCorrupt(format!(
                "forest expects {} columns, schema has {n_features}",
                self.n_features
            )));
        }
        self.trees.iter().try_for_each(|t| t.validate(n_features))
    }
}

/// Candidate columns per split: `floor(sqrt(n))`, at least one
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn max_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt() as usize).max(1)
}

/// Draw `n` indices with replacement and fold the counts into `base`
fn bootstrap_weights<R: Rng>(base: &[f64], rng: &mut R) -> Vec<f64> {
    let n = base.len();
    let mut counts = vec![0u32; n];
    if n > 0 {
        for _ in 0..n {
            counts[rng.gen_range(0..n)] += 1;
        }
    }
    base.iter()
        .zip(counts)
        .map(|(w, c)| w * f64::from(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> (Vec<Vec<f64>>, Vec<bool>) {
        let rows: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![f64::from(i), f64::from(i % 5), f64::from(i % 3)])
            .collect();
        let labels = (0..60).map(|i| i >= 30).collect();
        (rows, labels)
    }

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_estimators: 15,
            max_depth: 4,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_max_features_sqrt() {
        assert_eq!(max_features(14), 3);
        assert_eq!(max_features(16), 4);
        assert_eq!(max_features(1), 1);
        assert_eq!(max_features(0), 1);
    }

    #[test]
    fn test_separates_threshold_data() {
        let (rows, labels) = dataset();
        let mut rng = StdRng::seed_from_u64(42);
        let forest = RandomForestModel::fit(&rows, &labels, &small_config(), &mut rng);

        assert_eq!(forest.trees().len(), 15);
        assert!(forest.predict_proba(&[55.0, 0.0, 1.0]) > 0.65);
        assert!(forest.predict_proba(&[3.0, 3.0, 0.0]) < 0.35);
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (rows, labels) = dataset();
        let a = RandomForestModel::fit(&rows, &labels, &small_config(), &mut StdRng::seed_from_u64(7));
        let b = RandomForestModel::fit(&rows, &labels, &small_config(), &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_importances_sum_to_one() {
        let (rows, labels) = dataset();
        let mut rng = StdRng::seed_from_u64(1);
        let forest = RandomForestModel::fit(&rows, &labels, &small_config(), &mut rng);
        let importances = forest.feature_importances();

        assert_eq!(importances.len(), 3);
        assert!((importances.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        // the first column carries the label
        assert!(importances[0] > importances[1]);
    }

    #[test]
    fn test_bootstrap_weights_preserve_count() {
        let mut rng = StdRng::seed_from_u64(3);
        let weights = bootstrap_weights(&[1.0; 50], &mut rng);
        assert!((weights.iter().sum::<f64>() - 50.0).abs() < f64::EPSILON);
    }
}
