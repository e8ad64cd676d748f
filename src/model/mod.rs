//! Classifier families, preprocessing and evaluation
//!
//! Three families compete on every training run:
//!
//! | Family               | Input    | Importances                    |
//! |----------------------|----------|--------------------------------|
//! | `RandomForest`       | raw      | mean Gini decrease over trees  |
//! | `GradientBoosting`   | raw      | squared-error gain over rounds |
//! | `LogisticRegression` | scaled   | none                           |
//!
//! Fitted models live in [`TrainedModel`], a tagged union that serializes
//! with its family name so an artifact is self-describing.

mod boosting;
mod forest;
mod logistic;
mod metrics;
mod scaler;
mod tree;

pub use boosting::{BoostingConfig, GradientBoostingModel};
pub use forest::{max_features, ForestConfig, RandomForestModel};
pub use logistic::{LogisticConfig, LogisticModel};
pub use metrics::{roc_auc, ClassificationReport, ConfusionMatrix, DECISION_THRESHOLD};
pub use scaler::StandardScaler;
pub use tree::{DecisionTree, Node, TreeParams};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classifier family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFamily {
    /// Bagged CART trees
    RandomForest,
    /// Log-loss boosted trees
    GradientBoosting,
    /// L2 logistic regression on scaled input
    LogisticRegression,
}

impl ModelFamily {
    /// Training and selection order; ties on AUC keep the earlier family
    pub const ORDER: [Self; 3] = [
        Self::RandomForest,
        Self::GradientBoosting,
        Self::LogisticRegression,
    ];

    /// Wire name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RandomForest => "random_forest",
            Self::GradientBoosting => "gradient_boosting",
            Self::LogisticRegression => "logistic_regression",
        }
    }

    /// Parse a wire name
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ORDER.into_iter().find(|f| f.as_str() == name)
    }

    /// Whether inputs go through the fitted scaler first
    #[must_use]
    pub const fn requires_scaling(&self) -> bool {
        matches!(self, Self::LogisticRegression)
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Common inference surface of the fitted families.
pub trait Classifier: Send + Sync {
    /// Positive-class probability for a row in the model's input space
    fn predict_proba(&self, row: &[f64]) -> f64;

    /// Normalized importances in column order, when the family has them
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }
}

impl Classifier for RandomForestModel {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        Self::predict_proba(self, row)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(Self::feature_importances(self))
    }
}

impl Classifier for GradientBoostingModel {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        Self::predict_proba(self, row)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        Some(Self::feature_importances(self))
    }
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        Self::predict_proba(self, row)
    }
}

/// Fitted model of any family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum TrainedModel {
    /// Random forest
    RandomForest(RandomForestModel),
    /// Gradient boosting
    GradientBoosting(GradientBoostingModel),
    /// Logistic regression
    LogisticRegression(LogisticModel),
}

impl TrainedModel {
    /// Family of the wrapped model
    #[must_use]
    pub const fn family(&self) -> ModelFamily {
        match self {
            Self::RandomForest(_) => ModelFamily::RandomForest,
            Self::GradientBoosting(_) => ModelFamily::GradientBoosting,
            Self::LogisticRegression(_) => ModelFamily::LogisticRegression,
        }
    }

    /// Structural check of a deserialized model against the column count
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ArtifactCorrupt`] when the model could not be
    /// evaluated safely on `n_features` columns.
    pub fn validate(&self, n_features: usize) -> crate::Result<()> {
        match self {
            Self::RandomForest(m) => m.validate(n_features),
            Self::GradientBoosting(m) => m.validate(n_features),
            Self::LogisticRegression(m) => m.validate(n_features),
        }
    }

    fn classifier(&self) -> &dyn Classifier {
        match self {
            Self::RandomForest(m) => m,
            Self::GradientBoosting(m) => m,
            Self::LogisticRegression(m) => m,
        }
    }
}

impl Classifier for TrainedModel {
    fn predict_proba(&self, row: &[f64]) -> f64 {
        self.classifier().predict_proba(row)
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.classifier().feature_importances()
    }
}

/// Numerically stable logistic function
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `n / (2 * n_class)` per sample, so both classes carry equal total weight
#[allow(clippy::cast_precision_loss)]
pub(crate) fn class_balanced_weights(labels: &[bool]) -> Vec<f64> {
    let n = labels.len() as f64;
    let positives = labels.iter().filter(|&&l| l).count() as f64;
    let negatives = n - positives;
    let weight = |count: f64| if count > 0.0 { n / (2.0 * count) } else { 0.0 };
    let (w_pos, w_neg) = (weight(positives), weight(negatives));
    labels
        .iter()
        .map(|&l| if l { w_pos } else { w_neg })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_order_and_names() {
        assert_eq!(
            ModelFamily::ORDER.map(|f| f.as_str()),
            ["random_forest", "gradient_boosting", "logistic_regression"]
        );
        assert_eq!(ModelFamily::parse("gradient_boosting"), Some(ModelFamily::GradientBoosting));
        assert_eq!(ModelFamily::parse("svm"), None);
        assert!(ModelFamily::LogisticRegression.requires_scaling());
        assert!(!ModelFamily::RandomForest.requires_scaling());
    }

    #[test]
    fn test_family_serde_matches_wire_name() {
        for family in ModelFamily::ORDER {
            let json = serde_json::to_string(&family).unwrap();
            assert_eq!(json, format!("\"{}\"", family.as_str()));
        }
    }

    #[test]
    fn test_sigmoid() {
        assert!((sigmoid(0.0) - 0.5).abs() < f64::EPSILON);
        assert!((sigmoid(-1000.0)).abs() < f64::EPSILON);
        assert!((sigmoid(1000.0) - 1.0).abs() < f64::EPSILON);
        assert!((sigmoid(2.0) + sigmoid(-2.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_class_balanced_weights() {
        let weights = class_balanced_weights(&[true, true, true, false]);
        // 4 / (2 * 3) and 4 / (2 * 1)
        assert!((weights[0] - 4.0 / 6.0).abs() < 1e-12);
        assert!((weights[3] - 2.0).abs() < 1e-12);
        let pos: f64 = weights[..3].iter().sum();
        assert!((pos - weights[3]).abs() < 1e-12);
    }

    #[test]
    fn test_trained_model_tagged_serde() {
        let rows = vec![vec![0.0], vec![1.0]];
        let model = TrainedModel::LogisticRegression(LogisticModel::fit(
            &rows,
            &[false, true],
            &LogisticConfig::default(),
        ));
        let json = serde_json::to_value(&model).unwrap();
        assert_eq!(json["family"], "logistic_regression");

        let back: TrainedModel = serde_json::from_value(json).unwrap();
        assert_eq!(back.family(), ModelFamily::LogisticRegression);
        assert!(back.feature_importances().is_none());
        assert_eq!(
            back.predict_proba(&[1.0]).to_bits(),
            model.predict_proba(&[1.0]).to_bits()
        );
    }
}
