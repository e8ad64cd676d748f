//! Multi-family training and AUC-based selection

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::split::stratified_split;
use crate::artifact::{ModelArtifact, SampleCounts};
use crate::dataset::{FeatureStatistics, TrainingSample};
use crate::model::{
    BoostingConfig, ClassificationReport, Classifier, ForestConfig, GradientBoostingModel,
    LogisticConfig, LogisticModel, ModelFamily, RandomForestModel, StandardScaler, TrainedModel,
};
use crate::{Error, Result};

/// Default held-out fraction
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Training hyperparameters for every family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Fraction of each class held out for selection
    pub test_fraction: f64,
    /// Random forest settings
    pub forest: ForestConfig,
    /// Gradient boosting settings
    pub boosting: BoostingConfig,
    /// Logistic regression settings
    pub logistic: LogisticConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            test_fraction: DEFAULT_TEST_FRACTION,
            forest: ForestConfig::default(),
            boosting: BoostingConfig::default(),
            logistic: LogisticConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Create a builder starting from the defaults
    #[must_use]
    pub fn builder() -> TrainingConfigBuilder {
        TrainingConfigBuilder::default()
    }
}

/// Builder for [`TrainingConfig`].
#[derive(Debug, Default)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
}

impl TrainingConfigBuilder {
    /// Set the held-out fraction
    #[must_use]
    pub const fn test_fraction(mut self, fraction: f64) -> Self {
        self.config.test_fraction = fraction;
        self
    }

    /// Replace the random forest settings
    #[must_use]
    pub const fn forest(mut self, forest: ForestConfig) -> Self {
        self.config.forest = forest;
        self
    }

    /// Replace the gradient boosting settings
    #[must_use]
    pub const fn boosting(mut self, boosting: BoostingConfig) -> Self {
        self.config.boosting = boosting;
        self
    }

    /// Replace the logistic regression settings
    #[must_use]
    pub const fn logistic(mut self, logistic: LogisticConfig) -> Self {
        self.config.logistic = logistic;
        self
    }

    /// Tree count for both ensembles
    #[must_use]
    pub const fn n_estimators(mut self, n: usize) -> Self {
        self.config.forest.n_estimators = n;
        self.config.boosting.n_estimators = n;
        self
    }

    /// Finish building
    #[must_use]
    pub const fn build(self) -> TrainingConfig {
        self.config
    }
}

/// Trains every family and keeps the one with the best held-out AUC.
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainingConfig,
}

impl Trainer {
    /// Create a trainer
    #[must_use]
    pub const fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    /// Hyperparameters in use
    #[must_use]
    pub const fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Train from a fixed seed; the seed is recorded in the artifact.
    ///
    /// # Errors
    ///
    /// See [`Trainer::train`].
    pub fn train_seeded(&self, samples: &[TrainingSample], seed: u64) -> Result<ModelArtifact> {
        let mut rng = StdRng::seed_from_u64(seed);
        self.fit(samples, &mut rng, Some(seed))
    }

    /// Split, fit all families, evaluate on the held-out split and select.
    ///
    /// The same samples and RNG state always produce the same models,
    /// scores and selection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `samples` is empty, holds a single
    /// class, or the configured test fraction is outside `[0, 1)`.
    pub fn train<R: Rng>(&self, samples: &[TrainingSample], rng: &mut R) -> Result<ModelArtifact> {
        self.fit(samples, rng, None)
    }

    fn fit<R: Rng>(
        &self,
        samples: &[TrainingSample],
        rng: &mut R,
        seed: Option<u64>,
    ) -> Result<ModelArtifact> {
        if samples.is_empty() {
            return Err(Error::InvalidInput("no training samples".to_string()));
        }
        let labels: Vec<bool> = samples.iter().map(|s| s.label().is_positive()).collect();
        let positives = labels.iter().filter(|&&l| l).count();
        if positives == 0 || positives == labels.len() {
            return Err(Error::InvalidInput(format!(
                "training needs both classes, got {positives} admitted of {}",
                labels.len()
            )));
        }

        let split = stratified_split(&labels, self.config.test_fraction, rng)?;
        let rows = |idx: &[usize]| -> Vec<Vec<f64>> {
            idx.iter()
                .map(|&i| samples[i].features().as_slice().to_vec())
                .collect()
        };
        let gather = |idx: &[usize]| -> Vec<bool> { idx.iter().map(|&i| labels[i]).collect() };
        let (train_x, train_y) = (rows(&split.train), gather(&split.train));
        let (test_x, test_y) = (rows(&split.test), gather(&split.test));

        let synthetic = samples.iter().filter(|s| s.is_synthetic()).count();
        let counts = SampleCounts {
            observed: samples.len() - synthetic,
            synthetic,
            train: train_x.len(),
            test: test_x.len(),
        };
        tracing::info!(
            train = counts.train,
            test = counts.test,
            observed = counts.observed,
            synthetic = counts.synthetic,
            "training admission models"
        );

        let scaler = StandardScaler::fit(&train_x);
        let train_scaled = scaler.transform_all(&train_x);
        let test_scaled = scaler.transform_all(&test_x);

        let mut models = Vec::with_capacity(ModelFamily::ORDER.len());
        let mut reports = BTreeMap::new();
        let mut best: Option<(ModelFamily, f64)> = None;

        for family in ModelFamily::ORDER {
            let model = match family {
                ModelFamily::RandomForest => TrainedModel::RandomForest(RandomForestModel::fit(
                    &train_x,
                    &train_y,
                    &self.config.forest,
                    rng,
                )),
                ModelFamily::GradientBoosting => {
                    TrainedModel::GradientBoosting(GradientBoostingModel::fit(
                        &train_x,
                        &train_y,
                        &self.config.boosting,
                        rng,
                    ))
                }
                ModelFamily::LogisticRegression => TrainedModel::LogisticRegression(
                    LogisticModel::fit(&train_scaled, &train_y, &self.config.logistic),
                ),
            };

            let eval_x = if family.requires_scaling() {
                &test_scaled
            } else {
                &test_x
            };
            let scores: Vec<f64> = eval_x.iter().map(|row| model.predict_proba(row)).collect();
            let report = ClassificationReport::evaluate(&scores, &test_y);
            tracing::info!(
                family = %family,
                auc = report.auc,
                accuracy = report.accuracy,
                f1 = report.f1,
                "model evaluated"
            );

            // first strictly greater AUC wins; ties keep the earlier family
            if best.map_or(true, |(_, auc)| report.auc > auc) {
                best = Some((family, report.auc));
            }
            reports.insert(family, report);
            models.push(model);
        }

        let (best_family, best_score) = best.ok_or_else(|| Error::Other("no model trained".to_string()))?;
        tracing::info!(best = %best_family, auc = best_score, "selected best model");

        let observed: Vec<TrainingSample> = samples
            .iter()
            .filter(|s| !s.is_synthetic())
            .cloned()
            .collect();

        Ok(ModelArtifact::new(
            models,
            scaler,
            best_family,
            best_score,
            reports,
            FeatureStatistics::from_samples(&observed),
            counts,
            seed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Label;
    use crate::features::{FeatureName, FeatureVector};

    fn sample(rapor: f64, admitted: bool) -> TrainingSample {
        let features = FeatureVector::zeros()
            .with(FeatureName::RaporAvg, rapor)
            .with(FeatureName::CoreAvg, rapor)
            .with(FeatureName::ProgramMatch, 1.0);
        let label = if admitted {
            Label::Admitted
        } else {
            Label::NotAdmitted
        };
        TrainingSample::labeled(features, label)
    }

    fn separable() -> Vec<TrainingSample> {
        (0..40)
            .map(|i| sample(80.0 + f64::from(i % 20), true))
            .chain((0..20).map(|i| sample(60.0 + f64::from(i % 15), false)))
            .collect()
    }

    fn fast_config() -> TrainingConfig {
        TrainingConfig::builder()
            .n_estimators(10)
            .forest(ForestConfig {
                n_estimators: 10,
                max_depth: 4,
                ..ForestConfig::default()
            })
            .build()
    }

    #[test]
    fn test_builder_defaults() {
        let config = TrainingConfig::builder().build();
        assert_eq!(config, TrainingConfig::default());
        assert!((config.test_fraction - 0.2).abs() < f64::EPSILON);
        assert_eq!(config.forest.n_estimators, 100);
        assert_eq!(config.forest.max_depth, 10);
        assert_eq!(config.boosting.max_depth, 6);
        assert_eq!(config.logistic.max_iter, 1000);
    }

    #[test]
    fn test_empty_samples_rejected() {
        let trainer = Trainer::new(fast_config());
        assert!(matches!(
            trainer.train_seeded(&[], 42),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_single_class_rejected() {
        let trainer = Trainer::new(fast_config());
        let samples: Vec<_> = (0..10).map(|i| sample(80.0 + f64::from(i), true)).collect();
        assert!(matches!(
            trainer.train_seeded(&samples, 42),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_trains_all_families() {
        let trainer = Trainer::new(fast_config());
        let artifact = trainer.train_seeded(&separable(), 42).unwrap();

        assert!(artifact.validate().is_ok());
        assert_eq!(artifact.models().len(), 3);
        assert_eq!(artifact.reports().len(), 3);
        assert_eq!(artifact.seed(), Some(42));
        // separable on rapor_avg, so every family ranks perfectly
        assert!((artifact.best_score() - 1.0).abs() < 1e-12);
        assert_eq!(artifact.best_family(), ModelFamily::RandomForest);

        let counts = artifact.samples();
        assert_eq!(counts.train + counts.test, 60);
        assert_eq!(counts.test, 8 + 4);
    }

    #[test]
    fn test_best_is_max_auc() {
        let trainer = Trainer::new(fast_config());
        let artifact = trainer.train_seeded(&separable(), 7).unwrap();
        let max = artifact
            .reports()
            .values()
            .map(|r| r.auc)
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((artifact.best_score() - max).abs() < f64::EPSILON);
        let first_with_max = ModelFamily::ORDER
            .into_iter()
            .find(|f| (artifact.reports()[f].auc - max).abs() < f64::EPSILON);
        assert_eq!(Some(artifact.best_family()), first_with_max);
    }

    #[test]
    fn test_same_seed_same_artifact() {
        let trainer = Trainer::new(fast_config());
        let a = trainer.train_seeded(&separable(), 42).unwrap();
        let b = trainer.train_seeded(&separable(), 42).unwrap();

        assert_eq!(a.best_family(), b.best_family());
        assert_eq!(a.models(), b.models());
        for family in ModelFamily::ORDER {
            assert_eq!(
                a.reports()[&family].auc.to_bits(),
                b.reports()[&family].auc.to_bits()
            );
        }
    }
}
