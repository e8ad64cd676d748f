//! Trained model artifact
//!
//! One artifact carries every fitted family, the scaler, the frozen feature
//! schema and the evaluation that picked the best family. It is immutable
//! once built; retraining produces a new one.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::FeatureStatistics;
use crate::features::{FeatureName, FeatureVector};
use crate::model::{ClassificationReport, Classifier, ModelFamily, StandardScaler, TrainedModel};
use crate::{Error, Result};

/// Artifact layout version understood by this build
pub const ARTIFACT_SCHEMA_VERSION: u32 = 1;

/// Sample counts behind a training run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleCounts {
    /// Admitted (observed) samples
    pub observed: usize,
    /// Synthesized rejected samples
    pub synthetic: usize,
    /// Samples used for fitting
    pub train: usize,
    /// Held-out samples used for selection
    pub test: usize,
}

/// Everything inference needs, plus how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    schema_version: u32,
    feature_names: Vec<String>,
    models: Vec<TrainedModel>,
    scaler: StandardScaler,
    best_family: ModelFamily,
    best_score: f64,
    reports: BTreeMap<ModelFamily, ClassificationReport>,
    statistics: FeatureStatistics,
    samples: SampleCounts,
    trained_at: DateTime<Utc>,
    seed: Option<u64>,
}

impl ModelArtifact {
    /// Assemble an artifact for the current feature schema.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        models: Vec<TrainedModel>,
        scaler: StandardScaler,
        best_family: ModelFamily,
        best_score: f64,
        reports: BTreeMap<ModelFamily, ClassificationReport>,
        statistics: FeatureStatistics,
        samples: SampleCounts,
        seed: Option<u64>,
    ) -> Self {
        Self {
            schema_version: ARTIFACT_SCHEMA_VERSION,
            feature_names: FeatureName::schema(),
            models,
            scaler,
            best_family,
            best_score,
            reports,
            statistics,
            samples,
            trained_at: Utc::now(),
            seed,
        }
    }

    /// Replace the statistics snapshot (e.g. with the prepared document)
    #[must_use]
    pub fn with_statistics(mut self, statistics: FeatureStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// Record the seed the run was derived from
    #[must_use]
    pub(crate) const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check that this build can serve the artifact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaMismatch`] for a foreign schema version or
    /// feature list, and [`Error::ArtifactCorrupt`] when the parts disagree
    /// with each other.
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != ARTIFACT_SCHEMA_VERSION {
            return Err(Error::SchemaMismatch {
                expected: format!("schema version {ARTIFACT_SCHEMA_VERSION}"),
                found: format!("schema version {}", self.schema_version),
            });
        }
        let schema = FeatureName::schema();
        if self.feature_names != schema {
            return Err(Error::SchemaMismatch {
                expected: schema.join(","),
                found: self.feature_names.join(","),
            });
        }
        if self.scaler.dimension() != self.feature_names.len() {
            return Err(Error::ArtifactCorrupt(format!(
                "scaler has {} columns, schema has {}",
                self.scaler.dimension(),
                self.feature_names.len()
            )));
        }
        for model in &self.models {
            model.validate(self.feature_names.len())?;
        }
        if self.model(self.best_family).is_none() {
            return Err(Error::ArtifactCorrupt(format!(
                "best family {} missing from artifact",
                self.best_family
            )));
        }
        if !self.best_score.is_finite() {
            return Err(Error::ArtifactCorrupt("best score is not finite".to_string()));
        }
        Ok(())
    }

    /// Positive-class probability from the best family
    #[must_use]
    pub fn predict_proba(&self, features: &FeatureVector) -> Option<f64> {
        self.predict_with(self.best_family, features)
    }

    /// Positive-class probability from a specific family.
    ///
    /// The vector is projected onto the frozen feature order and scaled
    /// when the family expects standardized input.
    #[must_use]
    pub fn predict_with(&self, family: ModelFamily, features: &FeatureVector) -> Option<f64> {
        let model = self.model(family)?;
        let row = features.to_ordered(&self.feature_names);
        let row = if family.requires_scaling() {
            self.scaler.transform(&row)
        } else {
            row
        };
        Some(model.predict_proba(&row))
    }

    /// Importance ranking for `family`, descending; empty for families
    /// without importances
    #[must_use]
    pub fn feature_importance(&self, family: ModelFamily) -> Vec<(String, f64)> {
        let Some(importances) = self.model(family).and_then(|m| m.feature_importances()) else {
            return Vec::new();
        };
        let mut ranked: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(importances)
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    /// Fitted model of `family`
    #[must_use]
    pub fn model(&self, family: ModelFamily) -> Option<&TrainedModel> {
        self.models.iter().find(|m| m.family() == family)
    }

    /// All fitted models in training order
    #[must_use]
    pub fn models(&self) -> &[TrainedModel] {
        &self.models
    }

    /// Layout version
    #[must_use]
    pub const fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Frozen feature order
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Scaler fitted on the training split
    #[must_use]
    pub const fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    /// Family selected by held-out AUC
    #[must_use]
    pub const fn best_family(&self) -> ModelFamily {
        self.best_family
    }

    /// Held-out AUC of the best family
    #[must_use]
    pub const fn best_score(&self) -> f64 {
        self.best_score
    }

    /// Held-out evaluation per family
    #[must_use]
    pub const fn reports(&self) -> &BTreeMap<ModelFamily, ClassificationReport> {
        &self.reports
    }

    /// Feature summary snapshot
    #[must_use]
    pub const fn statistics(&self) -> &FeatureStatistics {
        &self.statistics
    }

    /// Sample counts
    #[must_use]
    pub const fn samples(&self) -> SampleCounts {
        self.samples
    }

    /// Training timestamp
    #[must_use]
    pub const fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Seed the training RNG was built from, when known
    #[must_use]
    pub const fn seed(&self) -> Option<u64> {
        self.seed
    }

    #[cfg(test)]
    pub(crate) fn set_schema_version(&mut self, version: u32) {
        self.schema_version = version;
    }

    #[cfg(test)]
    pub(crate) fn set_feature_names(&mut self, names: Vec<String>) {
        self.feature_names = names;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{LogisticConfig, LogisticModel};

    /// Small hand-built artifact: logistic regression on `rapor_avg` only
    pub(crate) fn logistic_artifact() -> ModelArtifact {
        let rapor = FeatureName::RaporAvg.index();
        let rows: Vec<Vec<f64>> = (0..20)
            .map(|i| {
                let mut row = vec![0.0; FeatureName::COUNT];
                row[rapor] = 60.0 + 2.0 * f64::from(i);
                row
            })
            .collect();
        let labels: Vec<bool> = (0..20).map(|i| i >= 10).collect();
        let scaler = StandardScaler::fit(&rows);
        let model = LogisticModel::fit(&scaler.transform_all(&rows), &labels, &LogisticConfig::default());

        let mut reports = BTreeMap::new();
        reports.insert(
            ModelFamily::LogisticRegression,
            ClassificationReport::evaluate(&[0.2, 0.8], &[false, true]),
        );
        ModelArtifact::new(
            vec![TrainedModel::LogisticRegression(model)],
            scaler,
            ModelFamily::LogisticRegression,
            1.0,
            reports,
            FeatureStatistics::default(),
            SampleCounts::default(),
            Some(42),
        )
    }

    #[test]
    fn test_valid_artifact_passes() {
        let artifact = logistic_artifact();
        assert!(artifact.validate().is_ok());
        assert_eq!(artifact.schema_version(), ARTIFACT_SCHEMA_VERSION);
        assert_eq!(artifact.feature_names(), FeatureName::schema().as_slice());
    }

    #[test]
    fn test_schema_version_mismatch() {
        let mut artifact = logistic_artifact();
        artifact.set_schema_version(ARTIFACT_SCHEMA_VERSION + 1);
        assert!(matches!(artifact.validate(), Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn test_feature_schema_mismatch() {
        let mut artifact = logistic_artifact();
        let mut names = FeatureName::schema();
        names.swap(0, 1);
        artifact.set_feature_names(names);
        assert!(matches!(artifact.validate(), Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn test_truncated_coefficients_rejected() {
        let mut value = serde_json::to_value(logistic_artifact()).unwrap();
        value["models"][0]["coefficients"]
            .as_array_mut()
            .unwrap()
            .truncate(3);
        let artifact: ModelArtifact = serde_json::from_value(value).unwrap();
        assert!(matches!(artifact.validate(), Err(Error::ArtifactCorrupt(_))));
    }

    #[test]
    fn test_predict_uses_scaler_for_logistic() {
        let artifact = logistic_artifact();
        let high = FeatureVector::zeros().with(FeatureName::RaporAvg, 96.0);
        let low = FeatureVector::zeros().with(FeatureName::RaporAvg, 62.0);

        let p_high = artifact.predict_proba(&high).unwrap();
        let p_low = artifact.predict_proba(&low).unwrap();
        assert!(p_high > 0.5);
        assert!(p_low < 0.5);
    }

    #[test]
    fn test_missing_family_and_importance() {
        let artifact = logistic_artifact();
        assert!(artifact.predict_with(ModelFamily::RandomForest, &FeatureVector::zeros()).is_none());
        assert!(artifact.feature_importance(ModelFamily::LogisticRegression).is_empty());
        assert!(artifact.feature_importance(ModelFamily::RandomForest).is_empty());
    }

    #[test]
    fn test_serde_round_trip() {
        let artifact = logistic_artifact();
        let json = serde_json::to_string(&artifact).unwrap();
        let back: ModelArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
    }
}
