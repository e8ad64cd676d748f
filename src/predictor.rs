//! Admission probability service
//!
//! The service owns at most one loaded artifact. Until one loads, every
//! call checks the store again, so a model saved after the service started
//! is picked up on the next prediction. Once loaded it is shared read-only
//! by every caller. A missing or unusable artifact degrades to a
//! closed-form heuristic, so prediction never fails.
//!
//! ## Example
//!
//! ```rust
//! use unimatch::features::FeatureMap;
//! use unimatch::predictor::{PredictionSource, PredictorService};
//!
//! let service = PredictorService::heuristic_only();
//! let features: FeatureMap = [
//!     ("rapor_avg".to_string(), 90.0),
//!     ("core_avg".to_string(), 90.0),
//!     ("program_match".to_string(), 1.0),
//! ]
//! .into_iter()
//! .collect();
//!
//! let result = service.predict(&features);
//! assert_eq!(result.source, PredictionSource::Heuristic);
//! assert!((result.probability - 0.8176).abs() < 1e-3);
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::artifact::ModelArtifact;
use crate::features::{prepare_prediction_features, FeatureMap, FeatureName, FeatureVector, PredictionRequest};
use crate::model::{sigmoid, ModelFamily};
use crate::store::ModelStore;

/// Grade assumed when `rapor_avg` is absent
pub const HEURISTIC_DEFAULT_GRADE: f64 = 75.0;

/// Score at which the heuristic gives even odds
pub const HEURISTIC_MIDPOINT: f64 = 75.0;

/// Logistic slope of the heuristic
pub const HEURISTIC_SLOPE: f64 = 0.1;

/// Score multiplier for a track/major mismatch
pub const MISMATCH_PENALTY: f64 = 0.8;

/// Coarse probability band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionLabel {
    /// `p < 0.4`
    Low,
    /// `0.4 <= p < 0.7`
    Medium,
    /// `p >= 0.7`
    High,
}

impl PredictionLabel {
    /// Band for a probability
    #[must_use]
    pub fn from_probability(p: f64) -> Self {
        if p >= 0.7 {
            Self::High
        } else if p >= 0.4 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Label text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for PredictionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What produced a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "family", rename_all = "snake_case")]
pub enum PredictionSource {
    /// A trained model of this family
    Model(ModelFamily),
    /// The closed-form fallback
    Heuristic,
}

/// Probability with its band, source and (for tree models) the ranking
/// of the features behind it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    /// Admission probability in `[0, 1]`
    pub probability: f64,
    /// Probability band
    pub label: PredictionLabel,
    /// Model family or heuristic
    pub source: PredictionSource,
    /// Feature importance ranking, descending
    pub importance: Option<Vec<(String, f64)>>,
}

/// Closed-form fallback estimate.
///
/// `score = clamp((rapor_avg + core_avg) / 2, 0, 100)`, scaled by 0.8 when
/// `program_match` is 0, mapped through `1 / (1 + e^(-0.1 (score - 75)))`.
/// `rapor_avg` defaults to 75, `core_avg` to `rapor_avg` and
/// `program_match` to 1. Non-finite entries count as missing.
#[must_use]
pub fn heuristic_probability(features: &FeatureMap) -> f64 {
    let value = |feature: FeatureName| {
        features
            .get(feature.as_str())
            .copied()
            .filter(|v| v.is_finite())
    };
    let rapor = value(FeatureName::RaporAvg).unwrap_or(HEURISTIC_DEFAULT_GRADE);
    let core = value(FeatureName::CoreAvg).unwrap_or(rapor);
    let program_match = value(FeatureName::ProgramMatch).unwrap_or(1.0);

    let mut score = ((rapor + core) / 2.0).clamp(0.0, 100.0);
    if program_match == 0.0 {
        score *= MISMATCH_PENALTY;
    }
    sigmoid(HEURISTIC_SLOPE * (score - HEURISTIC_MIDPOINT))
}

/// Prediction service with lazy artifact loading.
///
/// `Send + Sync`: share it behind an `Arc` or a static and call it from any
/// thread. A first model saved to the store is picked up automatically;
/// replacing a loaded model means calling [`PredictorService::reload`] (or
/// building a new service).
#[derive(Debug)]
pub struct PredictorService {
    store: Option<ModelStore>,
    artifact: OnceLock<ModelArtifact>,
    warned: AtomicBool,
}

impl PredictorService {
    /// Service backed by `store`; the store is read when a prediction first needs it
    #[must_use]
    pub const fn new(store: ModelStore) -> Self {
        Self {
            store: Some(store),
            artifact: OnceLock::new(),
            warned: AtomicBool::new(false),
        }
    }

    /// Service that only ever uses the heuristic
    #[must_use]
    pub const fn heuristic_only() -> Self {
        Self {
            store: None,
            artifact: OnceLock::new(),
            warned: AtomicBool::new(false),
        }
    }

    /// Service serving an in-memory artifact
    #[must_use]
    pub fn with_artifact(artifact: ModelArtifact) -> Self {
        Self {
            store: None,
            artifact: OnceLock::from(artifact),
            warned: AtomicBool::new(false),
        }
    }

    /// Loaded artifact.
    ///
    /// Only a successful load is cached; while none is available each call
    /// checks the store again.
    #[must_use]
    pub fn artifact(&self) -> Option<&ModelArtifact> {
        if let Some(artifact) = self.artifact.get() {
            return Some(artifact);
        }
        let loaded = self
            .store
            .as_ref()
            .filter(|store| store.exists())
            .and_then(ModelStore::load);
        match loaded {
            // a concurrent caller may have won the race; either copy is fine
            Some(artifact) => Some(self.artifact.get_or_init(|| artifact)),
            None => {
                if !self.warned.swap(true, Ordering::Relaxed) {
                    tracing::warn!("no trained model available, using heuristic predictions");
                }
                None
            }
        }
    }

    /// Whether predictions come from a trained model
    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.artifact().is_some()
    }

    /// Drop the cached artifact so the next call re-reads the store.
    ///
    /// Needed only to replace a model that is already loaded. Services
    /// without a store keep what they were built with. Returns whether a
    /// model is available afterwards.
    pub fn reload(&mut self) -> bool {
        if self.store.is_some() {
            self.artifact = OnceLock::new();
            *self.warned.get_mut() = false;
        }
        self.is_trained()
    }

    /// Admission probability in `[0, 1]`. Never fails.
    ///
    /// Uses the best trained family when available; otherwise, or if the
    /// model yields a non-finite value, the heuristic.
    #[must_use]
    pub fn predict_probability(&self, features: &FeatureMap) -> f64 {
        self.score(features).0
    }

    /// Probability with band, source and importance ranking
    #[must_use]
    pub fn predict(&self, features: &FeatureMap) -> PredictionResult {
        let (probability, source) = self.score(features);
        let importance = match source {
            PredictionSource::Model(family) => {
                Some(self.feature_importance(Some(family))).filter(|r| !r.is_empty())
            }
            PredictionSource::Heuristic => None,
        };
        PredictionResult {
            probability,
            label: PredictionLabel::from_probability(probability),
            source,
            importance,
        }
    }

    /// Predict for an upstream request shape
    #[must_use]
    pub fn predict_request(&self, request: &PredictionRequest) -> PredictionResult {
        self.predict(&prepare_prediction_features(request).to_map())
    }

    /// Importance ranking for `family` (the best family when `None`).
    ///
    /// Empty without a trained model or for logistic regression.
    #[must_use]
    pub fn feature_importance(&self, family: Option<ModelFamily>) -> Vec<(String, f64)> {
        self.artifact().map_or_else(Vec::new, |artifact| {
            artifact.feature_importance(family.unwrap_or_else(|| artifact.best_family()))
        })
    }

    fn score(&self, features: &FeatureMap) -> (f64, PredictionSource) {
        if let Some(artifact) = self.artifact() {
            let family = artifact.best_family();
            match artifact.predict_proba(&FeatureVector::from_map(features)) {
                Some(p) if p.is_finite() => {
                    return (p.clamp(0.0, 1.0), PredictionSource::Model(family));
                }
                other => {
                    tracing::warn!(family = %family, value = ?other, "model produced no usable probability, using heuristic");
                }
            }
        }
        (
            heuristic_probability(features).clamp(0.0, 1.0),
            PredictionSource::Heuristic,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::tests::logistic_artifact;
    use crate::features::Track;
    use tempfile::TempDir;

    fn map(entries: &[(&str, f64)]) -> FeatureMap {
        entries.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn test_heuristic_strong_student() {
        let p = heuristic_probability(&map(&[
            ("rapor_avg", 90.0),
            ("core_avg", 90.0),
            ("program_match", 1.0),
        ]));
        assert!((p - 0.817_574).abs() < 1e-5);
    }

    #[test]
    fn test_heuristic_mismatch_penalty() {
        let p = heuristic_probability(&map(&[
            ("rapor_avg", 70.0),
            ("core_avg", 70.0),
            ("program_match", 0.0),
        ]));
        // score 56
        assert!((p - 0.130_108).abs() < 1e-5);
    }

    #[test]
    fn test_heuristic_defaults() {
        assert!((heuristic_probability(&FeatureMap::new()) - 0.5).abs() < 1e-12);
        // core_avg follows rapor_avg
        let p = heuristic_probability(&map(&[("rapor_avg", 85.0)]));
        assert!((p - sigmoid(1.0)).abs() < 1e-12);
        // NaN counts as missing
        let p = heuristic_probability(&map(&[("rapor_avg", f64::NAN)]));
        assert!((p - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_heuristic_clamps_score() {
        let high = heuristic_probability(&map(&[("rapor_avg", 500.0), ("core_avg", 500.0)]));
        assert!((high - sigmoid(2.5)).abs() < 1e-12);
        let low = heuristic_probability(&map(&[("rapor_avg", -50.0), ("core_avg", -50.0)]));
        assert!((low - sigmoid(-7.5)).abs() < 1e-12);
    }

    #[test]
    fn test_labels() {
        assert_eq!(PredictionLabel::from_probability(0.7), PredictionLabel::High);
        assert_eq!(PredictionLabel::from_probability(0.69), PredictionLabel::Medium);
        assert_eq!(PredictionLabel::from_probability(0.4), PredictionLabel::Medium);
        assert_eq!(PredictionLabel::from_probability(0.39), PredictionLabel::Low);
    }

    #[test]
    fn test_heuristic_only_service() {
        let service = PredictorService::heuristic_only();
        assert!(!service.is_trained());
        let result = service.predict(&map(&[("rapor_avg", 90.0), ("core_avg", 90.0)]));
        assert_eq!(result.source, PredictionSource::Heuristic);
        assert_eq!(result.label, PredictionLabel::High);
        assert!(result.importance.is_none());
        assert!(service.feature_importance(None).is_empty());
    }

    #[test]
    fn test_model_service_uses_artifact() {
        let artifact = logistic_artifact();
        let features = map(&[("rapor_avg", 96.0)]);
        let expected = artifact
            .predict_proba(&FeatureVector::from_map(&features))
            .unwrap();

        let service = PredictorService::with_artifact(artifact);
        assert!(service.is_trained());
        let result = service.predict(&features);
        assert_eq!(result.source, PredictionSource::Model(ModelFamily::LogisticRegression));
        assert_eq!(result.probability.to_bits(), expected.to_bits());
        // logistic regression has no importances
        assert!(result.importance.is_none());
    }

    #[test]
    fn test_store_backed_service_picks_up_first_model() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("model.umat"));
        let service = PredictorService::new(store.clone());
        assert!(!service.is_trained());
        assert_eq!(
            service.predict(&FeatureMap::new()).source,
            PredictionSource::Heuristic
        );

        // absence is not cached
        store.save(&logistic_artifact()).unwrap();
        assert!(service.is_trained());
        assert_eq!(
            service.predict(&FeatureMap::new()).source,
            PredictionSource::Model(ModelFamily::LogisticRegression)
        );
    }

    #[test]
    fn test_reload_replaces_loaded_model() {
        let dir = TempDir::new().unwrap();
        let store = ModelStore::new(dir.path().join("model.umat"));
        store.save(&logistic_artifact()).unwrap();
        let mut service = PredictorService::new(store.clone());
        assert_eq!(service.artifact().unwrap().seed(), Some(42));

        store.save(&logistic_artifact().with_seed(7)).unwrap();
        // loaded model stays until reload
        assert_eq!(service.artifact().unwrap().seed(), Some(42));
        assert!(service.reload());
        assert_eq!(service.artifact().unwrap().seed(), Some(7));

        std::fs::remove_file(store.path()).unwrap();
        assert!(!service.reload());
    }

    #[test]
    fn test_heuristic_only_has_nothing_to_load() {
        let mut service = PredictorService::heuristic_only();
        assert!(!service.reload());
        assert!(service.artifact().is_none());
    }

    #[test]
    fn test_predict_request() {
        let mut request = PredictionRequest::new(Track::Science);
        request.s1 = Some(90.0);
        request.s2 = Some(90.0);
        request.target_major = Some("TEKNIK INFORMATIKA".to_string());

        let service = PredictorService::heuristic_only();
        let result = service.predict_request(&request);
        assert!(result.probability > 0.5);
        assert!((0.0..=1.0).contains(&result.probability));
    }

    #[test]
    fn test_service_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PredictorService>();
    }
}
