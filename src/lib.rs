//! # Unimatch: Admission Probability Engine
//!
//! **Version**: 0.1.0
//!
//! Unimatch estimates the probability that a prospective student is admitted
//! to a target study program. Historical data only contains admitted
//! students, so the engine manufactures a rejected class, trains three
//! classifier families, keeps the best by held-out ROC AUC and serves
//! predictions with a deterministic heuristic fallback.
//!
//! ```text
//! StudentRecord ──vectorize──> FeatureVector
//!                                  │
//!        training ─────────────────┼──────────────────── inference
//!   synthesize ─> Trainer ─> ModelStore ─> PredictorService ─> probability
//!
//! RuleScorer (independent): requirements + grades ─> probability + category
//! ```
//!
//! ## Design Principles
//!
//! - **Total inference**: `predict_probability` never fails; no model means heuristic
//! - **Frozen schema**: feature order is fixed by [`features::FeatureName`]
//! - **Reproducible training**: every random choice flows from one seeded RNG
//! - **Self-describing artifacts**: tagged models plus an explicit schema version
//!
//! ## Example Usage
//!
//! ```rust
//! use unimatch::predictor::PredictorService;
//! use unimatch::rules::{ProgramRequirements, RuleScorer, StudentGrades};
//!
//! // No trained model yet: the service falls back to the heuristic
//! let service = PredictorService::heuristic_only();
//! let p = service.predict_probability(&Default::default());
//! assert!((p - 0.5).abs() < 1e-12);
//!
//! // Training-free scoring
//! let program = ProgramRequirements::new("Universitas Indonesia", "Ilmu Hukum").required_average(85.0);
//! let score = RuleScorer::default().score(&program, &StudentGrades::with_average(88.0));
//! assert!(score.probability > 0.5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod artifact;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod predictor;
pub mod rules;
pub mod store;
pub mod train;

pub use artifact::{ModelArtifact, ARTIFACT_SCHEMA_VERSION};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use features::{vectorize, FeatureMap, FeatureName, FeatureVector, StudentRecord, Track};
pub use model::ModelFamily;
pub use pipeline::{train_from_files, train_if_needed};
pub use predictor::{PredictionLabel, PredictionResult, PredictionSource, PredictorService};
pub use rules::{AdmissionCategory, ProgramRequirements, RuleScore, RuleScorer, StudentGrades};
pub use store::ModelStore;
pub use train::{Trainer, TrainingConfig};
