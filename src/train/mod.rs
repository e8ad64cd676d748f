//! Model training and selection
//!
//! ```text
//! samples ──shuffle──> stratified split (80/20 per class)
//!                          │
//!          train ──> StandardScaler::fit ──┐
//!                                          ▼
//!   RandomForest ─┐   GradientBoosting ─┐   LogisticRegression (scaled)
//!                 ▼                     ▼         ▼
//!              held-out ROC AUC for each family
//!                          │
//!          first strictly greater AUC wins ──> ModelArtifact
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use unimatch::dataset::{Label, TrainingSample};
//! use unimatch::features::{FeatureName, FeatureVector};
//! use unimatch::train::{Trainer, TrainingConfig};
//!
//! let samples: Vec<_> = (0..40)
//!     .map(|i| {
//!         let rapor = 60.0 + f64::from(i);
//!         let label = if i >= 15 { Label::Admitted } else { Label::NotAdmitted };
//!         TrainingSample::labeled(FeatureVector::zeros().with(FeatureName::RaporAvg, rapor), label)
//!     })
//!     .collect();
//!
//! let trainer = Trainer::new(TrainingConfig::builder().n_estimators(10).build());
//! let artifact = trainer.train_seeded(&samples, 42)?;
//! assert_eq!(artifact.models().len(), 3);
//! # Ok::<(), unimatch::Error>(())
//! ```

mod split;
mod trainer;

pub use split::{held_out_count, stratified_split, Split};
pub use trainer::{Trainer, TrainingConfig, TrainingConfigBuilder, DEFAULT_TEST_FRACTION};
