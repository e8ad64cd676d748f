//! Training data: samples, negative synthesis, loading and statistics
//!
//! ## Overview
//!
//! ```text
//! processed_student_data.json ──> ObservedRecord ──> TrainingSample (observed, label 1)
//!                                                          │
//!                                                          └──> synthesize() ──> TrainingSample (synthetic, label 0)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use unimatch::dataset::{synthesize, TrainingSample};
//! use unimatch::features::{FeatureName, FeatureVector};
//!
//! let observed: Vec<_> = (0..100)
//!     .map(|_| TrainingSample::observed(FeatureVector::zeros().with(FeatureName::RaporAvg, 85.0)))
//!     .collect();
//!
//! let mut rng = StdRng::seed_from_u64(42);
//! let negatives = synthesize(&observed, 0.3, &mut rng);
//! assert_eq!(negatives.len(), 30);
//! ```

mod loader;
mod sample;
mod stats;
mod synth;

pub use loader::{
    build_observed_record, category_compatibility, load_training_records,
    write_training_records, ObservedRecord,
};
pub use sample::{Label, Provenance, TrainingSample};
pub use stats::{Distributions, FeatureStatistics, FeatureSummary};
pub use synth::{
    synthesize, synthetic_count, DEFAULT_NEGATIVE_RATIO, DEGRADATION_RANGE, GRADE_FLOOR,
    MISMATCH_PROBABILITY,
};
