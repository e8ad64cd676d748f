//! Negative sample synthesis
//!
//! Source data holds only admitted students. A "not admitted" class is
//! manufactured by degrading a random admitted template: lower grades, and
//! sometimes a track/major mismatch.

use rand::Rng;

use super::TrainingSample;
use crate::features::FeatureName;

/// Default synthetic-to-observed ratio
pub const DEFAULT_NEGATIVE_RATIO: f64 = 0.3;

/// Degradation range in grade points (inclusive)
pub const DEGRADATION_RANGE: (f64, f64) = (5.0, 15.0);

/// Degraded grades never drop below this floor
pub const GRADE_FLOOR: f64 = 60.0;

/// Chance of forcing `program_match` to 0
pub const MISMATCH_PROBABILITY: f64 = 0.4;

/// Number of synthetic samples produced for `observed` templates at `ratio`
#[must_use]
pub fn synthetic_count(observed: usize, ratio: f64) -> usize {
    if !ratio.is_finite() || ratio <= 0.0 {
        return 0;
    }
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let count = (ratio * observed as f64).floor() as usize;
    count
}

/// Synthesize `floor(ratio × |observed|)` rejected samples.
///
/// Templates are drawn uniformly with replacement from `observed`. The
/// caller owns the random source so runs are reproducible.
pub fn synthesize<R: Rng>(
    observed: &[TrainingSample],
    ratio: f64,
    rng: &mut R,
) -> Vec<TrainingSample> {
    if observed.is_empty() {
        return Vec::new();
    }
    let count = synthetic_count(observed.len(), ratio);
    let mut synthetic = Vec::with_capacity(count);

    for _ in 0..count {
        let template = rng.gen_range(0..observed.len());
        let mut features = *observed[template].features();

        let degradation = rng.gen_range(DEGRADATION_RANGE.0..=DEGRADATION_RANGE.1);
        for feature in FeatureName::ACADEMIC_AVERAGES {
            features.set(feature, degrade(features.get(feature), degradation));
        }
        for feature in FeatureName::SUBJECT_SCORES {
            let value = features.get(feature);
            if value > 0.0 {
                features.set(feature, degrade(value, degradation));
            }
        }

        if rng.gen::<f64>() < MISMATCH_PROBABILITY {
            features.set(FeatureName::ProgramMatch, 0.0);
        }

        synthetic.push(TrainingSample::synthetic(features, template));
    }

    tracing::debug!(
        observed = observed.len(),
        synthetic = synthetic.len(),
        ratio,
        "synthesized negative samples"
    );
    synthetic
}

fn degrade(value: f64, amount: f64) -> f64 {
    (value - amount).max(GRADE_FLOOR)
}
