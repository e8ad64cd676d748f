//! End-to-end offline training
//!
//! ```text
//! records ──> observed samples ──┬──────────────────────────────┐
//!                                └─ synthesize(ratio) ─> negatives
//!                                                               ▼
//!                                     Trainer::train ──> ModelStore::save
//! ```
//!
//! One seeded RNG drives synthesis, splitting and bagging, so a config
//! always reproduces the same artifact.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::artifact::ModelArtifact;
use crate::config::EngineConfig;
use crate::dataset::{load_training_records, synthesize, FeatureStatistics, TrainingSample};
use crate::train::Trainer;
use crate::{Error, Result};

/// Load records, synthesize negatives, train, select and persist.
///
/// # Errors
///
/// Returns [`Error::TrainingDataMissing`] if the records file is absent,
/// [`Error::InvalidInput`] for an invalid config or an empty dataset, and
/// any IO, JSON or storage error from loading or saving.
pub fn train_from_files(config: &EngineConfig) -> Result<ModelArtifact> {
    config.validate()?;
    let records = load_training_records(&config.training_data_path)?;
    if records.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no records in {}",
            config.training_data_path.display()
        )));
    }

    let statistics = if config.statistics_path.is_file() {
        FeatureStatistics::load(&config.statistics_path).unwrap_or_else(|e| {
            tracing::warn!(
                path = %config.statistics_path.display(),
                error = %e,
                "unreadable statistics document, recomputing"
            );
            FeatureStatistics::compute(&records)
        })
    } else {
        FeatureStatistics::compute(&records)
    };

    let observed: Vec<TrainingSample> = records.iter().map(|r| r.to_sample()).collect();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let synthetic = synthesize(&observed, config.negative_ratio, &mut rng);
    tracing::info!(
        observed = observed.len(),
        synthetic = synthetic.len(),
        seed = config.seed,
        "prepared training set"
    );

    let mut samples = observed;
    samples.extend(synthetic);

    let artifact = Trainer::new(config.training)
        .train(&samples, &mut rng)?
        .with_seed(config.seed)
        .with_statistics(statistics);
    config.store().save(&artifact)?;
    Ok(artifact)
}

/// Make sure a usable model exists.
///
/// Returns `Ok(false)` when there is no training data to learn from.
/// Otherwise reuses a valid stored artifact (unless `force_retrain`) or
/// trains a new one, and returns `Ok(true)`.
///
/// # Errors
///
/// Propagates errors from [`train_from_files`].
pub fn train_if_needed(config: &EngineConfig) -> Result<bool> {
    if !config.training_data_path.is_file() {
        tracing::warn!(
            path = %config.training_data_path.display(),
            "training data not found, predictions will use the heuristic"
        );
        return Ok(false);
    }

    if !config.force_retrain {
        if let Some(existing) = config.store().load() {
            tracing::info!(
                best = %existing.best_family(),
                trained_at = %existing.trained_at(),
                "reusing stored model"
            );
            return Ok(true);
        }
    }

    train_from_files(config)?;
    Ok(true)
}
