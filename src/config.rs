//! Engine configuration
//!
//! Defaults match the usual project layout (`data/` next to `models/`).
//! Environment variables override individual fields:
//!
//! | Variable                  | Field                                   |
//! |---------------------------|-----------------------------------------|
//! | `UNIMATCH_DATA_DIR`       | directory of training data + statistics |
//! | `UNIMATCH_MODEL_PATH`     | artifact file                           |
//! | `UNIMATCH_SEED`           | training seed                           |
//! | `UNIMATCH_NEGATIVE_RATIO` | synthetic-to-observed ratio             |
//! | `UNIMATCH_FORCE_RETRAIN`  | `1`/`true` retrains even if a model exists |

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::DEFAULT_NEGATIVE_RATIO;
use crate::store::{Compression, ModelStore};
use crate::train::TrainingConfig;
use crate::{Error, Result};

/// Processed training data file name
pub const TRAINING_DATA_FILE: &str = "processed_student_data.json";

/// Statistics document file name
pub const STATISTICS_FILE: &str = "student_statistics.json";

/// Default artifact location
pub const DEFAULT_MODEL_PATH: &str = "models/admission_model.umat";

/// Default training seed
pub const DEFAULT_SEED: u64 = 42;

/// Top-level configuration for training and serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Processed historical records (JSON array)
    pub training_data_path: PathBuf,
    /// Statistics document; computed from the records when absent
    pub statistics_path: PathBuf,
    /// Artifact file
    pub model_path: PathBuf,
    /// Artifact codec
    pub compression: Compression,
    /// Synthetic-to-observed ratio
    pub negative_ratio: f64,
    /// Seed for synthesis, splitting and bagging
    pub seed: u64,
    /// Retrain even when a usable artifact exists
    pub force_retrain: bool,
    /// Model hyperparameters and held-out fraction
    pub training: TrainingConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::with_data_dir("data")
    }
}

impl EngineConfig {
    /// Defaults with training data and statistics under `dir`
    #[must_use]
    pub fn with_data_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            training_data_path: dir.join(TRAINING_DATA_FILE),
            statistics_path: dir.join(STATISTICS_FILE),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            compression: Compression::default(),
            negative_ratio: DEFAULT_NEGATIVE_RATIO,
            seed: DEFAULT_SEED,
            force_retrain: false,
            training: TrainingConfig::default(),
        }
    }

    /// Defaults overridden by `UNIMATCH_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Self::from_env`] with an arbitrary variable source
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = lookup("UNIMATCH_DATA_DIR").map_or_else(Self::default, Self::with_data_dir);

        if let Some(path) = lookup("UNIMATCH_MODEL_PATH") {
            config.model_path = PathBuf::from(path);
        }
        if let Some(seed) = parsed(&lookup, "UNIMATCH_SEED") {
            config.seed = seed;
        }
        if let Some(ratio) = parsed(&lookup, "UNIMATCH_NEGATIVE_RATIO") {
            config.negative_ratio = ratio;
        }
        if let Some(flag) = lookup("UNIMATCH_FORCE_RETRAIN") {
            config.force_retrain = matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        config
    }

    /// Read a JSON configuration file; missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns IO/JSON errors, or [`Error::InvalidInput`] if the values fail
    /// [`Self::validate`].
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] for a negative or non-finite ratio or
    /// a test fraction outside `[0, 1)`.
    pub fn validate(&self) -> Result<()> {
        if !self.negative_ratio.is_finite() || self.negative_ratio < 0.0 {
            return Err(Error::InvalidInput(format!(
                "negative_ratio must be a non-negative number, got {}",
                self.negative_ratio
            )));
        }
        if !(0.0..1.0).contains(&self.training.test_fraction) {
            return Err(Error::InvalidInput(format!(
                "test_fraction must be in [0, 1), got {}",
                self.training.test_fraction
            )));
        }
        Ok(())
    }

    /// Store for the configured artifact path and codec
    #[must_use]
    pub fn store(&self) -> ModelStore {
        ModelStore::new(&self.model_path).with_compression(self.compression)
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable environment override");
            None
        }
    }
}
