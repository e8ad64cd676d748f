//! Historical training records on disk
//!
//! The processed dataset is a JSON array of admitted students, each with a
//! nested `features` map keyed by canonical feature names. Entries that are
//! missing or not numeric default to 0 instead of failing the load.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::TrainingSample;
use crate::features::{compatibility, vectorize_with_match, FeatureMap, FeatureVector, StudentRecord, Track};
use crate::{Error, Result};

/// Major keywords that keep a SOSUM-category program on the science track
const SOSUM_SCIENCE_KEYWORDS: &[&str] = &["TEKNIK", "INFORMATIKA", "KEDOKTERAN", "FARMASI", "BIOLOGI"];

/// One processed historical record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedRecord {
    /// Source identifier (row index or text id)
    #[serde(default)]
    pub student_id: serde_json::Value,
    /// Track label as found in the source ("IPA", "IPS", ...)
    #[serde(default)]
    pub program: Option<String>,
    /// Major the student was admitted to
    #[serde(default)]
    pub major: Option<String>,
    /// University the student was admitted to
    #[serde(default)]
    pub university: Option<String>,
    /// Competitiveness category
    #[serde(default)]
    pub category: Option<String>,
    /// Raw feature entries
    #[serde(default)]
    pub features: BTreeMap<String, serde_json::Value>,
    /// Outcome, always 1 in source data
    #[serde(default = "admitted")]
    pub target: u8,
}

const fn admitted() -> u8 {
    1
}

impl ObservedRecord {
    /// Numeric feature entries; non-numeric values are dropped
    #[must_use]
    pub fn feature_map(&self) -> FeatureMap {
        self.features
            .iter()
            .filter_map(|(name, value)| value.as_f64().map(|v| (name.clone(), v)))
            .collect()
    }

    /// Typed feature vector
    #[must_use]
    pub fn feature_vector(&self) -> FeatureVector {
        FeatureVector::from_map(&self.feature_map())
    }

    /// Convert into an observed training sample
    #[must_use]
    pub fn to_sample(&self) -> TrainingSample {
        TrainingSample::observed(self.feature_vector())
    }
}

/// Load the processed historical dataset.
///
/// # Errors
///
/// Returns [`Error::TrainingDataMissing`] if the file does not exist, and
/// IO/JSON errors if it cannot be read or parsed.
pub fn load_training_records<P: AsRef<Path>>(path: P) -> Result<Vec<ObservedRecord>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(Error::TrainingDataMissing(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path)?;
    let records: Vec<ObservedRecord> = serde_json::from_str(&raw)?;
    tracing::info!(path = %path.display(), records = records.len(), "loaded training records");
    Ok(records)
}

/// Write a processed dataset (pretty JSON).
///
/// # Errors
///
/// Returns IO/JSON errors.
pub fn write_training_records<P: AsRef<Path>>(path: P, records: &[ObservedRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(records)?)?;
    Ok(())
}

/// Compatibility used when preparing historical records.
///
/// The competitiveness category decides first; records without a known
/// category fall back to the keyword rule.
#[must_use]
pub fn category_compatibility(track: Option<Track>, major: &str, category: Option<&str>) -> bool {
    let category = category.map(|c| c.trim().to_uppercase());
    let major = major.to_uppercase();
    match category.as_deref() {
        Some("SCIENTECH") => track == Some(Track::Science),
        Some("SOSUM") => {
            if SOSUM_SCIENCE_KEYWORDS.iter().any(|k| major.contains(k)) {
                track == Some(Track::Science)
            } else {
                track == Some(Track::Social)
            }
        }
        Some("BAHASA") => track == Some(Track::Social),
        _ => compatibility(track, &major),
    }
}

/// Prepare a processed record from a raw admitted student.
#[must_use]
pub fn build_observed_record(record: &StudentRecord, student_id: usize) -> ObservedRecord {
    let program_match =
        category_compatibility(record.track(), record.target_major(), record.category());
    let vector = vectorize_with_match(record, program_match);

    ObservedRecord {
        student_id: serde_json::Value::from(student_id),
        program: record.track().map(|t| match t {
            Track::Science => "IPA".to_string(),
            Track::Social => "IPS".to_string(),
        }),
        major: Some(record.target_major().to_uppercase()),
        university: Some(record.target_university().to_uppercase()),
        category: record.category().map(str::to_uppercase),
        features: vector
            .to_map()
            .into_iter()
            .map(|(k, v)| (k, serde_json::Value::from(v)))
            .collect(),
        target: 1,
    }
}
