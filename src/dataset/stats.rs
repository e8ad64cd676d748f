//! Feature summary statistics
//!
//! Read for inspection and snapshotted into artifacts; prediction never
//! depends on them.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{ObservedRecord, TrainingSample};
use crate::features::FeatureName;
use crate::Result;

/// Summary of one numeric feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSummary {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    /// Minimum
    pub min: f64,
    /// Maximum
    pub max: f64,
    /// Median
    pub median: f64,
    /// Number of finite observations
    pub count: usize,
}

impl FeatureSummary {
    /// Summarize finite values; `None` if there are none
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let mean = sorted.iter().sum::<f64>() / n as f64;
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        let median = if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        };

        Some(Self {
            mean,
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[n - 1],
            median,
            count: n,
        })
    }
}

/// Categorical distributions of the admitted population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distributions {
    /// Students per university
    pub universities: BTreeMap<String, usize>,
    /// Students per major
    pub majors: BTreeMap<String, usize>,
    /// Students per competitiveness category
    pub categories: BTreeMap<String, usize>,
    /// Total students
    pub total_students: usize,
}

/// Statistics document: per-feature summaries plus distributions.
///
/// Serialized flat, one key per feature next to a `distributions` key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureStatistics {
    /// Categorical distributions
    #[serde(default)]
    pub distributions: Distributions,
    /// Per-feature summaries keyed by wire name
    #[serde(flatten)]
    pub features: BTreeMap<String, FeatureSummary>,
}

impl FeatureStatistics {
    /// Compute statistics from processed records
    #[must_use]
    pub fn compute(records: &[ObservedRecord]) -> Self {
        let mut columns: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        let mut distributions = Distributions {
            total_students: records.len(),
            ..Distributions::default()
        };

        for record in records {
            for (name, value) in record.feature_map() {
                columns.entry(name).or_default().push(value);
            }
            let bump = |map: &mut BTreeMap<String, usize>, key: &Option<String>| {
                let key = key.clone().unwrap_or_else(|| "UNKNOWN".to_string());
                *map.entry(key).or_default() += 1;
            };
            bump(&mut distributions.universities, &record.university);
            bump(&mut distributions.majors, &record.major);
            bump(&mut distributions.categories, &record.category);
        }

        Self {
            distributions,
            features: summarize(columns),
        }
    }

    /// Feature summaries from training samples (no distributions)
    #[must_use]
    pub fn from_samples(samples: &[TrainingSample]) -> Self {
        let columns = FeatureName::ALL
            .iter()
            .map(|f| {
                let values = samples.iter().map(|s| s.features().get(*f)).collect();
                (f.as_str().to_string(), values)
            })
            .collect();
        Self {
            distributions: Distributions {
                total_students: samples.len(),
                ..Distributions::default()
            },
            features: summarize(columns),
        }
    }

    /// Summary for one feature
    #[must_use]
    pub fn feature(&self, feature: FeatureName) -> Option<&FeatureSummary> {
        self.features.get(feature.as_str())
    }

    /// Read a statistics document.
    ///
    /// # Errors
    ///
    /// Returns IO/JSON errors.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write a statistics document (pretty JSON).
    ///
    /// # Errors
    ///
    /// Returns IO/JSON errors.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

fn summarize(columns: BTreeMap<String, Vec<f64>>) -> BTreeMap<String, FeatureSummary> {
    columns
        .into_iter()
        .filter_map(|(name, values)| FeatureSummary::from_values(&values).map(|s| (name, s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    #[test]
    fn test_summary_odd_and_even() {
        let odd = FeatureSummary::from_values(&[3.0, 1.0, 2.0]).unwrap();
        assert!((odd.median - 2.0).abs() < f64::EPSILON);
        assert!((odd.mean - 2.0).abs() < f64::EPSILON);
        assert_eq!(odd.count, 3);

        let even = FeatureSummary::from_values(&[4.0, 1.0, 2.0, 3.0]).unwrap();
        assert!((even.median - 2.5).abs() < f64::EPSILON);
        assert!((even.std - 1.25f64.sqrt()).abs() < 1e-12);
        assert!((even.min - 1.0).abs() < f64::EPSILON);
        assert!((even.max - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_summary_skips_non_finite() {
        assert!(FeatureSummary::from_values(&[f64::NAN]).is_none());
        let s = FeatureSummary::from_values(&[f64::NAN, 5.0]).unwrap();
        assert_eq!(s.count, 1);
    }

    #[test]
    fn test_compute_distributions() {
        let records: Vec<ObservedRecord> = serde_json::from_str(
            r#"[
                {"university": "UI", "major": "HUKUM", "category": "SOSUM", "features": {"rapor_avg": 80}},
                {"university": "UI", "major": "TEKNIK", "category": "SCIENTECH", "features": {"rapor_avg": 90}},
                {"university": "ITB", "major": "TEKNIK", "features": {"rapor_avg": 85}}
            ]"#,
        )
        .unwrap();
        let stats = FeatureStatistics::compute(&records);

        assert_eq!(stats.distributions.total_students, 3);
        assert_eq!(stats.distributions.universities["UI"], 2);
        assert_eq!(stats.distributions.majors["TEKNIK"], 2);
        assert_eq!(stats.distributions.categories["UNKNOWN"], 1);
        let rapor = stats.feature(FeatureName::RaporAvg).unwrap();
        assert!((rapor.mean - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_document_round_trip() {
        let samples = vec![
            TrainingSample::observed(FeatureVector::zeros().with(FeatureName::RaporAvg, 80.0)),
            TrainingSample::observed(FeatureVector::zeros().with(FeatureName::RaporAvg, 90.0)),
        ];
        let stats = FeatureStatistics::from_samples(&samples);
        let json = serde_json::to_value(&stats).unwrap();
        assert!(json.get("rapor_avg").is_some());
        assert!(json.get("distributions").is_some());

        let back: FeatureStatistics = serde_json::from_value(json).unwrap();
        assert_eq!(back, stats);
    }
}
