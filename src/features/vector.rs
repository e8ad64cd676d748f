//! Fixed-order feature schema shared by training and inference

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Loosely typed feature mapping as it arrives at the boundary.
///
/// Unknown keys are ignored and missing keys default to 0 once converted
/// into a [`FeatureVector`].
pub type FeatureMap = BTreeMap<String, f64>;

/// Canonical feature names.
///
/// Variant order is the lexicographic order of the wire names, which is
/// the column order frozen into every trained artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    /// Biology grade (science track only)
    BiologyScore,
    /// Chemistry grade (science track only)
    ChemistryScore,
    /// Average of track-independent subjects
    CoreAvg,
    /// Economics grade (social track only)
    EconomicsScore,
    /// Geography grade (social track only)
    GeographyScore,
    /// History grade (social track only)
    HistoryScore,
    /// Average of the two language grades
    LanguageScore,
    /// Mathematics grade
    MathScore,
    /// Physics grade (science track only)
    PhysicsScore,
    /// Average of the track-canonical subjects
    ProgramAvg,
    /// 1 when the track fits the target major, else 0
    ProgramMatch,
    /// One-hot: science track
    ProgramSaintek,
    /// One-hot: social track
    ProgramSoshum,
    /// Overall report-card average
    RaporAvg,
}

impl FeatureName {
    /// Number of canonical features
    pub const COUNT: usize = 14;

    /// All features in frozen (lexicographic) order
    pub const ALL: [Self; Self::COUNT] = [
        Self::BiologyScore,
        Self::ChemistryScore,
        Self::CoreAvg,
        Self::EconomicsScore,
        Self::GeographyScore,
        Self::HistoryScore,
        Self::LanguageScore,
        Self::MathScore,
        Self::PhysicsScore,
        Self::ProgramAvg,
        Self::ProgramMatch,
        Self::ProgramSaintek,
        Self::ProgramSoshum,
        Self::RaporAvg,
    ];

    /// Track-specific subject scores; zero means "not taken"
    pub const SUBJECT_SCORES: [Self; 6] = [
        Self::PhysicsScore,
        Self::ChemistryScore,
        Self::BiologyScore,
        Self::EconomicsScore,
        Self::GeographyScore,
        Self::HistoryScore,
    ];

    /// Aggregate academic scores
    pub const ACADEMIC_AVERAGES: [Self; 5] = [
        Self::RaporAvg,
        Self::CoreAvg,
        Self::ProgramAvg,
        Self::MathScore,
        Self::LanguageScore,
    ];

    /// Wire name used in feature maps and artifacts
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BiologyScore => "biology_score",
            Self::ChemistryScore => "chemistry_score",
            Self::CoreAvg => "core_avg",
            Self::EconomicsScore => "economics_score",
            Self::GeographyScore => "geography_score",
            Self::HistoryScore => "history_score",
            Self::LanguageScore => "language_score",
            Self::MathScore => "math_score",
            Self::PhysicsScore => "physics_score",
            Self::ProgramAvg => "program_avg",
            Self::ProgramMatch => "program_match",
            Self::ProgramSaintek => "program_saintek",
            Self::ProgramSoshum => "program_soshum",
            Self::RaporAvg => "rapor_avg",
        }
    }

    /// Look up a feature by wire name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_str() == name)
    }

    /// Column index in the frozen order
    #[must_use]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Whether the value is a grade bounded to [0, 100]
    #[must_use]
    pub const fn is_grade(&self) -> bool {
        !matches!(
            self,
            Self::ProgramMatch | Self::ProgramSaintek | Self::ProgramSoshum
        )
    }

    /// Wire names of [`Self::ALL`], the schema frozen into artifacts
    #[must_use]
    pub fn schema() -> Vec<String> {
        Self::ALL.iter().map(|f| f.as_str().to_string()).collect()
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strongly typed feature vector in [`FeatureName::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FeatureName::COUNT],
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self {
            values: [0.0; FeatureName::COUNT],
        }
    }
}

impl FeatureVector {
    /// All-zero vector
    #[must_use]
    pub fn zeros() -> Self {
        Self::default()
    }

    /// Build from a loosely typed map.
    ///
    /// Unknown names are ignored; missing or non-finite values become 0.
    #[must_use]
    pub fn from_map(map: &FeatureMap) -> Self {
        let mut vector = Self::zeros();
        for (name, value) in map {
            if let Some(feature) = FeatureName::from_name(name) {
                vector.set(feature, *value);
            }
        }
        vector
    }

    /// Read one feature
    #[must_use]
    pub const fn get(&self, feature: FeatureName) -> f64 {
        self.values[feature.index()]
    }

    /// Write one feature. Non-finite input is stored as 0.
    pub fn set(&mut self, feature: FeatureName, value: f64) {
        self.values[feature.index()] = if value.is_finite() { value } else { 0.0 };
    }

    /// Builder-style setter
    #[must_use]
    pub fn with(mut self, feature: FeatureName, value: f64) -> Self {
        self.set(feature, value);
        self
    }

    /// Values in frozen order
    #[must_use]
    pub const fn as_slice(&self) -> &[f64; FeatureName::COUNT] {
        &self.values
    }

    /// Convert back to a wire-named map
    #[must_use]
    pub fn to_map(&self) -> FeatureMap {
        FeatureName::ALL
            .iter()
            .map(|f| (f.as_str().to_string(), self.get(*f)))
            .collect()
    }

    /// Project onto an arbitrary ordered name list (missing names are 0)
    #[must_use]
    pub fn to_ordered(&self, names: &[String]) -> Vec<f64> {
        names
            .iter()
            .map(|name| FeatureName::from_name(name).map_or(0.0, |f| self.get(f)))
            .collect()
    }
}
