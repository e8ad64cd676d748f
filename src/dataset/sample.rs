//! Labeled training samples

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;

/// Binary admission outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    /// Rejected (only ever synthesized)
    NotAdmitted,
    /// Accepted (every observed record)
    Admitted,
}

impl Label {
    /// Numeric class, 1 for admitted
    #[must_use]
    pub const fn as_f64(&self) -> f64 {
        match self {
            Self::NotAdmitted => 0.0,
            Self::Admitted => 1.0,
        }
    }

    /// Whether this is the positive class
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        matches!(self, Self::Admitted)
    }
}

/// Where a sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Real historical record
    Observed,
    /// Derived from exactly one observed sample
    Synthetic {
        /// Index of the template in the observed slice
        template: usize,
    },
}

/// Feature vector with label and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    features: FeatureVector,
    label: Label,
    provenance: Provenance,
}

impl TrainingSample {
    /// Observed (admitted) sample
    #[must_use]
    pub const fn observed(features: FeatureVector) -> Self {
        Self {
            features,
            label: Label::Admitted,
            provenance: Provenance::Observed,
        }
    }

    /// Synthetic rejected sample derived from `template`
    #[must_use]
    pub const fn synthetic(features: FeatureVector, template: usize) -> Self {
        Self {
            features,
            label: Label::NotAdmitted,
            provenance: Provenance::Synthetic { template },
        }
    }

    /// Sample with an explicit label, treated as observed
    #[must_use]
    pub const fn labeled(features: FeatureVector, label: Label) -> Self {
        Self {
            features,
            label,
            provenance: Provenance::Observed,
        }
    }

    /// Feature vector
    #[must_use]
    pub const fn features(&self) -> &FeatureVector {
        &self.features
    }

    /// Label
    #[must_use]
    pub const fn label(&self) -> Label {
        self.label
    }

    /// Provenance tag
    #[must_use]
    pub const fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Whether the sample was synthesized
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        matches!(self.provenance, Provenance::Synthetic { .. })
    }
}
