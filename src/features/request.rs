//! Upstream prediction request and its mapping onto the feature schema
//!
//! Validation (grade ranges, enum values) belongs to the request boundary;
//! by the time a request reaches here every grade is assumed in range.

use serde::{Deserialize, Serialize};

use super::record::{mean, valid_grade};
use super::{FeatureName, FeatureVector, Track};

/// Default report-card average when no semester grade is supplied
const DEFAULT_RAPOR_AVG: f64 = 75.0;

/// Majors a science-track applicant is considered mismatched with
const SCIENCE_MISMATCH_KEYWORDS: &[&str] = &["EKONOMI", "HUKUM", "KOMUNIKASI", "SASTRA"];

/// Majors a social-track applicant is considered mismatched with
const SOCIAL_MISMATCH_KEYWORDS: &[&str] = &["TEKNIK", "KEDOKTERAN", "FARMASI"];

/// Competitiveness the applicant is aiming for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Competitiveness {
    /// Most selective programs
    Very,
    /// Highly selective
    High,
    /// Moderately selective
    #[default]
    Mid,
    /// Least selective
    Low,
}

/// Highest achievement level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Achievement {
    /// No recorded achievement
    #[default]
    None,
    /// School level
    School,
    /// Provincial level
    Prov,
    /// National level
    National,
}

/// Accreditation tier of the applicant's school.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Accreditation {
    /// Tier A
    A,
    /// Tier B
    #[default]
    B,
    /// Tier C
    C,
}

const fn default_rank_percentile() -> u8 {
    100
}

/// Structured prediction request from the outer API layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    /// Curriculum track
    pub program: Track,
    /// Target major (free text)
    #[serde(default)]
    pub target_major: Option<String>,
    /// Target university (free text)
    #[serde(default)]
    pub target_university: Option<String>,
    /// Desired competitiveness
    #[serde(default)]
    pub competitiveness: Competitiveness,
    /// Semester 1 average
    #[serde(default)]
    pub s1: Option<f64>,
    /// Semester 2 average
    #[serde(default)]
    pub s2: Option<f64>,
    /// Semester 3 average
    #[serde(default)]
    pub s3: Option<f64>,
    /// Semester 4 average
    #[serde(default)]
    pub s4: Option<f64>,
    /// Semester 5 average
    #[serde(default)]
    pub s5: Option<f64>,
    /// Mathematics
    #[serde(default)]
    pub math: Option<f64>,
    /// Indonesian language
    #[serde(default)]
    pub language: Option<f64>,
    /// English language
    #[serde(default, alias = "bahasa_inggris")]
    pub english: Option<f64>,
    /// Physics (science track)
    #[serde(default)]
    pub physics: Option<f64>,
    /// Chemistry (science track)
    #[serde(default)]
    pub chemistry: Option<f64>,
    /// Biology (science track)
    #[serde(default)]
    pub biology: Option<f64>,
    /// Economics (social track)
    #[serde(default)]
    pub economics: Option<f64>,
    /// Geography (social track)
    #[serde(default)]
    pub geography: Option<f64>,
    /// History (social track)
    #[serde(default)]
    pub history: Option<f64>,
    /// Class rank percentile, 10 means top 10%
    #[serde(default = "default_rank_percentile")]
    pub rank_percentile: u8,
    /// Highest achievement
    #[serde(default)]
    pub achievement: Achievement,
    /// School accreditation
    #[serde(default)]
    pub accreditation: Accreditation,
}

impl PredictionRequest {
    /// Minimal request for a track; every optional field unset
    #[must_use]
    pub const fn new(program: Track) -> Self {
        Self {
            program,
            target_major: None,
            target_university: None,
            competitiveness: Competitiveness::Mid,
            s1: None,
            s2: None,
            s3: None,
            s4: None,
            s5: None,
            math: None,
            language: None,
            english: None,
            physics: None,
            chemistry: None,
            biology: None,
            economics: None,
            geography: None,
            history: None,
            rank_percentile: 100,
            achievement: Achievement::None,
            accreditation: Accreditation::B,
        }
    }

    fn semesters(&self) -> [Option<f64>; 5] {
        [self.s1, self.s2, self.s3, self.s4, self.s5]
    }
}

/// Map an upstream request onto the feature schema.
///
/// Missing subjects default to the semester average when they feed an
/// average, and to 0 when they are reported as an individual score.
#[must_use]
pub fn prepare_prediction_features(request: &PredictionRequest) -> FeatureVector {
    let semesters: Vec<f64> = request
        .semesters()
        .iter()
        .filter_map(|g| valid_grade(*g))
        .collect();
    let rapor_avg = mean(&semesters).unwrap_or(DEFAULT_RAPOR_AVG);

    let or_rapor = |g: Option<f64>| valid_grade(g).unwrap_or(rapor_avg);
    let or_zero = |g: Option<f64>| valid_grade(g).unwrap_or(0.0);

    let math_score = or_rapor(request.math);
    let language_score = (or_rapor(request.language) + or_rapor(request.english)) / 2.0;

    let science = request.program == Track::Science;
    let core_subjects = if science {
        [
            or_rapor(request.math),
            or_rapor(request.physics),
            or_rapor(request.chemistry),
            or_rapor(request.biology),
            language_score,
        ]
    } else {
        [
            or_rapor(request.math),
            or_rapor(request.economics),
            or_rapor(request.geography),
            or_rapor(request.history),
            language_score,
        ]
    };
    let positive: Vec<f64> = core_subjects.into_iter().filter(|s| *s > 0.0).collect();
    let core_avg = mean(&positive).unwrap_or(rapor_avg);

    let major = request
        .target_major
        .as_deref()
        .unwrap_or_default()
        .to_uppercase();
    let mismatch_keywords = if science {
        SCIENCE_MISMATCH_KEYWORDS
    } else {
        SOCIAL_MISMATCH_KEYWORDS
    };
    let program_match = !mismatch_keywords.iter().any(|k| major.contains(k));

    let only_if = |taken: bool, g: Option<f64>| if taken { or_zero(g) } else { 0.0 };

    FeatureVector::zeros()
        .with(FeatureName::RaporAvg, rapor_avg)
        .with(FeatureName::CoreAvg, core_avg)
        .with(FeatureName::ProgramAvg, core_avg)
        .with(FeatureName::MathScore, math_score)
        .with(FeatureName::LanguageScore, language_score)
        .with(FeatureName::ProgramSaintek, f64::from(u8::from(science)))
        .with(FeatureName::ProgramSoshum, f64::from(u8::from(!science)))
        .with(FeatureName::ProgramMatch, f64::from(u8::from(program_match)))
        .with(FeatureName::PhysicsScore, only_if(science, request.physics))
        .with(FeatureName::ChemistryScore, only_if(science, request.chemistry))
        .with(FeatureName::BiologyScore, only_if(science, request.biology))
        .with(FeatureName::EconomicsScore, only_if(!science, request.economics))
        .with(FeatureName::GeographyScore, only_if(!science, request.geography))
        .with(FeatureName::HistoryScore, only_if(!science, request.history))
}
