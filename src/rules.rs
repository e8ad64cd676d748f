//! Training-free, explainable admission scoring
//!
//! Starts at even odds and adds three adjustments:
//!
//! | Factor            | Adjustment                                          |
//! |-------------------|-----------------------------------------------------|
//! | grade gap         | `+min(0.4, gap/50)` above, `+max(-0.3, gap/50)` below |
//! | acceptance rate   | `+0.1` above 20%, `-0.2` below 5%                   |
//! | subject strengths | up to `+0.2` for subjects the major leans on        |
//!
//! The sum is clamped to `[0.05, 0.95]` and bucketed into five categories.
//!
//! ## Example
//!
//! ```rust
//! use unimatch::rules::{AdmissionCategory, ProgramRequirements, RuleScorer, StudentGrades};
//!
//! let program = ProgramRequirements::new("Universitas Indonesia", "Psikologi").required_average(80.0);
//! let grades = StudentGrades::with_average(85.0);
//!
//! let score = RuleScorer::default().score(&program, &grades);
//! assert_eq!(score.category, AdmissionCategory::Likely);
//! assert!((score.probability - 0.6).abs() < 1e-9);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::features::Track;

/// Starting probability
pub const BASE_PROBABILITY: f64 = 0.5;

/// Probability bounds after all adjustments
pub const PROBABILITY_BOUNDS: (f64, f64) = (0.05, 0.95);

/// Average assumed when no grade is known
pub const DEFAULT_AVERAGE: f64 = 75.0;

/// Default number of recommendations
pub const DEFAULT_RECOMMENDATION_LIMIT: usize = 15;

const GAP_DIVISOR: f64 = 50.0;
const MAX_GAP_BONUS: f64 = 0.4;
const MAX_GAP_PENALTY: f64 = -0.3;
const MAX_SUBJECT_BONUS: f64 = 0.2;

/// Major keywords that place a program on the science track
pub const SCIENCE_PROGRAM_KEYWORDS: &[&str] = &[
    "teknik",
    "informatika",
    "kedokteran",
    "farmasi",
    "biologi",
    "kimia",
    "fisika",
    "matematika",
    "arsitektur",
    "gizi",
    "kesehatan",
    "kebidanan",
    "fisioterapi",
    "sistem informasi",
    "ilmu komputer",
];

/// Five-bucket outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionCategory {
    /// `p < 0.2`
    Difficult,
    /// `0.2 <= p < 0.4`
    Unlikely,
    /// `0.4 <= p < 0.6`
    Possible,
    /// `0.6 <= p < 0.8`
    Likely,
    /// `p >= 0.8`
    VeryLikely,
}

impl AdmissionCategory {
    /// Bucket for a probability
    #[must_use]
    pub fn from_probability(p: f64) -> Self {
        if p >= 0.8 {
            Self::VeryLikely
        } else if p >= 0.6 {
            Self::Likely
        } else if p >= 0.4 {
            Self::Possible
        } else if p >= 0.2 {
            Self::Unlikely
        } else {
            Self::Difficult
        }
    }

    /// Display text
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::VeryLikely => "very likely",
            Self::Likely => "likely",
            Self::Possible => "possible",
            Self::Unlikely => "unlikely",
            Self::Difficult => "difficult",
        }
    }
}

impl fmt::Display for AdmissionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Published facts about one study program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRequirements {
    /// University name
    pub university: String,
    /// Major name
    pub major: String,
    /// Minimum report-card average, if published
    #[serde(default)]
    pub required_average: Option<f64>,
    /// Acceptance rate in percent, if published
    #[serde(default)]
    pub acceptance_rate: Option<f64>,
    /// Passing grade, carried for display
    #[serde(default)]
    pub passing_grade: Option<f64>,
}

impl ProgramRequirements {
    /// Program with no published numbers
    #[must_use]
    pub fn new(university: impl Into<String>, major: impl Into<String>) -> Self {
        Self {
            university: university.into(),
            major: major.into(),
            required_average: None,
            acceptance_rate: None,
            passing_grade: None,
        }
    }

    /// Set the required average
    #[must_use]
    pub const fn required_average(mut self, average: f64) -> Self {
        self.required_average = Some(average);
        self
    }

    /// Set the acceptance rate (percent)
    #[must_use]
    pub const fn acceptance_rate(mut self, rate: f64) -> Self {
        self.acceptance_rate = Some(rate);
        self
    }

    /// Set the passing grade
    #[must_use]
    pub const fn passing_grade(mut self, grade: f64) -> Self {
        self.passing_grade = Some(grade);
        self
    }

    /// Track implied by the major name
    #[must_use]
    pub fn track(&self) -> Track {
        track_for_major(&self.major)
    }
}

/// A student's current grades as reported in conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentGrades {
    /// Explicit overall average; derived from subjects when absent
    #[serde(default)]
    pub average: Option<f64>,
    /// Mathematics
    #[serde(default)]
    pub mathematics: Option<f64>,
    /// Physics
    #[serde(default)]
    pub physics: Option<f64>,
    /// Chemistry
    #[serde(default)]
    pub chemistry: Option<f64>,
    /// Biology
    #[serde(default)]
    pub biology: Option<f64>,
    /// Economics
    #[serde(default)]
    pub economics: Option<f64>,
    /// Geography
    #[serde(default)]
    pub geography: Option<f64>,
    /// History
    #[serde(default)]
    pub history: Option<f64>,
    /// Sociology
    #[serde(default)]
    pub sociology: Option<f64>,
    /// Indonesian language
    #[serde(default)]
    pub indonesian: Option<f64>,
    /// English language
    #[serde(default)]
    pub english: Option<f64>,
}

impl StudentGrades {
    /// Grades with only an overall average
    #[must_use]
    pub fn with_average(average: f64) -> Self {
        Self {
            average: Some(average),
            ..Self::default()
        }
    }

    fn subjects(&self) -> [Option<f64>; 10] {
        [
            self.mathematics,
            self.physics,
            self.chemistry,
            self.biology,
            self.economics,
            self.geography,
            self.history,
            self.sociology,
            self.indonesian,
            self.english,
        ]
    }

    /// Explicit average, else the mean of known subjects, else 75
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f64 {
        if let Some(avg) = self.average.filter(|v| v.is_finite()) {
            return avg;
        }
        let known: Vec<f64> = self
            .subjects()
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();
        if known.is_empty() {
            DEFAULT_AVERAGE
        } else {
            known.iter().sum::<f64>() / known.len() as f64
        }
    }
}

/// Probability, bucket and grade gap for one program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleScore {
    /// Clamped probability, rounded to 3 decimals
    pub probability: f64,
    /// Bucket of the unrounded probability
    pub category: AdmissionCategory,
    /// `required - average`, rounded to 2 decimals (0 without a requirement)
    pub current_gap: f64,
}

/// Scored candidate program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    /// The program
    pub program: ProgramRequirements,
    /// Track implied by the major
    pub track: Track,
    /// Its score
    pub score: RuleScore,
}

/// Deterministic scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleScorer {
    limit: usize,
}

impl Default for RuleScorer {
    fn default() -> Self {
        Self {
            limit: DEFAULT_RECOMMENDATION_LIMIT,
        }
    }
}

impl RuleScorer {
    /// Scorer returning at most `limit` recommendations
    #[must_use]
    pub const fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    /// Recommendation cap
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Score one program for one student
    #[must_use]
    pub fn score(&self, program: &ProgramRequirements, grades: &StudentGrades) -> RuleScore {
        let average = grades.average();
        let required = present(program.required_average);
        let mut probability = BASE_PROBABILITY;

        if let Some(required) = required {
            let gap = (average - required) / GAP_DIVISOR;
            probability += if gap >= 0.0 {
                gap.min(MAX_GAP_BONUS)
            } else {
                gap.max(MAX_GAP_PENALTY)
            };
        }

        if let Some(rate) = present(program.acceptance_rate) {
            if rate > 20.0 {
                probability += 0.1;
            } else if rate < 5.0 {
                probability -= 0.2;
            }
        }

        probability += subject_bonus(&program.major, grades);
        let probability = probability.clamp(PROBABILITY_BOUNDS.0, PROBABILITY_BOUNDS.1);

        RuleScore {
            probability: round_to(probability, 3),
            category: AdmissionCategory::from_probability(probability),
            current_gap: round_to(required.map_or(0.0, |r| r - average), 2),
        }
    }

    /// Rank candidate programs for a student.
    ///
    /// Programs on the other track are skipped (`track` defaults to the one
    /// inferred from the grades); the rest are sorted by probability,
    /// highest first, and truncated to the limit.
    #[must_use]
    pub fn recommend(
        &self,
        candidates: &[ProgramRequirements],
        grades: &StudentGrades,
        track: Option<Track>,
    ) -> Vec<Recommendation> {
        let student_track = track.unwrap_or_else(|| infer_track(grades));

        let mut ranked: Vec<Recommendation> = candidates
            .iter()
            .filter(|p| !p.university.is_empty() && !p.major.is_empty())
            .filter(|p| p.track() == student_track)
            .map(|p| Recommendation {
                program: p.clone(),
                track: p.track(),
                score: self.score(p, grades),
            })
            .collect();

        // stable: equal probabilities keep candidate order
        ranked.sort_by(|a, b| b.score.probability.total_cmp(&a.score.probability));
        ranked.truncate(self.limit);
        tracing::debug!(
            candidates = candidates.len(),
            returned = ranked.len(),
            track = %student_track,
            "ranked programs"
        );
        ranked
    }
}

/// Science if the major names a science field, otherwise social
#[must_use]
pub fn track_for_major(major: &str) -> Track {
    let major = major.to_lowercase();
    if SCIENCE_PROGRAM_KEYWORDS.iter().any(|k| major.contains(k)) {
        Track::Science
    } else {
        Track::Social
    }
}

/// Track suggested by which subjects the student reported.
///
/// Counts mathematics/physics/chemistry/biology against
/// economics/geography/history/sociology; ties go to science.
#[must_use]
pub fn infer_track(grades: &StudentGrades) -> Track {
    let count = |subjects: [Option<f64>; 4]| subjects.iter().filter(|s| s.is_some()).count();
    let science = count([
        grades.mathematics,
        grades.physics,
        grades.chemistry,
        grades.biology,
    ]);
    let social = count([
        grades.economics,
        grades.geography,
        grades.history,
        grades.sociology,
    ]);
    if social > science {
        Track::Social
    } else {
        Track::Science
    }
}

/// Bonus for strong grades in the subjects a major leans on, capped at 0.2
#[must_use]
pub fn subject_bonus(major: &str, grades: &StudentGrades) -> f64 {
    let major = major.to_lowercase();
    let at_least = |grade: Option<f64>, threshold: f64, bonus: f64| {
        if grade.is_some_and(|g| g >= threshold) {
            bonus
        } else {
            0.0
        }
    };

    let bonus = if major.contains("teknik") || major.contains("informatika") {
        at_least(grades.mathematics, 85.0, 0.15) + at_least(grades.physics, 80.0, 0.1)
    } else if major.contains("kedokteran") || major.contains("farmasi") {
        at_least(grades.biology, 85.0, 0.15) + at_least(grades.chemistry, 80.0, 0.1)
    } else if major.contains("ekonomi") || major.contains("manajemen") {
        at_least(grades.mathematics, 80.0, 0.1) + at_least(grades.economics, 85.0, 0.15)
    } else if major.contains("hukum") {
        at_least(grades.indonesian, 85.0, 0.15)
    } else {
        0.0
    };
    bonus.min(MAX_SUBJECT_BONUS)
}

/// Published numbers of 0 or non-finite count as unpublished
fn present(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(major: &str) -> ProgramRequirements {
        ProgramRequirements::new("Universitas Contoh", major)
    }

    #[test]
    fn test_required_gap_bonus() {
        let score = RuleScorer::default().score(
            &program("Psikologi").required_average(80.0),
            &StudentGrades::with_average(85.0),
        );
        assert!((score.probability - 0.6).abs() < 1e-9);
        assert_eq!(score.category, AdmissionCategory::Likely);
        assert!((score.current_gap + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_gap_is_capped() {
        let scorer = RuleScorer::default();
        let high = scorer.score(
            &program("Psikologi").required_average(50.0),
            &StudentGrades::with_average(100.0),
        );
        assert!((high.probability - 0.9).abs() < 1e-9);

        let low = scorer.score(
            &program("Psikologi").required_average(95.0),
            &StudentGrades::with_average(40.0),
        );
        assert!((low.probability - 0.2).abs() < 1e-9);
        assert_eq!(low.category, AdmissionCategory::Unlikely);
    }

    #[test]
    fn test_acceptance_rate() {
        let scorer = RuleScorer::default();
        let grades = StudentGrades::with_average(80.0);
        let open = scorer.score(&program("Sejarah").acceptance_rate(25.0), &grades);
        let selective = scorer.score(&program("Sejarah").acceptance_rate(3.0), &grades);
        let middle = scorer.score(&program("Sejarah").acceptance_rate(10.0), &grades);

        assert!((open.probability - 0.6).abs() < 1e-9);
        assert!((selective.probability - 0.3).abs() < 1e-9);
        assert!((middle.probability - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_subject_bonus_capped() {
        let grades = StudentGrades {
            mathematics: Some(90.0),
            physics: Some(85.0),
            ..StudentGrades::default()
        };
        // 0.15 + 0.1 capped to 0.2
        assert!((subject_bonus("Teknik Informatika", &grades) - 0.2).abs() < 1e-12);
        assert!((subject_bonus("Ekonomi Pembangunan", &grades) - 0.1).abs() < 1e-12);
        assert!(subject_bonus("Sastra Inggris", &grades).abs() < f64::EPSILON);
    }

    #[test]
    fn test_law_uses_indonesian() {
        let grades = StudentGrades {
            indonesian: Some(88.0),
            ..StudentGrades::default()
        };
        assert!((subject_bonus("Ilmu Hukum", &grades) - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_clamped_to_bounds() {
        let grades = StudentGrades {
            average: Some(30.0),
            ..StudentGrades::default()
        };
        let score = RuleScorer::default().score(
            &program("Kedokteran").required_average(90.0).acceptance_rate(2.0),
            &grades,
        );
        assert!((score.probability - 0.05).abs() < 1e-9);
        assert_eq!(score.category, AdmissionCategory::Difficult);
    }

    #[test]
    fn test_no_requirement_means_no_gap() {
        let score = RuleScorer::default().score(&program("Psikologi"), &StudentGrades::default());
        assert!((score.probability - 0.5).abs() < 1e-9);
        assert!(score.current_gap.abs() < f64::EPSILON);
        assert_eq!(score.category, AdmissionCategory::Possible);
    }

    #[test]
    fn test_average_derivation() {
        assert!((StudentGrades::default().average() - 75.0).abs() < f64::EPSILON);
        let grades = StudentGrades {
            mathematics: Some(80.0),
            english: Some(90.0),
            ..StudentGrades::default()
        };
        assert!((grades.average() - 85.0).abs() < f64::EPSILON);
        let explicit = StudentGrades {
            average: Some(70.0),
            ..grades
        };
        assert!((explicit.average() - 70.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(AdmissionCategory::from_probability(0.8), AdmissionCategory::VeryLikely);
        assert_eq!(AdmissionCategory::from_probability(0.6), AdmissionCategory::Likely);
        assert_eq!(AdmissionCategory::from_probability(0.4), AdmissionCategory::Possible);
        assert_eq!(AdmissionCategory::from_probability(0.2), AdmissionCategory::Unlikely);
        assert_eq!(AdmissionCategory::from_probability(0.19), AdmissionCategory::Difficult);
    }

    #[test]
    fn test_track_helpers() {
        assert_eq!(track_for_major("Teknik Sipil"), Track::Science);
        assert_eq!(track_for_major("SISTEM INFORMASI"), Track::Science);
        assert_eq!(track_for_major("Ilmu Komunikasi"), Track::Social);

        let social = StudentGrades {
            economics: Some(80.0),
            history: Some(80.0),
            mathematics: Some(80.0),
            ..StudentGrades::default()
        };
        assert_eq!(infer_track(&social), Track::Social);
        let tie = StudentGrades {
            economics: Some(80.0),
            physics: Some(80.0),
            ..StudentGrades::default()
        };
        assert_eq!(infer_track(&tie), Track::Science);
        assert_eq!(infer_track(&StudentGrades::default()), Track::Science);
    }

    #[test]
    fn test_recommend_filters_sorts_and_truncates() {
        let candidates = vec![
            program("Teknik Elektro").required_average(90.0),
            program("Ekonomi").required_average(70.0),
            program("Informatika").required_average(80.0),
            program("Farmasi").required_average(85.0),
            ProgramRequirements::new("", "Kedokteran"),
        ];
        let grades = StudentGrades::with_average(85.0);

        let ranked = RuleScorer::with_limit(2).recommend(&candidates, &grades, Some(Track::Science));
        let majors: Vec<&str> = ranked.iter().map(|r| r.program.major.as_str()).collect();
        assert_eq!(majors, vec!["Informatika", "Farmasi"]);
        assert!(ranked.iter().all(|r| r.track == Track::Science));
    }

    #[test]
    fn test_recommend_default_limit() {
        let candidates: Vec<_> = (0..30)
            .map(|i| program(&format!("Manajemen {i}")).required_average(f64::from(60 + i)))
            .collect();
        let ranked = RuleScorer::default().recommend(&candidates, &StudentGrades::with_average(80.0), Some(Track::Social));
        assert_eq!(ranked.len(), DEFAULT_RECOMMENDATION_LIMIT);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].score.probability >= w[1].score.probability));
    }
}
