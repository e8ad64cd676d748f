//! Raw student records and track/major compatibility

use std::fmt;

use serde::{Deserialize, Serialize};

/// Upper bound of the grade scale
pub const MAX_GRADE: f64 = 100.0;

/// Curriculum track a student follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Track {
    /// Quantitative / science track ("saintek", "IPA")
    #[serde(rename = "saintek", alias = "IPA", alias = "ipa", alias = "science")]
    Science,
    /// Humanities / social-science track ("soshum", "IPS")
    #[serde(rename = "soshum", alias = "IPS", alias = "ips", alias = "social")]
    Social,
}

impl Track {
    /// Parse a track label, accepting the common aliases case-insensitively
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "saintek" | "ipa" | "science" => Some(Self::Science),
            "soshum" | "ips" | "social" => Some(Self::Social),
            _ => None,
        }
    }

    /// Canonical label
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Science => "saintek",
            Self::Social => "soshum",
        }
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Major keywords that conventionally require the science track.
pub const SCIENCE_MAJOR_KEYWORDS: &[&str] = &[
    "TEKNIK",
    "INFORMATIKA",
    "KEDOKTERAN",
    "FARMASI",
    "BIOLOGI",
    "KIMIA",
    "FISIKA",
    "MATEMATIKA",
    "ARSITEKTUR",
    "GIZI",
    "KESEHATAN",
    "KEBIDANAN",
    "FISIOTERAPI",
    "SISTEM INFORMASI",
    "ILMU KOMPUTER",
    "ENGINEERING",
    "MEDICINE",
    "PHARMACY",
    "COMPUTER",
];

/// Major keywords that conventionally require the social track.
pub const SOCIAL_MAJOR_KEYWORDS: &[&str] = &[
    "EKONOMI",
    "MANAJEMEN",
    "AKUNTANSI",
    "BISNIS",
    "HUKUM",
    "KOMUNIKASI",
    "SASTRA",
    "ECONOMICS",
    "MANAGEMENT",
    "ACCOUNTING",
    "LAW",
    "COMMUNICATION",
];

/// Track conventionally expected by a major, if any keyword decides it.
///
/// Science keywords win when both lists match.
#[must_use]
pub fn major_track(major: &str) -> Option<Track> {
    let major = major.to_uppercase();
    if SCIENCE_MAJOR_KEYWORDS.iter().any(|k| major.contains(k)) {
        Some(Track::Science)
    } else if SOCIAL_MAJOR_KEYWORDS.iter().any(|k| major.contains(k)) {
        Some(Track::Social)
    } else {
        None
    }
}

/// Program-compatibility flag: `false` only on a definite mismatch.
#[must_use]
pub fn compatibility(track: Option<Track>, major: &str) -> bool {
    match (track, major_track(major)) {
        (Some(student), Some(expected)) => student == expected,
        _ => true,
    }
}

/// Subject grades on the 0-100 scale. `None` means not reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectGrades {
    /// Mathematics
    pub mathematics: Option<f64>,
    /// Physics
    pub physics: Option<f64>,
    /// Chemistry
    pub chemistry: Option<f64>,
    /// Biology
    pub biology: Option<f64>,
    /// Economics
    pub economics: Option<f64>,
    /// Geography
    pub geography: Option<f64>,
    /// History
    pub history: Option<f64>,
    /// Indonesian language
    pub indonesian: Option<f64>,
    /// English language
    pub english: Option<f64>,
}

impl SubjectGrades {
    /// Every reported grade, NaN dropped
    #[must_use]
    pub fn present(&self) -> Vec<f64> {
        [
            self.mathematics,
            self.physics,
            self.chemistry,
            self.biology,
            self.economics,
            self.geography,
            self.history,
            self.indonesian,
            self.english,
        ]
        .into_iter()
        .filter_map(valid_grade)
        .collect()
    }
}

/// Historical or prospective student, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    track: Option<Track>,
    semesters: [Option<f64>; 5],
    subjects: SubjectGrades,
    target_major: String,
    target_university: String,
    category: Option<String>,
}

impl StudentRecord {
    /// Start building a record
    #[must_use]
    pub fn builder() -> StudentRecordBuilder {
        StudentRecordBuilder::default()
    }

    /// Track, if known
    #[must_use]
    pub const fn track(&self) -> Option<Track> {
        self.track
    }

    /// Semester grades 1-5
    #[must_use]
    pub const fn semesters(&self) -> &[Option<f64>; 5] {
        &self.semesters
    }

    /// Subject grades
    #[must_use]
    pub const fn subjects(&self) -> &SubjectGrades {
        &self.subjects
    }

    /// Target major text
    #[must_use]
    pub fn target_major(&self) -> &str {
        &self.target_major
    }

    /// Target university text
    #[must_use]
    pub fn target_university(&self) -> &str {
        &self.target_university
    }

    /// Competitiveness category (e.g. `SCIENTECH`, `SOSUM`, `BAHASA`)
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// Builder for [`StudentRecord`].
#[derive(Debug, Default)]
pub struct StudentRecordBuilder {
    track: Option<Track>,
    semesters: [Option<f64>; 5],
    subjects: SubjectGrades,
    target_major: String,
    target_university: String,
    category: Option<String>,
}

impl StudentRecordBuilder {
    /// Set the track
    #[must_use]
    pub const fn track(mut self, track: Track) -> Self {
        self.track = Some(track);
        self
    }

    /// Set semester grade `n` (1-based, 1..=5); other indices are ignored
    #[must_use]
    pub fn semester(mut self, n: usize, grade: f64) -> Self {
        if (1..=5).contains(&n) {
            self.semesters[n - 1] = Some(grade);
        }
        self
    }

    /// Replace all subject grades
    #[must_use]
    pub const fn subjects(mut self, subjects: SubjectGrades) -> Self {
        self.subjects = subjects;
        self
    }

    /// Set the target major
    #[must_use]
    pub fn target_major(mut self, major: impl Into<String>) -> Self {
        self.target_major = major.into();
        self
    }

    /// Set the target university
    #[must_use]
    pub fn target_university(mut self, university: impl Into<String>) -> Self {
        self.target_university = university.into();
        self
    }

    /// Set the competitiveness category
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Build the record
    #[must_use]
    pub fn build(self) -> StudentRecord {
        StudentRecord {
            track: self.track,
            semesters: self.semesters,
            subjects: self.subjects,
            target_major: self.target_major,
            target_university: self.target_university,
            category: self.category,
        }
    }
}

/// Drop NaN/infinite grades and clamp the rest to the grade scale.
pub(crate) fn valid_grade(grade: Option<f64>) -> Option<f64> {
    grade
        .filter(|g| g.is_finite())
        .map(|g| g.clamp(0.0, MAX_GRADE))
}

/// Arithmetic mean, `None` for an empty slice
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        #[allow(clippy::cast_precision_loss)]
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
