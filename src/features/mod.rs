//! Feature vectorization
//!
//! Maps raw student attributes onto the fixed, lexicographically ordered
//! feature schema. Training-data preparation and live prediction go through
//! the same [`FeatureName`] schema so column order and semantics line up.
//!
//! ## Usage
//!
//! ```rust
//! use unimatch::features::{vectorize, FeatureName, StudentRecord, SubjectGrades, Track};
//!
//! let record = StudentRecord::builder()
//!     .track(Track::Science)
//!     .subjects(SubjectGrades {
//!         mathematics: Some(90.0),
//!         physics: Some(85.0),
//!         indonesian: Some(80.0),
//!         english: Some(84.0),
//!         ..SubjectGrades::default()
//!     })
//!     .target_major("TEKNIK ELEKTRO")
//!     .build();
//!
//! let vector = vectorize(&record);
//! assert_eq!(vector.get(FeatureName::ProgramMatch), 1.0);
//! assert_eq!(vector.get(FeatureName::EconomicsScore), 0.0);
//! ```

mod record;
mod request;
mod vector;

pub use record::{
    compatibility, major_track, StudentRecord, StudentRecordBuilder, SubjectGrades, Track,
    MAX_GRADE, SCIENCE_MAJOR_KEYWORDS, SOCIAL_MAJOR_KEYWORDS,
};
pub use request::{
    prepare_prediction_features, Accreditation, Achievement, Competitiveness, PredictionRequest,
};
pub use vector::{FeatureMap, FeatureName, FeatureVector};

pub(crate) use record::{mean, valid_grade};

/// Vectorize a raw record. Total: missing data degrades to defaults.
#[must_use]
pub fn vectorize(record: &StudentRecord) -> FeatureVector {
    vectorize_with_match(record, compatibility(record.track(), record.target_major()))
}

/// Vectorize with an externally decided compatibility flag.
///
/// Offline preparation decides compatibility from the competitiveness
/// category as well as the major; everything else is shared with
/// [`vectorize`].
#[must_use]
pub fn vectorize_with_match(record: &StudentRecord, program_match: bool) -> FeatureVector {
    let s = record.subjects();
    let grade = |g: Option<f64>| valid_grade(g);

    let subject_mean = mean(&s.present());
    let semester_mean = mean(
        &record
            .semesters()
            .iter()
            .filter_map(|g| valid_grade(*g))
            .collect::<Vec<_>>(),
    );
    let rapor_avg = subject_mean.or(semester_mean).unwrap_or(0.0);

    // a zero grade means "not taken" for the subset averages
    let average_of = |subjects: &[Option<f64>]| {
        mean(
            &subjects
                .iter()
                .filter_map(|g| grade(*g))
                .filter(|g| *g > 0.0)
                .collect::<Vec<_>>(),
        )
        .unwrap_or(rapor_avg)
    };

    let core_avg = average_of(&[s.mathematics, s.indonesian, s.english]);
    let program_avg = match record.track() {
        Some(Track::Science) => average_of(&[
            s.mathematics,
            s.physics,
            s.chemistry,
            s.biology,
            s.indonesian,
            s.english,
        ]),
        Some(Track::Social) => average_of(&[
            s.mathematics,
            s.indonesian,
            s.english,
            s.geography,
            s.history,
            s.economics,
        ]),
        None => rapor_avg,
    };

    let or_zero = |g: Option<f64>| grade(g).unwrap_or(0.0);
    let language_score = (or_zero(s.indonesian) + or_zero(s.english)) / 2.0;

    let science = record.track() == Some(Track::Science);
    let social = record.track() == Some(Track::Social);
    let only_if = |taken: bool, g: Option<f64>| if taken { or_zero(g) } else { 0.0 };

    FeatureVector::zeros()
        .with(FeatureName::RaporAvg, rapor_avg)
        .with(FeatureName::CoreAvg, core_avg)
        .with(FeatureName::ProgramAvg, program_avg)
        .with(FeatureName::MathScore, or_zero(s.mathematics))
        .with(FeatureName::LanguageScore, language_score)
        .with(FeatureName::ProgramSaintek, f64::from(u8::from(science)))
        .with(FeatureName::ProgramSoshum, f64::from(u8::from(social)))
        .with(FeatureName::ProgramMatch, f64::from(u8::from(program_match)))
        .with(FeatureName::PhysicsScore, only_if(science, s.physics))
        .with(FeatureName::ChemistryScore, only_if(science, s.chemistry))
        .with(FeatureName::BiologyScore, only_if(science, s.biology))
        .with(FeatureName::EconomicsScore, only_if(social, s.economics))
        .with(FeatureName::GeographyScore, only_if(social, s.geography))
        .with(FeatureName::HistoryScore, only_if(social, s.history))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn science_record() -> StudentRecord {
        StudentRecord::builder()
            .track(Track::Science)
            .subjects(SubjectGrades {
                mathematics: Some(90.0),
                physics: Some(80.0),
                chemistry: Some(70.0),
                biology: Some(60.0),
                economics: Some(95.0),
                indonesian: Some(80.0),
                english: Some(90.0),
                ..SubjectGrades::default()
            })
            .target_major("TEKNIK INFORMATIKA")
            .build()
    }

    #[test]
    fn test_vectorize_science_track() {
        let v = vectorize(&science_record());

        // all seven present subjects
        let expected_rapor = (90.0 + 80.0 + 70.0 + 60.0 + 95.0 + 80.0 + 90.0) / 7.0;
        assert!((v.get(FeatureName::RaporAvg) - expected_rapor).abs() < 1e-9);
        assert!((v.get(FeatureName::CoreAvg) - (90.0 + 80.0 + 90.0) / 3.0).abs() < 1e-9);
        let expected_program = (90.0 + 80.0 + 70.0 + 60.0 + 80.0 + 90.0) / 6.0;
        assert!((v.get(FeatureName::ProgramAvg) - expected_program).abs() < 1e-9);
        assert!((v.get(FeatureName::LanguageScore) - 85.0).abs() < 1e-9);
        assert!((v.get(FeatureName::PhysicsScore) - 80.0).abs() < 1e-9);
        // not applicable to the science track
        assert!(v.get(FeatureName::EconomicsScore).abs() < f64::EPSILON);
        assert!((v.get(FeatureName::ProgramSaintek) - 1.0).abs() < f64::EPSILON);
        assert!(v.get(FeatureName::ProgramSoshum).abs() < f64::EPSILON);
        assert!((v.get(FeatureName::ProgramMatch) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vectorize_mismatch_sets_flag() {
        let record = StudentRecord::builder()
            .track(Track::Social)
            .target_major("KEDOKTERAN")
            .build();
        assert!(vectorize(&record).get(FeatureName::ProgramMatch).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vectorize_empty_record_is_total() {
        let v = vectorize(&StudentRecord::builder().build());
        for feature in FeatureName::ALL {
            let value = v.get(feature);
            assert!(value.is_finite());
        }
        assert!(v.get(FeatureName::RaporAvg).abs() < f64::EPSILON);
        // no track, no keyword: compatible
        assert!((v.get(FeatureName::ProgramMatch) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_vectorize_falls_back_to_semesters() {
        let record = StudentRecord::builder()
            .semester(1, 80.0)
            .semester(2, 90.0)
            .build();
        let v = vectorize(&record);
        assert!((v.get(FeatureName::RaporAvg) - 85.0).abs() < 1e-9);
        assert!((v.get(FeatureName::CoreAvg) - 85.0).abs() < 1e-9);
    }

    #[test]
    fn test_vectorize_zero_grades_skip_subset_averages() {
        let record = StudentRecord::builder()
            .track(Track::Science)
            .subjects(SubjectGrades {
                mathematics: Some(90.0),
                physics: Some(0.0),
                indonesian: Some(80.0),
                english: Some(0.0),
                ..SubjectGrades::default()
            })
            .build();
        let v = vectorize(&record);

        // zeros still count towards the overall average
        assert!((v.get(FeatureName::RaporAvg) - 42.5).abs() < 1e-9);
        assert!((v.get(FeatureName::CoreAvg) - 85.0).abs() < 1e-9);
        assert!((v.get(FeatureName::ProgramAvg) - 85.0).abs() < 1e-9);
        assert!((v.get(FeatureName::LanguageScore) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_vectorize_all_zero_subset_falls_back_to_rapor() {
        let record = StudentRecord::builder()
            .track(Track::Social)
            .subjects(SubjectGrades {
                mathematics: Some(0.0),
                economics: Some(88.0),
                ..SubjectGrades::default()
            })
            .build();
        let v = vectorize(&record);
        assert!((v.get(FeatureName::RaporAvg) - 44.0).abs() < 1e-9);
        assert!((v.get(FeatureName::CoreAvg) - 44.0).abs() < 1e-9);
        assert!((v.get(FeatureName::ProgramAvg) - 88.0).abs() < 1e-9);
    }

    #[test]
    fn test_vectorize_clamps_out_of_range() {
        let record = StudentRecord::builder()
            .track(Track::Social)
            .subjects(SubjectGrades {
                mathematics: Some(140.0),
                history: Some(-20.0),
                ..SubjectGrades::default()
            })
            .build();
        let v = vectorize(&record);
        assert!((v.get(FeatureName::MathScore) - 100.0).abs() < f64::EPSILON);
        assert!(v.get(FeatureName::HistoryScore).abs() < f64::EPSILON);
        assert!(v.get(FeatureName::RaporAvg) <= MAX_GRADE);
    }
}
