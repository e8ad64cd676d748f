//! Train-and-predict demo
//!
//! Run with: `cargo run --example train_and_predict`
//!
//! Writes a small set of admitted students to a scratch directory, trains
//! all three model families, then scores two prospective students through
//! the persisted artifact.

use anyhow::Context;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use unimatch::dataset::{build_observed_record, write_training_records};
use unimatch::features::{Accreditation, Achievement, PredictionRequest, SubjectGrades};
use unimatch::{logging, EngineConfig, PredictorService, StudentRecord, Track};

const MAJORS: [(&str, Track, &str); 4] = [
    ("Teknik Informatika", Track::Science, "SCIENTECH"),
    ("Kedokteran", Track::Science, "SCIENTECH"),
    ("Manajemen", Track::Social, "SOSHUM"),
    ("Ilmu Hukum", Track::Social, "SOSHUM"),
];

fn main() -> anyhow::Result<()> {
    logging::init();
    println!("=== Unimatch Train & Predict Demo ===\n");

    let dir = tempfile::tempdir().context("creating scratch directory")?;
    let mut config = EngineConfig::with_data_dir(dir.path());
    config.model_path = dir.path().join("models/admission_model.umat");

    // 1. Historical admitted students
    let mut rng = StdRng::seed_from_u64(2024);
    let records: Vec<_> = (0..300)
        .map(|i| build_observed_record(&admitted_student(&mut rng, i), i))
        .collect();
    write_training_records(&config.training_data_path, &records)?;
    println!("1. Wrote {} admitted students", records.len());

    // 2. Train, select and persist
    let trained = unimatch::train_if_needed(&config)?;
    println!("2. Model available: {trained}");

    let service = PredictorService::new(config.store());
    let artifact = service
        .artifact()
        .context("artifact should load after training")?;
    println!("   Best family: {} (AUC {:.3})", artifact.best_family(), artifact.best_score());
    for (family, report) in artifact.reports() {
        println!(
            "   {:<20} auc={:.3} accuracy={:.3} f1={:.3}",
            family.as_str(),
            report.auc,
            report.accuracy,
            report.f1
        );
    }

    // 3. Score prospective students
    println!("\n3. Predictions");
    for (name, request) in [("strong", strong_applicant()), ("weak", weak_applicant())] {
        let result = service.predict_request(&request);
        println!(
            "   {name:<7} p={:.3} label={} source={:?}",
            result.probability,
            result.label.as_str(),
            result.source
        );
    }

    // 4. What drives the model
    println!("\n4. Top features");
    for (feature, weight) in service.feature_importance(None).iter().take(5) {
        println!("   {feature:<18} {weight:.4}");
    }

    Ok(())
}

fn admitted_student(rng: &mut StdRng, i: usize) -> StudentRecord {
    let (major, track, category) = MAJORS[i % MAJORS.len()];
    let base: f64 = rng.gen_range(78.0..96.0);
    let mut grade = || (base + rng.gen_range(-3.0..3.0)).min(100.0);

    let mut builder = StudentRecord::builder()
        .track(track)
        .target_major(major)
        .target_university("Universitas Contoh")
        .category(category);
    for n in 1..=5 {
        builder = builder.semester(n, grade());
    }
    let subjects = match track {
        Track::Science => SubjectGrades {
            mathematics: Some(grade()),
            physics: Some(grade()),
            chemistry: Some(grade()),
            biology: Some(grade()),
            indonesian: Some(grade()),
            english: Some(grade()),
            ..SubjectGrades::default()
        },
        Track::Social => SubjectGrades {
            mathematics: Some(grade()),
            economics: Some(grade()),
            geography: Some(grade()),
            history: Some(grade()),
            indonesian: Some(grade()),
            english: Some(grade()),
            ..SubjectGrades::default()
        },
    };
    builder.subjects(subjects).build()
}

fn strong_applicant() -> PredictionRequest {
    let mut request = PredictionRequest::new(Track::Science);
    request.target_major = Some("Teknik Informatika".to_string());
    request.s1 = Some(90.0);
    request.s2 = Some(91.0);
    request.s3 = Some(92.0);
    request.s4 = Some(92.0);
    request.s5 = Some(93.0);
    request.math = Some(95.0);
    request.physics = Some(90.0);
    request.language = Some(88.0);
    request.rank_percentile = 5;
    request.achievement = Achievement::National;
    request.accreditation = Accreditation::A;
    request
}

fn weak_applicant() -> PredictionRequest {
    let mut request = PredictionRequest::new(Track::Social);
    request.target_major = Some("Teknik Informatika".to_string());
    request.s1 = Some(68.0);
    request.s2 = Some(70.0);
    request.s3 = Some(69.0);
    request.math = Some(65.0);
    request
}
