//! Rule-based scoring demo
//!
//! Run with: `cargo run --example rule_scoring`
//!
//! Scores one student against a handful of programs without any trained
//! model and prints the ranked recommendations.

use unimatch::rules::{infer_track, subject_bonus, ProgramRequirements, RuleScorer, StudentGrades};

fn main() {
    unimatch::logging::init();
    println!("=== Unimatch Rule Scoring Demo ===\n");

    let grades = StudentGrades {
        mathematics: Some(91.0),
        physics: Some(86.0),
        chemistry: Some(82.0),
        biology: Some(78.0),
        indonesian: Some(84.0),
        english: Some(88.0),
        ..StudentGrades::default()
    };
    println!("Student average: {:.2}", grades.average());
    println!("Inferred track:  {:?}\n", infer_track(&grades));

    let candidates = vec![
        ProgramRequirements::new("Institut Teknologi Bandung", "Teknik Informatika")
            .required_average(92.0)
            .acceptance_rate(3.5),
        ProgramRequirements::new("Universitas Gadjah Mada", "Teknik Sipil")
            .required_average(86.0)
            .acceptance_rate(12.0),
        ProgramRequirements::new("Universitas Indonesia", "Kedokteran")
            .required_average(94.0)
            .acceptance_rate(2.0),
        ProgramRequirements::new("Universitas Brawijaya", "Fisika").acceptance_rate(28.0),
        ProgramRequirements::new("Universitas Airlangga", "Manajemen").required_average(84.0),
    ];

    println!("Single program:");
    let first = &candidates[0];
    let score = RuleScorer::default().score(first, &grades);
    println!(
        "   {} / {}: p={:.3} ({}) gap={:.2} subject bonus={:.2}\n",
        first.university,
        first.major,
        score.probability,
        score.category,
        score.current_gap,
        subject_bonus(&first.major, &grades)
    );

    println!("Recommendations (same track only):");
    for (rank, recommendation) in RuleScorer::with_limit(3)
        .recommend(&candidates, &grades, None)
        .iter()
        .enumerate()
    {
        println!(
            "   {}. {:<28} {:<20} p={:.3} {}",
            rank + 1,
            recommendation.program.university,
            recommendation.program.major,
            recommendation.score.probability,
            recommendation.score.category.as_str()
        );
    }
}
