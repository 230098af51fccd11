use std::io::Write;

use ocean_engine::parity::{
    compare_responses, load_cases_jsonl, response_digest, run_parity_cases, ParityError,
    ParityMismatch, TRAIT_TOLERANCE,
};
use ocean_engine::simulation::{export_parity_cases, generate_answers, RespondentPattern};
use ocean_engine::{ScoringEngine, ScoringResponse, Trait, TypeCode};

fn reference_response() -> ScoringResponse {
    let engine = ScoringEngine::default();
    let answers = generate_answers(engine.bank(), RespondentPattern::Random, 17);
    engine.score(&answers).unwrap().response
}

#[test]
fn identical_responses_pass() {
    let r = reference_response();
    let report = compare_responses("same", &r, &r, TRAIT_TOLERANCE);
    assert!(report.passed);
    assert_eq!(report.max_trait_delta, 0.0);
    assert!(report.persona_agrees);
    assert!(report.mismatches.is_empty());
}

#[test]
fn deltas_within_tolerance_pass_and_beyond_fail() {
    let expected = reference_response();

    let mut close = expected.clone();
    close.trait_scores[Trait::Openness] += 0.0005;
    assert!(compare_responses("close", &expected, &close, TRAIT_TOLERANCE).passed);

    let mut far = expected.clone();
    far.trait_scores[Trait::Neuroticism] += 0.002;
    let report = compare_responses("far", &expected, &far, TRAIT_TOLERANCE);
    assert!(!report.passed);
    assert_eq!(report.mismatches.len(), 1);
    match &report.mismatches[0] {
        ParityMismatch::TraitScore { trait_code, .. } => {
            assert_eq!(*trait_code, Trait::Neuroticism)
        }
        other => panic!("unexpected mismatch {other:?}"),
    }
}

#[test]
fn type_code_must_match_exactly() {
    let expected = reference_response();
    let mut other = expected.clone();
    let flipped = if expected.mbti_code.to_string().starts_with('E') {
        "I"
    } else {
        "E"
    };
    let code = format!("{flipped}{}", &expected.mbti_code.to_string()[1..]);
    other.mbti_code = TypeCode::parse(&code).unwrap();

    let report = compare_responses("code", &expected, &other, TRAIT_TOLERANCE);
    assert!(!report.passed);
    assert!(report
        .mismatches
        .iter()
        .any(|m| matches!(m, ParityMismatch::TypeCode { .. })));
}

#[test]
fn persona_disagreement_is_reported_but_not_a_failure() {
    let expected = reference_response();
    let mut other = expected.clone();
    other.persona_id = "someone_else".to_string();
    let report = compare_responses("persona", &expected, &other, TRAIT_TOLERANCE);
    assert!(report.passed);
    assert!(!report.persona_agrees);
}

#[test]
fn digests_are_stable_and_sensitive() {
    let a = reference_response();
    let b = reference_response();
    assert_eq!(response_digest(&a).unwrap(), response_digest(&b).unwrap());

    let mut c = a.clone();
    c.confidence += 0.01;
    assert_ne!(response_digest(&a).unwrap(), response_digest(&c).unwrap());
}

#[test]
fn exported_fixtures_round_trip_through_jsonl_and_pass() {
    let engine = ScoringEngine::default();
    let cases = export_parity_cases(&engine).unwrap();
    assert!(!cases.is_empty());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cases.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    for case in &cases {
        writeln!(file, "{}", serde_json::to_string(case).unwrap()).unwrap();
        writeln!(file).unwrap();
    }
    drop(file);

    let loaded = load_cases_jsonl(&path).unwrap();
    assert_eq!(loaded.len(), cases.len());

    let reports = run_parity_cases(&engine, &loaded, TRAIT_TOLERANCE);
    assert!(reports.iter().all(|r| r.passed), "{reports:?}");
    assert!(reports.iter().all(|r| r.persona_agrees));
}

#[test]
fn malformed_case_line_reports_its_line_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.jsonl");
    std::fs::write(&path, "\n{\"name\": \"x\"}\n").unwrap();
    match load_cases_jsonl(&path) {
        Err(ParityError::Parse { line, .. }) => assert_eq!(line, 2),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn cases_with_invalid_answers_fail_without_aborting_the_run() {
    let engine = ScoringEngine::default();
    let mut cases = export_parity_cases(&engine).unwrap();
    cases[0].answers.insert("O1", 9);

    let reports = run_parity_cases(&engine, &cases, TRAIT_TOLERANCE);
    assert_eq!(reports.len(), cases.len());
    assert!(!reports[0].passed);
    assert!(matches!(
        reports[0].mismatches[0],
        ParityMismatch::ScoringFailed { .. }
    ));
    assert!(reports[1..].iter().all(|r| r.passed));
}
