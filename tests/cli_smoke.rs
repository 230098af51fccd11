use std::process::Command;

use tempfile::tempdir;

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct Response {
    trait_scores: std::collections::BTreeMap<String, f64>,
    mbti_code: String,
    persona_id: String,
    confidence: f64,
}

#[derive(Debug, serde::Deserialize)]
struct EvalOutcome {
    case_name: String,
    validity_flag: Option<String>,
    persona_id: String,
    deterministic: bool,
    digest: String,
}

fn ocean() -> Command {
    Command::new(env!("CARGO_BIN_EXE_ocean"))
}

fn uniform_request(value: i64) -> serde_json::Value {
    let mut answers = serde_json::Map::new();
    for t in ["O", "C", "E", "A", "N"] {
        for n in 1..=36 {
            answers.insert(format!("{t}{n}"), serde_json::json!(value));
        }
    }
    serde_json::json!({ "answers": answers })
}

#[test]
fn cli_score_writes_contract_response() {
    let dir = tempdir().unwrap();
    let req_path = dir.path().join("request.json");
    let out_path = dir.path().join("response.json");
    std::fs::write(&req_path, uniform_request(5).to_string()).unwrap();

    let status = ocean()
        .arg("score")
        .arg("--request")
        .arg(&req_path)
        .arg("--out")
        .arg(&out_path)
        .status()
        .unwrap();
    assert!(status.success());

    let resp: Response =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(resp.persona_id, "inconsistent_responder");
    assert_eq!(resp.confidence, 1.0);
    assert_eq!(resp.mbti_code, "ENFJ");
    assert_eq!(resp.trait_scores.len(), 5);
    assert!(resp.trait_scores.values().all(|&v| v == 0.5));
}

#[test]
fn cli_score_rejects_out_of_range_answers() {
    let dir = tempdir().unwrap();
    let req_path = dir.path().join("request.json");
    std::fs::write(&req_path, r#"{"answers": {"O1": 3, "O2": 7}}"#).unwrap();

    let output = ocean()
        .arg("score")
        .arg("--request")
        .arg(&req_path)
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("O2"), "stderr: {stderr}");
}

#[test]
fn cli_eval_smoke_and_determinism() {
    let run = || {
        let dir = tempdir().unwrap();
        let out = dir.path().join("eval.jsonl");
        let status = ocean()
            .args(["eval", "--out"])
            .arg(&out)
            .status()
            .unwrap();
        assert!(status.success());
        let raw = std::fs::read_to_string(&out).unwrap();
        raw.lines()
            .map(|l| serde_json::from_str::<EvalOutcome>(l).unwrap())
            .collect::<Vec<_>>()
    };

    let a = run();
    let b = run();
    assert_eq!(a.len(), b.len());
    assert!(!a.is_empty());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.case_name, y.case_name);
        assert_eq!(x.digest, y.digest);
        assert!(x.deterministic);
    }

    let uniform = a.iter().find(|o| o.case_name == "uniform_5").unwrap();
    assert_eq!(uniform.validity_flag.as_deref(), Some("uniform"));
    assert_eq!(uniform.persona_id, "inconsistent_responder");

    let alternating = a.iter().find(|o| o.case_name == "alternating_1_5").unwrap();
    assert_eq!(alternating.validity_flag, None);
    assert_ne!(alternating.persona_id, "inconsistent_responder");
}

#[test]
fn cli_parity_export_then_check_passes() {
    let dir = tempdir().unwrap();
    let cases = dir.path().join("cases.jsonl");
    let report = dir.path().join("report.jsonl");

    let status = ocean()
        .args(["parity-export", "--out"])
        .arg(&cases)
        .status()
        .unwrap();
    assert!(status.success());

    let status = ocean()
        .args(["parity", "--cases"])
        .arg(&cases)
        .arg("--out")
        .arg(&report)
        .status()
        .unwrap();
    assert!(status.success());

    let raw = std::fs::read_to_string(&report).unwrap();
    for line in raw.lines() {
        let v: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(v["passed"], true);
    }
}

#[test]
fn cli_personas_list_marks_diagnostic() {
    let output = ocean().args(["personas", "list"]).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("inconsistent_responder"));
    assert!(stdout.contains("(diagnostic)"));
    assert!(stdout.lines().count() >= 2);
}

#[test]
fn cli_config_overrides_quiz_type_in_record() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.json");
    let req_path = dir.path().join("request.json");
    std::fs::write(&config, r#"{"quiz_type": "big_five_short"}"#).unwrap();
    std::fs::write(&req_path, r#"{"answers": {"O1": 1, "C1": 5, "E1": 2}}"#).unwrap();

    let output = ocean()
        .arg("--config")
        .arg(&config)
        .args(["score", "--record", "--request"])
        .arg(&req_path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["metadata"]["quizType"], "big_five_short");
    assert_eq!(v["rawAnswers"]["C1"], 5);
}
