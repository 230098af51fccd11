//! Cross-engine parity checks.
//!
//! Two engines agree on a case when every trait score (0..=1 scale) is within
//! the tolerance and the type codes are identical. Persona ids are compared
//! too but only reported; they are not part of the agreement contract.

use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{ScoringEngine, ScoringResponse};
use crate::model::{AnswerMap, Trait};
use crate::type_code::TypeCode;

/// Maximum absolute trait-score difference on the 0..=1 scale.
pub const TRAIT_TOLERANCE: f64 = 1e-3;

#[derive(Debug, thiserror::Error)]
pub enum ParityError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// A reference answer set and the response another engine produced for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParityCase {
    pub name: String,
    pub answers: AnswerMap,
    pub expected: ScoringResponse,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParityMismatch {
    TraitScore {
        #[serde(rename = "trait")]
        trait_code: Trait,
        expected: f64,
        actual: f64,
        delta: f64,
    },
    TypeCode {
        expected: TypeCode,
        actual: TypeCode,
    },
    ScoringFailed {
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParityReport {
    pub case_name: String,
    pub passed: bool,
    pub max_trait_delta: f64,
    pub persona_agrees: bool,
    pub mismatches: Vec<ParityMismatch>,
    /// Digest of the locally computed response, when scoring succeeded.
    pub digest: Option<String>,
}

/// blake3 hex digest of a response's canonical JSON encoding.
///
/// Equal digests mean byte-identical serialized output.
pub fn response_digest(response: &ScoringResponse) -> Result<String, serde_json::Error> {
    let bytes = serde_json::to_vec(response)?;
    Ok(blake3::hash(&bytes).to_hex().to_string())
}

pub fn compare_responses(
    case_name: &str,
    expected: &ScoringResponse,
    actual: &ScoringResponse,
    tolerance: f64,
) -> ParityReport {
    let mut mismatches = Vec::new();
    let mut max_trait_delta: f64 = 0.0;
    for t in Trait::ALL {
        let (e, a) = (expected.trait_scores[t], actual.trait_scores[t]);
        let delta = (e - a).abs();
        max_trait_delta = max_trait_delta.max(delta);
        if delta.is_nan() || delta > tolerance {
            mismatches.push(ParityMismatch::TraitScore {
                trait_code: t,
                expected: e,
                actual: a,
                delta,
            });
        }
    }
    if expected.mbti_code != actual.mbti_code {
        mismatches.push(ParityMismatch::TypeCode {
            expected: expected.mbti_code,
            actual: actual.mbti_code,
        });
    }
    ParityReport {
        case_name: case_name.to_string(),
        passed: mismatches.is_empty(),
        max_trait_delta,
        persona_agrees: expected.persona_id == actual.persona_id,
        mismatches,
        digest: response_digest(actual).ok(),
    }
}

/// Score one case locally and compare against its expected response.
pub fn check_case(engine: &ScoringEngine, case: &ParityCase, tolerance: f64) -> ParityReport {
    match engine.score(&case.answers) {
        Ok(report) => compare_responses(&case.name, &case.expected, &report.response, tolerance),
        Err(e) => ParityReport {
            case_name: case.name.clone(),
            passed: false,
            max_trait_delta: f64::NAN,
            persona_agrees: false,
            mismatches: vec![ParityMismatch::ScoringFailed {
                error: e.to_string(),
            }],
            digest: None,
        },
    }
}

pub fn run_parity_cases(
    engine: &ScoringEngine,
    cases: &[ParityCase],
    tolerance: f64,
) -> Vec<ParityReport> {
    cases
        .iter()
        .map(|case| check_case(engine, case, tolerance))
        .collect()
}

/// Read one `ParityCase` per non-blank line.
pub fn load_cases_jsonl(path: impl AsRef<Path>) -> Result<Vec<ParityCase>, ParityError> {
    let file = std::fs::File::open(path.as_ref())?;
    let mut cases = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let case = serde_json::from_str(&line).map_err(|source| ParityError::Parse {
            line: idx + 1,
            source,
        })?;
        cases.push(case);
    }
    Ok(cases)
}
