//! Straight-lining screen over raw (pre-reverse) responses.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::AnswerMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidityParams {
    /// Population standard deviation below which answers are flagged.
    pub min_stddev: f64,
}

impl Default for ValidityParams {
    fn default() -> Self {
        Self { min_stddev: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidityFlag {
    /// Every response has the same value.
    Uniform,
    /// Responses vary, but not enough.
    LowVariance,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidityReport {
    pub flag: Option<ValidityFlag>,
    pub distinct_values: usize,
    pub mean: Option<f64>,
    pub stddev: Option<f64>,
}

impl ValidityReport {
    pub fn is_invalid(&self) -> bool {
        self.flag.is_some()
    }
}

/// Population mean and standard deviation, summed in input order. `None` when empty.
pub fn population_stats(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    Some((mean, var.sqrt()))
}

/// Flag uniform or near-uniform answer sets.
///
/// An empty answer set is not flagged: there is no pattern to judge, and it
/// scores as an all-zero profile downstream.
pub fn screen_answers(answers: &AnswerMap, params: &ValidityParams) -> ValidityReport {
    let distinct: BTreeSet<i64> = answers.values().collect();
    let values: Vec<f64> = answers.values().map(|r| r as f64).collect();
    let stats = population_stats(&values);

    let flag = if distinct.len() == 1 {
        Some(ValidityFlag::Uniform)
    } else {
        match stats {
            Some((_, stddev)) if stddev < params.min_stddev => Some(ValidityFlag::LowVariance),
            _ => None,
        }
    };

    if let Some(flag) = flag {
        debug!(
            ?flag,
            answers = answers.len(),
            distinct = distinct.len(),
            "Answer pattern failed validity screen"
        );
    }

    ValidityReport {
        flag,
        distinct_values: distinct.len(),
        mean: stats.map(|(m, _)| m),
        stddev: stats.map(|(_, s)| s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_stats_matches_hand_computation() {
        let (mean, sd) = population_stats(&[1.0, 5.0, 1.0, 5.0]).unwrap();
        assert_eq!(mean, 3.0);
        assert_eq!(sd, 2.0);
        assert!(population_stats(&[]).is_none());
    }
}
