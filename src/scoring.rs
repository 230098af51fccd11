//! Reverse scoring, weighted aggregation, and 0..=100 normalization.
//!
//! Summation happens in answer-map order with plain `f64` arithmetic and no
//! reordering, so another engine that walks the same document in the same
//! order lands on the same bits.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use crate::bank::QuestionBank;
use crate::model::{AnswerMap, OceanScores, TraitConfidence, TraitTable, LIKERT_MAX, LIKERT_MIN};

/// Raw mean reserved for "nothing was aggregated".
pub const NO_DATA: f64 = 0.0;

// ------------------------------------------------------------------
// Reverse scoring
// ------------------------------------------------------------------

/// Flip a response on the 1..=5 scale. Self-inverse.
pub fn reverse_response(response: i64) -> i64 {
    LIKERT_MIN + LIKERT_MAX - response
}

/// Apply reverse keying. Ids missing from the bank pass through unchanged.
pub fn reverse_score(answers: &AnswerMap, bank: &QuestionBank) -> AnswerMap {
    let mut out = AnswerMap::with_capacity(answers.len());
    for (id, response) in answers.iter() {
        let corrected = match bank.get(id) {
            Some(q) if q.reverse => reverse_response(response),
            Some(_) => response,
            None => {
                debug!(question_id = %id, "Unknown question id; passing response through");
                response
            }
        };
        out.insert(id, corrected);
    }
    out
}

// ------------------------------------------------------------------
// Aggregation
// ------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    weighted_sum: f64,
    weight: f64,
}

impl Accumulator {
    fn add(&mut self, weight: f64, response: f64) {
        self.weighted_sum += weight * response;
        self.weight += weight;
    }

    fn mean(&self) -> f64 {
        if self.weight > 0.0 {
            self.weighted_sum / self.weight
        } else {
            NO_DATA
        }
    }
}

/// Raw weighted means on the 1..=5 scale (`NO_DATA` where nothing was answered).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawAggregate {
    pub trait_means: TraitTable<f64>,
    pub facet_means: BTreeMap<String, f64>,
    /// Answered weight per trait.
    pub trait_counts: TraitTable<f64>,
    /// Answered questions per trait.
    pub trait_items: TraitTable<usize>,
    /// Answer ids that were not found in the bank.
    pub skipped: Vec<String>,
}

/// Single pass over reverse-corrected answers, accumulating by trait and by facet.
pub fn aggregate(corrected: &AnswerMap, bank: &QuestionBank) -> RawAggregate {
    let mut traits = TraitTable::<Accumulator>::default();
    let mut items = TraitTable::<usize>::default();
    let mut facets: BTreeMap<String, Accumulator> = BTreeMap::new();
    let mut skipped = Vec::new();

    for (id, response) in corrected.iter() {
        let Some(q) = bank.get(id) else {
            warn!(question_id = %id, "Answer references unknown question; skipping");
            skipped.push(id.to_string());
            continue;
        };
        let r = response as f64;
        traits[q.trait_code].add(q.weight, r);
        items[q.trait_code] += 1;
        facets.entry(q.facet.clone()).or_default().add(q.weight, r);
    }

    RawAggregate {
        trait_means: traits.map(|_, acc| acc.mean()),
        facet_means: facets.into_iter().map(|(f, acc)| (f, acc.mean())).collect(),
        trait_counts: traits.map(|_, acc| acc.weight),
        trait_items: items,
        skipped,
    }
}

// ------------------------------------------------------------------
// Normalization
// ------------------------------------------------------------------

/// Map a raw 1..=5 mean onto 0..=100.
///
/// A raw mean of exactly `NO_DATA` maps to 0 instead of -25. A trait answered
/// entirely with 1s also maps to 0, so the two cases are indistinguishable here;
/// use the confidence value to tell them apart.
///
/// Clamped to 0..=100: a weighted mean of all-5 responses with fractional
/// weights can land a few ulps above 5.
pub fn normalize_mean(raw: f64) -> f64 {
    if raw == NO_DATA {
        return 0.0;
    }
    (((raw - 1.0) / 4.0) * 100.0).clamp(0.0, 100.0)
}

/// Answered weight over total catalog weight, clamped to 0..=1; 0 when the
/// bank has no items for the trait.
///
/// The two sums run in different orders (answers vs. catalog), so the raw
/// ratio for a fully answered trait can miss 1 by an ulp either way.
pub fn trait_confidence(answered_weight: f64, catalog_weight: f64) -> f64 {
    if catalog_weight > 0.0 {
        (answered_weight / catalog_weight).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedScores {
    /// 0..=100 per trait.
    pub traits: OceanScores,
    /// 0..=100 per facet; only facets that received answers.
    pub facets: BTreeMap<String, f64>,
    /// 0..=1 assessment completeness per trait.
    pub confidence: TraitConfidence,
}

pub fn normalize(raw: &RawAggregate, bank: &QuestionBank) -> NormalizedScores {
    NormalizedScores {
        traits: raw.trait_means.map(|_, &m| normalize_mean(m)),
        facets: raw
            .facet_means
            .iter()
            .map(|(f, &m)| (f.clone(), normalize_mean(m)))
            .collect(),
        confidence: raw.trait_counts.map(|t, &w| {
            let catalog_items = bank.question_count(t);
            if catalog_items > 0 && raw.trait_items[t] == catalog_items {
                1.0
            } else {
                trait_confidence(w, bank.total_weight(t))
            }
        }),
    }
}

/// Reverse → aggregate → normalize.
pub fn score_answers(answers: &AnswerMap, bank: &QuestionBank) -> (RawAggregate, NormalizedScores) {
    let corrected = reverse_score(answers, bank);
    let raw = aggregate(&corrected, bank);
    let normalized = normalize(&raw, bank);
    (raw, normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_endpoints() {
        assert_eq!(normalize_mean(1.0), 0.0);
        assert_eq!(normalize_mean(3.0), 50.0);
        assert_eq!(normalize_mean(5.0), 100.0);
        assert_eq!(normalize_mean(NO_DATA), 0.0);
    }

    #[test]
    fn reverse_is_involution() {
        for r in LIKERT_MIN..=LIKERT_MAX {
            assert_eq!(reverse_response(reverse_response(r)), r);
        }
        assert_eq!(reverse_response(1), 5);
        assert_eq!(reverse_response(3), 3);
    }

    #[test]
    fn confidence_zero_catalog_weight() {
        assert_eq!(trait_confidence(0.0, 0.0), 0.0);
        assert_eq!(trait_confidence(3.0, 6.0), 0.5);
    }

    #[test]
    fn ratios_past_the_bounds_are_clamped() {
        assert_eq!(trait_confidence(0.1 + 0.2 + 0.3, 0.3 + 0.2 + 0.1), 1.0);
        assert_eq!(normalize_mean(5.000_000_000_000_001), 100.0);
    }
}
