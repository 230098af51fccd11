//! Question bank: the immutable item catalog answers are scored against.
//!
//! The bank owns the per-trait total catalog weight used for confidence, so it
//! is computed once per bank rather than once per assessment.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::model::{Question, Trait, TraitTable};

/// Facets of the built-in bank, six per trait.
const BUILTIN_FACETS: [(Trait, [&str; 6]); 5] = [
    (
        Trait::Openness,
        [
            "imagination",
            "artistic_interests",
            "emotionality",
            "adventurousness",
            "intellect",
            "liberalism",
        ],
    ),
    (
        Trait::Conscientiousness,
        [
            "self_efficacy",
            "orderliness",
            "dutifulness",
            "achievement_striving",
            "self_discipline",
            "cautiousness",
        ],
    ),
    (
        Trait::Extraversion,
        [
            "friendliness",
            "gregariousness",
            "assertiveness",
            "activity_level",
            "excitement_seeking",
            "cheerfulness",
        ],
    ),
    (
        Trait::Agreeableness,
        ["trust", "morality", "altruism", "cooperation", "modesty", "sympathy"],
    ),
    (
        Trait::Neuroticism,
        ["anxiety", "anger", "depression", "self_consciousness", "immoderation", "vulnerability"],
    ),
];

const BUILTIN_ITEMS_PER_FACET: usize = 6;

static BUILTIN_BANK: Lazy<QuestionBank> =
    Lazy::new(|| QuestionBank::assemble(builtin_questions()));

#[derive(Debug, thiserror::Error)]
pub enum BankError {
    #[error("question bank is empty")]
    Empty,
    #[error("question id must be non-empty (index {index})")]
    EmptyId { index: usize },
    #[error("duplicate question id '{id}'")]
    DuplicateId { id: String },
    #[error("question '{id}' has invalid weight {weight}; weights must be finite and > 0")]
    InvalidWeight { id: String, weight: f64 },
    #[error("question '{id}' has an empty facet label")]
    EmptyFacet { id: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse question bank: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionBankFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone)]
pub struct QuestionBank {
    questions: Vec<Question>,
    index: HashMap<String, usize>,
    total_weight: TraitTable<f64>,
    question_count: TraitTable<usize>,
}

impl QuestionBank {
    /// Validate and index a question list.
    pub fn new(questions: Vec<Question>) -> Result<Self, BankError> {
        validate_questions(&questions)?;
        Ok(Self::assemble(questions))
    }

    /// The bundled 180-item bank.
    pub fn builtin() -> &'static QuestionBank {
        &BUILTIN_BANK
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, BankError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let file: QuestionBankFile = serde_json::from_str(&raw)?;
        Self::new(file.questions)
    }

    fn assemble(questions: Vec<Question>) -> Self {
        let index = questions
            .iter()
            .enumerate()
            .map(|(i, q)| (q.id.clone(), i))
            .collect();
        // Catalog order, not answer order: this total does not depend on the respondent.
        let mut total_weight = TraitTable::<f64>::default();
        let mut question_count = TraitTable::<usize>::default();
        for q in &questions {
            total_weight[q.trait_code] += q.weight;
            question_count[q.trait_code] += 1;
        }
        Self {
            questions,
            index,
            total_weight,
            question_count,
        }
    }

    pub fn get(&self, id: &str) -> Option<&Question> {
        self.index.get(id).map(|&i| &self.questions[i])
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Sum of `weight` over every catalog question of `t`, answered or not.
    pub fn total_weight(&self, t: Trait) -> f64 {
        self.total_weight[t]
    }

    /// Number of catalog questions loading on `t`.
    pub fn question_count(&self, t: Trait) -> usize {
        self.question_count[t]
    }

    pub fn to_file(&self, name: Option<String>) -> QuestionBankFile {
        QuestionBankFile {
            name,
            questions: self.questions.clone(),
        }
    }

    pub fn stats(&self) -> BankStats {
        let mut traits: BTreeMap<String, TraitBankStats> = Trait::ALL
            .into_iter()
            .map(|t| {
                let stats = TraitBankStats {
                    name: t.name().to_string(),
                    questions: self.question_count(t),
                    total_weight: self.total_weight(t),
                    ..TraitBankStats::default()
                };
                (t.code().to_string(), stats)
            })
            .collect();
        for q in &self.questions {
            let entry = traits.entry(q.trait_code.code().to_string()).or_default();
            if q.reverse {
                entry.reverse_keyed += 1;
            }
            if !entry.facets.contains(&q.facet) {
                entry.facets.push(q.facet.clone());
            }
        }
        BankStats {
            questions: self.questions.len(),
            traits,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TraitBankStats {
    pub name: String,
    pub questions: usize,
    pub reverse_keyed: usize,
    pub total_weight: f64,
    pub facets: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BankStats {
    pub questions: usize,
    pub traits: BTreeMap<String, TraitBankStats>,
}

fn validate_questions(questions: &[Question]) -> Result<(), BankError> {
    if questions.is_empty() {
        return Err(BankError::Empty);
    }
    let mut seen: HashSet<&str> = HashSet::with_capacity(questions.len());
    for (index, q) in questions.iter().enumerate() {
        if q.id.trim().is_empty() {
            return Err(BankError::EmptyId { index });
        }
        if !seen.insert(q.id.as_str()) {
            return Err(BankError::DuplicateId { id: q.id.clone() });
        }
        if !q.weight.is_finite() || q.weight <= 0.0 {
            return Err(BankError::InvalidWeight {
                id: q.id.clone(),
                weight: q.weight,
            });
        }
        if q.facet.trim().is_empty() {
            return Err(BankError::EmptyFacet { id: q.id.clone() });
        }
    }
    Ok(())
}

/// Items are numbered per trait (`O1`..`O36`); odd positions within a facet are reverse-keyed.
fn builtin_questions() -> Vec<Question> {
    let mut questions = Vec::with_capacity(BUILTIN_FACETS.len() * 6 * BUILTIN_ITEMS_PER_FACET);
    for (t, facets) in BUILTIN_FACETS {
        let mut n = 0;
        for facet in facets {
            for item in 0..BUILTIN_ITEMS_PER_FACET {
                n += 1;
                let q = Question::new(format!("{}{}", t.code(), n), t, facet);
                questions.push(if item % 2 == 1 { q.reversed() } else { q });
            }
        }
    }
    questions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_bank_shape() {
        let bank = QuestionBank::builtin();
        assert_eq!(bank.len(), 180);
        for t in Trait::ALL {
            assert_eq!(bank.total_weight(t), 36.0);
        }
        let reversed = bank.questions().iter().filter(|q| q.reverse).count();
        assert_eq!(reversed, 90);
        assert!(bank.get("O1").is_some_and(|q| !q.reverse));
        assert!(bank.get("O2").is_some_and(|q| q.reverse));
        assert!(bank.get("N36").is_some());
    }

    #[test]
    fn stats_report_named_traits() {
        let stats = QuestionBank::builtin().stats();
        assert_eq!(stats.questions, 180);
        let openness = &stats.traits["O"];
        assert_eq!(openness.name, "openness");
        assert_eq!(openness.questions, 36);
        assert_eq!(openness.reverse_keyed, 18);
        assert_eq!(openness.total_weight, 36.0);
        assert_eq!(openness.facets.len(), 6);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let qs = vec![
            Question::new("x", Trait::Openness, "f"),
            Question::new("x", Trait::Neuroticism, "g"),
        ];
        assert!(matches!(QuestionBank::new(qs), Err(BankError::DuplicateId { .. })));
    }

    #[test]
    fn rejects_non_positive_weight() {
        let qs = vec![Question::new("x", Trait::Openness, "f").weight(0.0)];
        assert!(matches!(QuestionBank::new(qs), Err(BankError::InvalidWeight { .. })));
    }
}
