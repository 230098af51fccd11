//! Scoring pipeline: validate → screen → score → classify → match.
//!
//! `ScoringEngine` holds only immutable tables and parameters. Every call
//! builds its accumulators from scratch, so one engine can serve concurrent
//! requests without sharing intermediate state.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bank::{BankError, QuestionBank};
use crate::config::{ConfigError, EngineConfig};
use crate::model::{AnswerMap, OceanScores, LIKERT_MAX, LIKERT_MIN};
use crate::persona::{
    diagnostic_match, rank_candidates, select_match, CandidateScore, CatalogError, MatchParams,
    MatchResult, PersonaCatalog,
};
use crate::scoring::{score_answers, NormalizedScores, RawAggregate};
use crate::type_code::{resolve_type_code, TypeCode};
use crate::validity::{screen_answers, ValidityParams, ValidityReport};

/// Version stamped into persisted assessment metadata.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("response {value} for question '{question_id}' is outside [1, 5]")]
    OutOfRange { question_id: String, value: i64 },
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("invalid answers: {0}")]
    Validation(#[from] ValidationError),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("question bank error: {0}")]
    Bank(#[from] BankError),
    #[error("persona catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Reject responses outside the Likert scale. The core never clamps.
pub fn validate_answers(answers: &AnswerMap) -> Result<(), ValidationError> {
    for (id, value) in answers.iter() {
        if !(LIKERT_MIN..=LIKERT_MAX).contains(&value) {
            return Err(ValidationError::OutOfRange {
                question_id: id.to_string(),
                value,
            });
        }
    }
    Ok(())
}

// =============================================================================
// Request / response shapes
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRequest {
    pub answers: AnswerMap,
}

/// The contract consumed by the surrounding application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringResponse {
    /// Trait scores as 0..=1 fractions.
    pub trait_scores: OceanScores,
    /// Facet scores on the 0..=100 scale.
    pub facet_scores: BTreeMap<String, f64>,
    pub mbti_code: TypeCode,
    pub persona_id: String,
    /// Persona match confidence as a 0..=1 fraction.
    pub confidence: f64,
}

/// Everything the pipeline computed for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringReport {
    pub response: ScoringResponse,
    pub raw: RawAggregate,
    pub normalized: NormalizedScores,
    pub validity: ValidityReport,
    #[serde(rename = "match")]
    pub matched: MatchResult,
    /// Ranked candidates; empty when the validity screen short-circuited matching.
    pub candidates: Vec<CandidateScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    pub engine_version: String,
    pub quiz_type: String,
}

/// The shape storage persists for a completed assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentRecord {
    pub raw_answers: AnswerMap,
    pub result: ScoringResponse,
    pub metadata: RecordMetadata,
    pub scored_at: DateTime<Utc>,
}

// =============================================================================
// Engine
// =============================================================================

#[derive(Debug, Clone)]
pub struct ScoringEngine {
    bank: Arc<QuestionBank>,
    catalog: Arc<PersonaCatalog>,
    matching: MatchParams,
    validity: ValidityParams,
    quiz_type: String,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(
            Arc::new(QuestionBank::builtin().clone()),
            Arc::new(PersonaCatalog::builtin().clone()),
        )
    }
}

impl ScoringEngine {
    pub fn new(bank: Arc<QuestionBank>, catalog: Arc<PersonaCatalog>) -> Self {
        let defaults = EngineConfig::default();
        Self {
            bank,
            catalog,
            matching: defaults.matching,
            validity: defaults.validity,
            quiz_type: defaults.quiz_type,
        }
    }

    /// Build from config, loading bank/catalog files when configured.
    pub fn from_config(config: &EngineConfig) -> Result<Self, EngineError> {
        crate::config::validate_config(config)?;
        let bank = match &config.question_bank {
            Some(path) => QuestionBank::load_from_path(path)?,
            None => QuestionBank::builtin().clone(),
        };
        let catalog = match &config.persona_catalog {
            Some(path) => PersonaCatalog::load_from_path(path)?,
            None => PersonaCatalog::builtin().clone(),
        };
        Ok(Self {
            bank: Arc::new(bank),
            catalog: Arc::new(catalog),
            matching: config.matching,
            validity: config.validity,
            quiz_type: config.quiz_type.clone(),
        })
    }

    pub fn with_match_params(mut self, params: MatchParams) -> Self {
        self.matching = params;
        self
    }

    pub fn with_validity_params(mut self, params: ValidityParams) -> Self {
        self.validity = params;
        self
    }

    pub fn with_quiz_type(mut self, quiz_type: impl Into<String>) -> Self {
        self.quiz_type = quiz_type.into();
        self
    }

    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    pub fn catalog(&self) -> &PersonaCatalog {
        &self.catalog
    }

    /// Run the full pipeline.
    pub fn score(&self, answers: &AnswerMap) -> Result<ScoringReport, ScoringError> {
        validate_answers(answers)?;

        // Runs on raw answers, before reverse keying, and gates matching.
        let validity = screen_answers(answers, &self.validity);

        let (raw, normalized) = score_answers(answers, &self.bank);
        let mbti_code = resolve_type_code(&normalized.traits, &normalized.confidence);

        let (matched, candidates) = if validity.is_invalid() {
            (diagnostic_match(&self.catalog), Vec::new())
        } else {
            let ranked = rank_candidates(&normalized.traits, &self.catalog, &self.matching);
            let matched = select_match(&ranked, &self.catalog, &self.matching)
                .unwrap_or_else(|| diagnostic_match(&self.catalog));
            (matched, ranked)
        };

        debug!(
            persona_id = %matched.persona.id,
            type_code = %mbti_code,
            answers = answers.len(),
            skipped = raw.skipped.len(),
            "Scored assessment"
        );

        let response = ScoringResponse {
            trait_scores: normalized.traits.map(|_, &s| s / 100.0),
            facet_scores: normalized.facets.clone(),
            mbti_code,
            persona_id: matched.persona.id.clone(),
            confidence: f64::from(matched.confidence_score) / 100.0,
        };

        Ok(ScoringReport {
            response,
            raw,
            normalized,
            validity,
            matched,
            candidates,
        })
    }

    pub fn respond(&self, request: &ScoringRequest) -> Result<ScoringResponse, ScoringError> {
        Ok(self.score(&request.answers)?.response)
    }

    /// Score and wrap the result in the persisted-record shape.
    pub fn record(
        &self,
        answers: &AnswerMap,
        scored_at: DateTime<Utc>,
    ) -> Result<AssessmentRecord, ScoringError> {
        let result = self.score(answers)?.response;
        Ok(AssessmentRecord {
            raw_answers: answers.clone(),
            result,
            metadata: RecordMetadata {
                engine_version: ENGINE_VERSION.to_string(),
                quiz_type: self.quiz_type.clone(),
            },
            scored_at,
        })
    }
}
