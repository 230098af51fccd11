#![forbid(unsafe_code)]

//! # ocean-engine
//!
//! Deterministic scoring core for Big Five ("OCEAN") personality assessments.
//!
//! Raw 1–5 Likert answers are reverse-keyed, aggregated into weighted trait and
//! facet means, normalized onto 0–100, and classified two ways: a four-letter
//! type code resolved per dimension, and a best-fit persona from a catalog of
//! range-defined archetypes. A validity screen catches straight-lined answer
//! sets before persona matching and returns a dedicated diagnostic persona.
//!
//! Everything here is a pure function of `(answers, question bank, persona
//! catalog, parameters)`. Summation order and tie-breaking are fixed so that
//! independent engines fed the same input agree to within `1e-3` on trait
//! scores and exactly on type codes; see [`parity`].

pub mod bank;
pub mod config;
pub mod engine;
pub mod model;
pub mod parity;
pub mod persona;
pub mod scoring;
pub mod simulation;
pub mod type_code;
pub mod validity;

pub use bank::{BankError, QuestionBank};
pub use config::{load_config_from_path, ConfigError, EngineConfig};
pub use engine::{
    validate_answers, AssessmentRecord, EngineError, ScoringEngine, ScoringError, ScoringReport,
    ScoringRequest, ScoringResponse, ValidationError, ENGINE_VERSION,
};
pub use model::{AnswerMap, OceanScores, Question, ScoreRange, Trait, TraitConfidence, TraitTable};
pub use persona::{
    match_persona, CatalogError, MatchParams, MatchResult, Persona, PersonaCatalog,
    DIAGNOSTIC_PERSONA_ID,
};
pub use type_code::{resolve_type_code, TypeCode};
pub use validity::{screen_answers, ValidityFlag, ValidityParams, ValidityReport};
