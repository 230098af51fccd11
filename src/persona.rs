//! Persona catalog and range-box matching.
//!
//! A persona is a box in trait space: one `[min, max]` range per trait. A
//! profile is scored against every non-diagnostic persona by counting the
//! traits that fall inside the box (`hits`) and accumulating a distance
//! penalty (`proximity`). The best candidate has the most hits, then the
//! smallest proximity; catalog order breaks exact ties.

use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{OceanScores, ScoreRange, Trait, TraitTable};

/// Id of the reserved persona returned when the validity screen fires.
pub const DIAGNOSTIC_PERSONA_ID: &str = "inconsistent_responder";

/// Number of traits a persona can hit.
pub const MAX_HITS: u8 = 5;

static BUILTIN_CATALOG: Lazy<PersonaCatalog> =
    Lazy::new(|| PersonaCatalog::assemble(builtin_personas()));

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub title: String,
    pub ranges: TraitTable<ScoreRange>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub growth: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl Persona {
    pub fn is_diagnostic(&self) -> bool {
        self.id == DIAGNOSTIC_PERSONA_ID
    }

    /// The profile sitting at the centre of every range.
    pub fn midpoint_profile(&self) -> OceanScores {
        self.ranges.map(|_, r| r.midpoint())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("persona catalog has no matchable personas")]
    NoCandidates,
    #[error("persona catalog is missing the reserved 'inconsistent_responder' persona")]
    MissingDiagnostic,
    #[error("duplicate persona id '{id}'")]
    DuplicateId { id: String },
    #[error("persona '{id}' has invalid range [{min}, {max}] for trait {trait_code}")]
    InvalidRange {
        id: String,
        trait_code: Trait,
        min: f64,
        max: f64,
    },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse persona catalog: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaCatalogFile {
    pub personas: Vec<Persona>,
}

/// Immutable persona table. Matching functions take it by reference.
#[derive(Debug, Clone)]
pub struct PersonaCatalog {
    personas: Vec<Persona>,
    diagnostic: usize,
}

impl PersonaCatalog {
    pub fn new(personas: Vec<Persona>) -> Result<Self, CatalogError> {
        validate_personas(&personas)?;
        Ok(Self::assemble(personas))
    }

    pub fn builtin() -> &'static PersonaCatalog {
        &BUILTIN_CATALOG
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let file: PersonaCatalogFile = serde_json::from_str(&raw)?;
        Self::new(file.personas)
    }

    fn assemble(personas: Vec<Persona>) -> Self {
        let diagnostic = personas
            .iter()
            .position(Persona::is_diagnostic)
            .unwrap_or(personas.len());
        Self {
            personas,
            diagnostic,
        }
    }

    pub fn all(&self) -> &[Persona] {
        &self.personas
    }

    pub fn get(&self, id: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.id == id)
    }

    /// Every persona except the reserved diagnostic one, in catalog order.
    pub fn candidates(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter().filter(|p| !p.is_diagnostic())
    }

    pub fn diagnostic(&self) -> Option<&Persona> {
        self.personas.get(self.diagnostic)
    }
}

fn validate_personas(personas: &[Persona]) -> Result<(), CatalogError> {
    let mut seen = HashSet::with_capacity(personas.len());
    for p in personas {
        if !seen.insert(p.id.as_str()) {
            return Err(CatalogError::DuplicateId { id: p.id.clone() });
        }
        for (t, r) in p.ranges.iter() {
            let in_bounds =
                r.min.is_finite() && r.max.is_finite() && r.min >= 0.0 && r.max <= 100.0;
            if !in_bounds || r.min > r.max {
                return Err(CatalogError::InvalidRange {
                    id: p.id.clone(),
                    trait_code: t,
                    min: r.min,
                    max: r.max,
                });
            }
        }
    }
    if !seen.contains(DIAGNOSTIC_PERSONA_ID) {
        return Err(CatalogError::MissingDiagnostic);
    }
    if seen.len() < 2 {
        return Err(CatalogError::NoCandidates);
    }
    Ok(())
}

// =============================================================================
// Matching
// =============================================================================

/// Matching constants. The defaults are the reference values; changing them
/// breaks parity with other engines.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchParams {
    /// Misses at most this far outside a range add their distance to proximity.
    pub near_miss_window: f64,
    /// Flat proximity penalty for misses beyond the window.
    pub miss_penalty: f64,
    /// Proximity at which the closeness component of confidence reaches zero.
    pub proximity_scale: f64,
    /// Share of confidence driven by hits; the rest comes from proximity.
    pub hit_weight: f64,
    /// Top-two proximity gap below which equal-hit candidates count as a tie.
    pub tie_window: f64,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            near_miss_window: 10.0,
            miss_penalty: 30.0,
            proximity_scale: 250.0,
            hit_weight: 0.75,
            tie_window: 20.0,
        }
    }
}

/// One persona's fit against a profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateScore {
    pub persona_id: String,
    pub hits: u8,
    pub proximity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub persona: Persona,
    /// 0..=100.
    pub confidence_score: u8,
    /// `None` for the diagnostic result.
    pub hits: Option<u8>,
    /// `None` for the diagnostic result.
    pub proximity: Option<f64>,
    pub tie: bool,
}

impl MatchResult {
    pub fn is_diagnostic(&self) -> bool {
        self.persona.is_diagnostic()
    }
}

/// Hits and proximity of `persona` for `scores`, accumulated in OCEAN order.
pub fn score_candidate(persona: &Persona, scores: &OceanScores, params: &MatchParams) -> (u8, f64) {
    let mut hits = 0u8;
    let mut proximity = 0.0;
    for t in Trait::ALL {
        let score = scores[t];
        let range = persona.ranges[t];
        if range.contains(score) {
            hits += 1;
            proximity += (score - range.midpoint()).abs();
        } else {
            let delta = range.distance_outside(score);
            if delta <= params.near_miss_window {
                proximity += delta;
            } else {
                proximity += params.miss_penalty;
            }
        }
    }
    (hits, proximity)
}

/// `round(100 * (w * hits/5 + (1 - w) * max(0, 1 - proximity/scale)))`.
pub fn confidence_score(hits: u8, proximity: f64, params: &MatchParams) -> u8 {
    let hit_part = params.hit_weight * f64::from(hits) / f64::from(MAX_HITS);
    let closeness = (1.0 - proximity / params.proximity_scale).max(0.0);
    let value = 100.0 * (hit_part + (1.0 - params.hit_weight) * closeness);
    value.round().clamp(0.0, 100.0) as u8
}

/// All candidates, best first: hits descending, then proximity ascending.
/// The sort is stable, so catalog order decides exact ties.
pub fn rank_candidates(
    scores: &OceanScores,
    catalog: &PersonaCatalog,
    params: &MatchParams,
) -> Vec<CandidateScore> {
    let mut ranked: Vec<CandidateScore> = catalog
        .candidates()
        .map(|p| {
            let (hits, proximity) = score_candidate(p, scores, params);
            CandidateScore {
                persona_id: p.id.clone(),
                hits,
                proximity,
            }
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.hits
            .cmp(&a.hits)
            .then_with(|| a.proximity.total_cmp(&b.proximity))
    });
    ranked
}

/// Pick the best persona for `scores` from an already ranked list.
pub fn select_match(
    ranked: &[CandidateScore],
    catalog: &PersonaCatalog,
    params: &MatchParams,
) -> Option<MatchResult> {
    let top = ranked.first()?;
    let persona = catalog.get(&top.persona_id)?.clone();
    let tie = match ranked.get(1) {
        Some(second) => {
            second.hits == top.hits && (top.proximity - second.proximity).abs() < params.tie_window
        }
        None => false,
    };
    if tie {
        debug!(
            persona_id = %top.persona_id,
            runner_up = %ranked[1].persona_id,
            "Persona match is a near tie"
        );
    }
    Some(MatchResult {
        persona,
        confidence_score: confidence_score(top.hits, top.proximity, params),
        hits: Some(top.hits),
        proximity: Some(top.proximity),
        tie,
    })
}

/// Range-match `scores` against the catalog's non-diagnostic personas.
///
/// Falls back to the diagnostic result only if the catalog has no candidates,
/// which a validated catalog never does.
pub fn match_persona(
    scores: &OceanScores,
    catalog: &PersonaCatalog,
    params: &MatchParams,
) -> MatchResult {
    let ranked = rank_candidates(scores, catalog, params);
    select_match(&ranked, catalog, params).unwrap_or_else(|| diagnostic_match(catalog))
}

/// The short-circuit result for invalid response patterns.
pub fn diagnostic_match(catalog: &PersonaCatalog) -> MatchResult {
    let persona = catalog
        .diagnostic()
        .cloned()
        .unwrap_or_else(diagnostic_persona);
    MatchResult {
        persona,
        confidence_score: 100,
        hits: None,
        proximity: None,
        tie: false,
    }
}

// =============================================================================
// Built-in catalog
// =============================================================================

fn ranges(
    o: (f64, f64),
    c: (f64, f64),
    e: (f64, f64),
    a: (f64, f64),
    n: (f64, f64),
) -> TraitTable<ScoreRange> {
    TraitTable {
        openness: o.into(),
        conscientiousness: c.into(),
        extraversion: e.into(),
        agreeableness: a.into(),
        neuroticism: n.into(),
    }
}

fn persona(
    id: &str,
    title: &str,
    ranges: TraitTable<ScoreRange>,
    strengths: &[&str],
    growth: &[&str],
    description: &str,
) -> Persona {
    Persona {
        id: id.to_string(),
        title: title.to_string(),
        ranges,
        strengths: strengths.iter().map(|s| s.to_string()).collect(),
        growth: growth.iter().map(|s| s.to_string()).collect(),
        description: description.to_string(),
    }
}

fn diagnostic_persona() -> Persona {
    persona(
        DIAGNOSTIC_PERSONA_ID,
        "Inconclusive Profile",
        ranges((0.0, 100.0), (0.0, 100.0), (0.0, 100.0), (0.0, 100.0), (0.0, 100.0)),
        &["Completed the assessment"],
        &[
            "Retake the assessment answering each statement on its own",
            "Use the full range of the scale where it fits",
        ],
        "The answers show too little variation to describe a personality profile. \
         This usually means the same response was chosen for most statements.",
    )
}

fn builtin_personas() -> Vec<Persona> {
    vec![
        persona(
            "architect",
            "The Architect",
            ranges((60.0, 100.0), (65.0, 100.0), (0.0, 45.0), (20.0, 60.0), (0.0, 45.0)),
            &["Systems thinking", "Long-range planning", "Independent judgment"],
            &["Sharing unfinished ideas", "Tolerating ambiguity in others"],
            "Builds coherent structures out of ideas and sees them through quietly.",
        ),
        persona(
            "catalyst",
            "The Catalyst",
            ranges((60.0, 100.0), (30.0, 70.0), (65.0, 100.0), (50.0, 90.0), (10.0, 50.0)),
            &["Energising groups", "Spotting possibilities", "Persuasion"],
            &["Finishing what was started", "Pacing commitments"],
            "Sparks momentum in people and projects by connecting ideas with enthusiasm.",
        ),
        persona(
            "guardian",
            "The Guardian",
            ranges((0.0, 45.0), (65.0, 100.0), (30.0, 70.0), (55.0, 95.0), (10.0, 50.0)),
            &["Reliability", "Loyalty", "Practical care"],
            &["Openness to unfamiliar approaches", "Delegating"],
            "Keeps commitments and protects the people and routines that depend on them.",
        ),
        persona(
            "explorer",
            "The Explorer",
            ranges((70.0, 100.0), (0.0, 45.0), (50.0, 90.0), (30.0, 70.0), (20.0, 60.0)),
            &["Curiosity", "Adaptability", "Comfort with novelty"],
            &["Follow-through", "Structure and routine"],
            "Drawn to new places, ideas, and experiences, and quick to adapt to them.",
        ),
        persona(
            "diplomat",
            "The Diplomat",
            ranges((45.0, 85.0), (45.0, 85.0), (40.0, 80.0), (70.0, 100.0), (10.0, 45.0)),
            &["Mediation", "Empathy", "Building consensus"],
            &["Stating disagreement directly", "Prioritising own needs"],
            "Finds common ground and keeps groups working together.",
        ),
        persona(
            "strategist",
            "The Strategist",
            ranges((55.0, 95.0), (60.0, 100.0), (45.0, 85.0), (10.0, 50.0), (0.0, 40.0)),
            &["Decisiveness", "Goal focus", "Composure under pressure"],
            &["Patience with slower consensus", "Acknowledging feelings"],
            "Sets direction, weighs trade-offs, and commits to a plan.",
        ),
        persona(
            "sage",
            "The Sage",
            ranges((65.0, 100.0), (40.0, 80.0), (0.0, 40.0), (50.0, 90.0), (20.0, 60.0)),
            &["Reflection", "Depth of understanding", "Thoughtful advice"],
            &["Acting before everything is understood", "Visibility in groups"],
            "Seeks understanding for its own sake and shares it with care.",
        ),
        persona(
            "anchor",
            "The Anchor",
            ranges((20.0, 60.0), (55.0, 95.0), (20.0, 60.0), (50.0, 90.0), (0.0, 35.0)),
            &["Steadiness", "Calm in crises", "Dependability"],
            &["Embracing change", "Voicing ambitions"],
            "A calm, steady presence others rely on when things get difficult.",
        ),
        persona(
            "maverick",
            "The Maverick",
            ranges((55.0, 95.0), (0.0, 40.0), (55.0, 100.0), (0.0, 45.0), (30.0, 75.0)),
            &["Originality", "Boldness", "Challenging assumptions"],
            &["Collaboration", "Consistency"],
            "Questions the rules and is willing to stand apart to try something new.",
        ),
        persona(
            "empath",
            "The Empath",
            ranges((50.0, 90.0), (30.0, 70.0), (25.0, 65.0), (70.0, 100.0), (50.0, 90.0)),
            &["Emotional insight", "Compassion", "Listening"],
            &["Setting boundaries", "Managing stress"],
            "Attuned to how others feel and moved to help.",
        ),
        persona(
            "sentinel",
            "The Sentinel",
            ranges((0.0, 40.0), (60.0, 100.0), (0.0, 45.0), (20.0, 60.0), (40.0, 80.0)),
            &["Vigilance", "Thoroughness", "Risk awareness"],
            &["Trusting the process", "Letting go of control"],
            "Anticipates what could go wrong and prepares for it.",
        ),
        persona(
            "performer",
            "The Performer",
            ranges((40.0, 80.0), (20.0, 60.0), (70.0, 100.0), (40.0, 80.0), (30.0, 70.0)),
            &["Expressiveness", "Warmth in groups", "Spontaneity"],
            &["Planning ahead", "Quiet focus"],
            "Brings energy and warmth to any room and thrives in the moment.",
        ),
        diagnostic_persona(),
    ]
}
