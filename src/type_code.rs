//! Four-letter type code derived from normalized trait scores.
//!
//! Each letter is resolved independently from one trait. The midpoint (50)
//! behaviour differs per dimension and lives in [`TYPE_CODE_RULES`]: three
//! dimensions snap to their high letter, while the intuition/sensing
//! dimension defers to the trait's confidence.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::model::{OceanScores, Trait, TraitConfidence};

/// Score at which a dimension is considered balanced.
pub const MIDPOINT: f64 = 50.0;

/// What a dimension does when its score is exactly [`MIDPOINT`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidpointRule {
    /// Resolve to the high letter.
    High,
    /// High letter iff the trait's confidence is strictly greater than `threshold`.
    Confidence { threshold: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DimensionRule {
    pub source: Trait,
    pub low: char,
    pub high: char,
    pub midpoint: MidpointRule,
}

/// Letter order is `IE`, `SN`, `TF`, `JP`.
pub const TYPE_CODE_RULES: [DimensionRule; 4] = [
    DimensionRule {
        source: Trait::Extraversion,
        low: 'I',
        high: 'E',
        midpoint: MidpointRule::High,
    },
    DimensionRule {
        source: Trait::Openness,
        low: 'S',
        high: 'N',
        midpoint: MidpointRule::Confidence { threshold: 0.5 },
    },
    DimensionRule {
        source: Trait::Agreeableness,
        low: 'T',
        high: 'F',
        midpoint: MidpointRule::High,
    },
    DimensionRule {
        source: Trait::Conscientiousness,
        low: 'P',
        high: 'J',
        midpoint: MidpointRule::High,
    },
];

impl DimensionRule {
    pub fn resolve(&self, score: f64, confidence: f64) -> char {
        if score > MIDPOINT {
            return self.high;
        }
        if score < MIDPOINT {
            return self.low;
        }
        match self.midpoint {
            MidpointRule::High => self.high,
            MidpointRule::Confidence { threshold } => {
                if confidence > threshold {
                    self.high
                } else {
                    self.low
                }
            }
        }
    }
}

/// A resolved four-letter code such as `ENFJ`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeCode([char; 4]);

impl TypeCode {
    pub fn parse(s: &str) -> Option<Self> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 4 {
            return None;
        }
        let mut letters = ['?'; 4];
        for (slot, (rule, c)) in TYPE_CODE_RULES.iter().zip(chars).enumerate() {
            let c = c.to_ascii_uppercase();
            if c != rule.low && c != rule.high {
                return None;
            }
            letters[slot] = c;
        }
        Some(Self(letters))
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0 {
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl Serialize for TypeCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TypeCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TypeCode::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid type code '{raw}'")))
    }
}

pub fn resolve_type_code(scores: &OceanScores, confidence: &TraitConfidence) -> TypeCode {
    let mut letters = ['?'; 4];
    for (slot, rule) in TYPE_CODE_RULES.iter().enumerate() {
        letters[slot] = rule.resolve(scores[rule.source], confidence[rule.source]);
    }
    TypeCode(letters)
}
