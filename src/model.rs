//! Shared data model: trait codes, per-trait tables, questions, and answers.

use std::collections::HashMap;
use std::fmt;
use std::ops::{Index, IndexMut};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lowest point of the Likert scale.
pub const LIKERT_MIN: i64 = 1;
/// Highest point of the Likert scale.
pub const LIKERT_MAX: i64 = 5;

// =============================================================================
// Traits
// =============================================================================

/// One of the five Big Five trait dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Trait {
    #[serde(rename = "O")]
    Openness,
    #[serde(rename = "C")]
    Conscientiousness,
    #[serde(rename = "E")]
    Extraversion,
    #[serde(rename = "A")]
    Agreeableness,
    #[serde(rename = "N")]
    Neuroticism,
}

impl Trait {
    /// Canonical OCEAN order. Every per-trait loop in the crate uses it.
    pub const ALL: [Trait; 5] = [
        Trait::Openness,
        Trait::Conscientiousness,
        Trait::Extraversion,
        Trait::Agreeableness,
        Trait::Neuroticism,
    ];

    pub fn code(self) -> char {
        match self {
            Trait::Openness => 'O',
            Trait::Conscientiousness => 'C',
            Trait::Extraversion => 'E',
            Trait::Agreeableness => 'A',
            Trait::Neuroticism => 'N',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Trait::Openness => "openness",
            Trait::Conscientiousness => "conscientiousness",
            Trait::Extraversion => "extraversion",
            Trait::Agreeableness => "agreeableness",
            Trait::Neuroticism => "neuroticism",
        }
    }

    fn slot(self) -> usize {
        match self {
            Trait::Openness => 0,
            Trait::Conscientiousness => 1,
            Trait::Extraversion => 2,
            Trait::Agreeableness => 3,
            Trait::Neuroticism => 4,
        }
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A value per trait, serialized as a `{ "O": .., "C": .., "E": .., "A": .., "N": .. }` record.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TraitTable<T> {
    #[serde(rename = "O")]
    pub openness: T,
    #[serde(rename = "C")]
    pub conscientiousness: T,
    #[serde(rename = "E")]
    pub extraversion: T,
    #[serde(rename = "A")]
    pub agreeableness: T,
    #[serde(rename = "N")]
    pub neuroticism: T,
}

impl<T> TraitTable<T> {
    pub fn from_fn(mut f: impl FnMut(Trait) -> T) -> Self {
        Self {
            openness: f(Trait::Openness),
            conscientiousness: f(Trait::Conscientiousness),
            extraversion: f(Trait::Extraversion),
            agreeableness: f(Trait::Agreeableness),
            neuroticism: f(Trait::Neuroticism),
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(Trait, &T) -> U) -> TraitTable<U> {
        TraitTable::from_fn(|t| f(t, &self[t]))
    }

    /// Iterate `(trait, value)` in canonical OCEAN order.
    pub fn iter(&self) -> impl Iterator<Item = (Trait, &T)> {
        Trait::ALL.into_iter().map(move |t| (t, &self[t]))
    }
}

impl<T> Index<Trait> for TraitTable<T> {
    type Output = T;

    fn index(&self, t: Trait) -> &T {
        match t.slot() {
            0 => &self.openness,
            1 => &self.conscientiousness,
            2 => &self.extraversion,
            3 => &self.agreeableness,
            _ => &self.neuroticism,
        }
    }
}

impl<T> IndexMut<Trait> for TraitTable<T> {
    fn index_mut(&mut self, t: Trait) -> &mut T {
        match t.slot() {
            0 => &mut self.openness,
            1 => &mut self.conscientiousness,
            2 => &mut self.extraversion,
            3 => &mut self.agreeableness,
            _ => &mut self.neuroticism,
        }
    }
}

/// Normalized trait scores on the 0..=100 scale.
pub type OceanScores = TraitTable<f64>;

/// Fraction (0..=1) of each trait's catalog weight that was answered.
pub type TraitConfidence = TraitTable<f64>;

// =============================================================================
// Questions
// =============================================================================

/// A single catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier, the key used in answer maps.
    pub id: String,
    /// Trait this item loads on.
    #[serde(rename = "trait")]
    pub trait_code: Trait,
    /// Facet label within the trait.
    pub facet: String,
    /// Positive aggregation weight.
    #[serde(default = "default_weight")]
    pub weight: f64,
    /// Negatively keyed: the response is flipped before aggregation.
    #[serde(default)]
    pub reverse: bool,
}

fn default_weight() -> f64 {
    1.0
}

impl Question {
    pub fn new(id: impl Into<String>, trait_code: Trait, facet: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            trait_code,
            facet: facet.into(),
            weight: 1.0,
            reverse: false,
        }
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn reversed(mut self) -> Self {
        self.reverse = true;
        self
    }
}

// =============================================================================
// Answers
// =============================================================================

/// Question id → Likert response, in insertion order.
///
/// Order is part of the contract: aggregation sums in this order, so two
/// engines fed the same JSON document accumulate identically. Re-inserting an
/// existing id replaces its value without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerMap {
    entries: Vec<(String, i64)>,
    index: HashMap<String, usize>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn insert(&mut self, id: impl Into<String>, response: i64) -> Option<i64> {
        let id = id.into();
        if let Some(&slot) = self.index.get(&id) {
            let previous = self.entries[slot].1;
            self.entries[slot].1 = response;
            return Some(previous);
        }
        self.index.insert(id.clone(), self.entries.len());
        self.entries.push((id, response));
        None
    }

    pub fn get(&self, id: &str) -> Option<i64> {
        self.index.get(id).map(|&slot| self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(id, r)| (id.as_str(), *r))
    }

    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|(_, r)| *r)
    }
}

impl<K: Into<String>> FromIterator<(K, i64)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (K, i64)>>(iter: I) -> Self {
        let mut map = AnswerMap::new();
        for (id, r) in iter {
            map.insert(id, r);
        }
        map
    }
}

impl Serialize for AnswerMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, r) in &self.entries {
            map.serialize_entry(id, r)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnswerMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AnswerMapVisitor;

        impl<'de> Visitor<'de> for AnswerMapVisitor {
            type Value = AnswerMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping question ids to integer responses")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<AnswerMap, A::Error> {
                let mut map = AnswerMap::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, r)) = access.next_entry::<String, i64>()? {
                    map.insert(id, r);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(AnswerMapVisitor)
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// Inclusive `[min, max]` interval on the 0..=100 scale, serialized as a two-element array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(f64, f64)", into = "(f64, f64)")]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

impl ScoreRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    /// Distance from `score` to the nearest edge, 0 when inside.
    pub fn distance_outside(&self, score: f64) -> f64 {
        (self.min - score).max(score - self.max).max(0.0)
    }
}

impl From<(f64, f64)> for ScoreRange {
    fn from((min, max): (f64, f64)) -> Self {
        Self { min, max }
    }
}

impl From<ScoreRange> for (f64, f64) {
    fn from(r: ScoreRange) -> Self {
        (r.min, r.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_map_preserves_document_order() {
        let map: AnswerMap = serde_json::from_str(r#"{"q3": 2, "q1": 5, "q2": 4}"#).unwrap();
        let ids: Vec<&str> = map.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["q3", "q1", "q2"]);
        assert_eq!(serde_json::to_string(&map).unwrap(), r#"{"q3":2,"q1":5,"q2":4}"#);
    }

    #[test]
    fn answer_map_overwrite_keeps_position() {
        let mut map = AnswerMap::new();
        map.insert("a", 1);
        map.insert("b", 2);
        assert_eq!(map.insert("a", 4), Some(1));
        let entries: Vec<(&str, i64)> = map.iter().collect();
        assert_eq!(entries, vec![("a", 4), ("b", 2)]);
    }

    #[test]
    fn trait_table_serializes_with_letter_keys() {
        let table = TraitTable::from_fn(|t| t.code() as u32);
        let json = serde_json::to_value(table).unwrap();
        assert_eq!(json["O"], 'O' as u32);
        assert_eq!(json["N"], 'N' as u32);
    }

    #[test]
    fn range_distance_outside() {
        let r = ScoreRange::new(40.0, 60.0);
        assert_eq!(r.distance_outside(50.0), 0.0);
        assert_eq!(r.distance_outside(35.0), 5.0);
        assert_eq!(r.distance_outside(72.5), 12.5);
        assert_eq!(r.midpoint(), 50.0);
    }
}
