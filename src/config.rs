//! Engine configuration loaded from JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::persona::MatchParams;
use crate::validity::ValidityParams;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Recorded in persisted assessment metadata.
    pub quiz_type: String,
    /// Question bank JSON; the built-in bank when absent.
    pub question_bank: Option<PathBuf>,
    /// Persona catalog JSON; the built-in catalog when absent.
    pub persona_catalog: Option<PathBuf>,
    pub matching: MatchParams,
    pub validity: ValidityParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quiz_type: "big_five".to_string(),
            question_bank: None,
            persona_catalog: None,
            matching: MatchParams::default(),
            validity: ValidityParams::default(),
        }
    }
}

impl EngineConfig {
    /// Relative bank/catalog paths are taken relative to `base`.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        if let Some(p) = self.question_bank.take() {
            self.question_bank = Some(if p.is_relative() { base.join(p) } else { p });
        }
        if let Some(p) = self.persona_catalog.take() {
            self.persona_catalog = Some(if p.is_relative() { base.join(p) } else { p });
        }
        self
    }
}

pub fn load_config_from_path(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)?;
    let config: EngineConfig = serde_json::from_str(&raw)?;
    validate_config(&config)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    Ok(config.resolve_paths(base))
}

pub fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.quiz_type.trim().is_empty() {
        return Err(ConfigError::Invalid("quiz_type must be non-empty".to_string()));
    }
    let m = &config.matching;
    let non_negative = [
        ("matching.near_miss_window", m.near_miss_window),
        ("matching.miss_penalty", m.miss_penalty),
        ("matching.tie_window", m.tie_window),
        ("validity.min_stddev", config.validity.min_stddev),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Invalid(format!("{name} must be finite and >= 0")));
        }
    }
    if !m.proximity_scale.is_finite() || m.proximity_scale <= 0.0 {
        return Err(ConfigError::Invalid(
            "matching.proximity_scale must be finite and > 0".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&m.hit_weight) {
        return Err(ConfigError::Invalid(
            "matching.hit_weight must be within [0, 1]".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_yields_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn partial_matching_override_keeps_other_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"matching": {"tie_window": 5.0}}"#).unwrap();
        assert_eq!(config.matching.tie_window, 5.0);
        assert_eq!(config.matching.miss_penalty, 30.0);
    }

    #[test]
    fn rejects_hit_weight_above_one() {
        let mut config = EngineConfig::default();
        config.matching.hit_weight = 1.5;
        assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));
    }
}
