use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use loto645_db::models::{validate_numbers, LOW_MAX};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Poids négatif pour '{0}' : {1}")]
    NegativeWeight(&'static str, f64),
    #[error("La somme des poids ({0}) dépasse 1.0")]
    WeightsTooLarge(f64),
    #[error("Le paramètre '{0}' doit être strictement positif")]
    Zero(&'static str),
    #[error("Grille de motif invalide : {0}")]
    InvalidPattern(#[from] loto645_db::models::RecordError),
    #[error("Plage de sommes '{label}' invalide : {min} > {max}")]
    InvalidSumRange { label: String, min: u32, max: u32 },
}

/// Poids du score intégré.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub frequency: f64,
    pub overdue: f64,
    pub pattern: f64,
    pub co_occurrence: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            frequency: 0.4,
            overdue: 0.3,
            pattern: 0.1,
            co_occurrence: 0.1,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.frequency + self.overdue + self.pattern + self.co_occurrence
    }
}

/// Grille de motif choisie à la main : 3 impairs / 3 pairs, 3 bas / 3 hauts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternPolicy {
    pub numbers: [u8; 6],
}

impl Default for PatternPolicy {
    fn default() -> Self {
        Self {
            numbers: [12, 13, 17, 28, 33, 40],
        }
    }
}

impl PatternPolicy {
    pub fn contains(&self, number: u8) -> bool {
        self.numbers.contains(&number)
    }

    pub fn odd_count(&self) -> usize {
        self.numbers.iter().filter(|&&n| n % 2 == 1).count()
    }

    pub fn high_count(&self) -> usize {
        self.numbers.iter().filter(|&&n| n > LOW_MAX).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SumRange {
    pub label: String,
    pub min: u32,
    pub max: u32,
}

impl SumRange {
    pub fn new(label: &str, min: u32, max: u32) -> Self {
        Self {
            label: label.to_string(),
            min,
            max,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub moving_average_window: usize,
    pub sample_stride: usize,
    pub exact_sum_attempts: usize,
    pub range_attempts: usize,
    pub weights: ScoreWeights,
    pub pattern: PatternPolicy,
    /// Nombre de paires les plus fréquentes utilisées pour la centralité.
    pub centrality_pairs: usize,
    /// Nombre de sommes historiques les plus fréquentes à proposer.
    pub frequent_sums: usize,
    pub sum_ranges: Vec<SumRange>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            moving_average_window: 52,
            sample_stride: 10,
            exact_sum_attempts: 1_000,
            range_attempts: 10_000,
            weights: ScoreWeights::default(),
            pattern: PatternPolicy::default(),
            centrality_pairs: 50,
            frequent_sums: 5,
            sum_ranges: vec![
                SumRange::new("basse", 60, 90),
                SumRange::new("moyenne", 120, 150),
                SumRange::new("haute", 180, 210),
            ],
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        for (name, value) in [
            ("frequency", w.frequency),
            ("overdue", w.overdue),
            ("pattern", w.pattern),
            ("co_occurrence", w.co_occurrence),
        ] {
            if value < 0.0 {
                return Err(ConfigError::NegativeWeight(name, value));
            }
        }
        if w.total() > 1.0 + 1e-9 {
            return Err(ConfigError::WeightsTooLarge(w.total()));
        }

        for (name, value) in [
            ("moving_average_window", self.moving_average_window),
            ("sample_stride", self.sample_stride),
            ("exact_sum_attempts", self.exact_sum_attempts),
            ("range_attempts", self.range_attempts),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero(name));
            }
        }

        validate_numbers(&self.pattern.numbers)?;

        for range in &self.sum_ranges {
            if range.min > range.max {
                return Err(ConfigError::InvalidSumRange {
                    label: range.label.clone(),
                    min: range.min,
                    max: range.max,
                });
            }
        }
        Ok(())
    }

    /// Charge et valide une configuration JSON. Les champs absents prennent leur valeur par défaut.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Impossible de lire la configuration {:?}", path))?;
        let config: EngineConfig = serde_json::from_str(&json)
            .with_context(|| format!("Configuration invalide dans {:?}", path))?;
        config.validate()?;
        log::info!("Configuration chargée depuis {:?}", path);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Impossible d'écrire {:?}", path))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.moving_average_window, 52);
        assert_eq!(config.sample_stride, 10);
        assert_eq!(config.exact_sum_attempts, 1_000);
        assert_eq!(config.range_attempts, 10_000);
        assert!((config.weights.total() - 0.9).abs() < 1e-10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_pattern_is_balanced() {
        let pattern = PatternPolicy::default();
        assert_eq!(pattern.odd_count(), 3);
        assert_eq!(pattern.high_count(), 3);
    }

    #[test]
    fn test_weights_too_large() {
        let mut config = EngineConfig::default();
        config.weights.pattern = 0.3;
        assert!(matches!(config.validate(), Err(ConfigError::WeightsTooLarge(_))));
    }

    #[test]
    fn test_negative_weight() {
        let mut config = EngineConfig::default();
        config.weights.overdue = -0.1;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NegativeWeight("overdue", -0.1))
        );
    }

    #[test]
    fn test_zero_window_rejected() {
        let mut config = EngineConfig::default();
        config.moving_average_window = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("moving_average_window")));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut config = EngineConfig::default();
        config.pattern.numbers = [1, 1, 2, 3, 4, 5];
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPattern(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "moving_average_window": 26 }"#).unwrap();
        assert_eq!(config.moving_average_window, 26);
        assert_eq!(config.sample_stride, 10);
        assert_eq!(config.pattern, PatternPolicy::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let mut config = EngineConfig::default();
        config.range_attempts = 500;
        config.save(&path).unwrap();

        let loaded = EngineConfig::load(&path).unwrap();
        assert_eq!(loaded.range_attempts, 500);
        assert_eq!(loaded.sum_ranges.len(), 3);
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "sample_stride": 0 }"#).unwrap();
        assert!(EngineConfig::load(&path).is_err());
    }
}
