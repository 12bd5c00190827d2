//! Configuration types for fixture generation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use catalog_identity::{IdentityBackend, Identifier};
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::seeds::MAX_TOTAL_COUNT;

/// Smallest number of records planned for any entity type.
pub const MIN_PER_TYPE: usize = 2;

/// Locale used for generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "de_DE")]
    De,
    #[serde(rename = "en_US")]
    En,
    #[serde(rename = "fr_FR")]
    Fr,
    #[serde(rename = "pt_BR")]
    PtBr,
    #[serde(rename = "zh_CN")]
    ZhCn,
    #[serde(rename = "ja_JP")]
    JaJp,
}

impl Locale {
    /// Two-letter language code attached to localized text.
    pub fn language(&self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
            Self::Fr => "fr",
            Self::PtBr => "pt",
            Self::ZhCn => "zh",
            Self::JaJp => "ja",
        }
    }
}

/// Configuration for a generation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// Relative weight of each entity type in the population.
    pub weights: BTreeMap<String, u32>,

    /// Total record budget across all types.
    pub count: usize,

    /// Floor applied to every type's planned count. Never below 2.
    pub min_per_type: usize,

    /// Seed for every random stream of the run.
    pub seed: u64,

    /// Locales generated text is drawn from.
    pub locales: Vec<Locale>,

    /// Upper bound on words in generated strings and texts.
    pub chattiness: usize,

    /// Vocabulary file for vocabulary-backed patterns.
    pub vocabulary_path: Option<PathBuf>,

    /// `hadPrimarySource` of the very first primary source.
    pub bootstrap_primary_source: Option<Identifier>,

    /// Entity type whose records every other record references as its source.
    pub primary_source_type: String,

    /// Schema registry file; the built-in catalog schemas when unset.
    pub schema_path: Option<PathBuf>,

    /// Identity provider backend.
    pub identity: IdentityBackend,
}

impl Default for SeedConfig {
    fn default() -> Self {
        let weights = [
            ("PrimarySource", 1),
            ("Organization", 3),
            ("OrganizationalUnit", 3),
            ("Person", 6),
            ("ContactPoint", 2),
            ("AccessPlatform", 1),
            ("Activity", 4),
            ("Distribution", 3),
            ("Resource", 5),
            ("VariableGroup", 2),
            ("Variable", 6),
            ("BibliographicResource", 2),
            ("Consent", 2),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

        Self {
            weights,
            count: 100,
            min_per_type: MIN_PER_TYPE,
            seed: 0,
            locales: vec![Locale::De, Locale::En],
            chattiness: 16,
            vocabulary_path: None,
            bootstrap_primary_source: Some(Identifier::bootstrap()),
            primary_source_type: "PrimarySource".to_string(),
            schema_path: None,
            identity: IdentityBackend::Memory,
        }
    }
}

impl SeedConfig {
    /// Reads a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, GenerationError> {
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks bounds that the rest of the pipeline relies on.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.count > MAX_TOTAL_COUNT {
            return Err(GenerationError::InvalidConfig(format!(
                "count {} exceeds the maximum of {MAX_TOTAL_COUNT}",
                self.count
            )));
        }
        if self.min_per_type < MIN_PER_TYPE {
            return Err(GenerationError::InvalidConfig(format!(
                "min_per_type must be at least {MIN_PER_TYPE}"
            )));
        }
        if self.locales.is_empty() {
            return Err(GenerationError::InvalidConfig(
                "at least one locale is required".to_string(),
            ));
        }
        if self.chattiness == 0 {
            return Err(GenerationError::InvalidConfig(
                "chattiness must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SeedConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_per_type, 2);
        assert!(config.weights.contains_key(&config.primary_source_type));
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let config: SeedConfig = serde_json::from_str(
            r#"{"count": 10, "seed": 7, "locales": ["en_US"], "weights": {"A": 1}}"#,
        )
        .unwrap();

        assert_eq!(config.count, 10);
        assert_eq!(config.seed, 7);
        assert_eq!(config.locales, vec![Locale::En]);
        assert_eq!(config.weights.len(), 1);
        assert_eq!(config.chattiness, 16);
        assert_eq!(config.identity, IdentityBackend::Memory);
    }

    #[test]
    fn test_validation_bounds() {
        let too_many = SeedConfig {
            count: MAX_TOTAL_COUNT + 1,
            ..Default::default()
        };
        assert!(too_many.validate().is_err());

        let low_floor = SeedConfig {
            min_per_type: 1,
            ..Default::default()
        };
        assert!(low_floor.validate().is_err());

        let quiet = SeedConfig {
            chattiness: 0,
            ..Default::default()
        };
        assert!(quiet.validate().is_err());
    }
}
