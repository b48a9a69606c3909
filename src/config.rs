//! Engine configuration
//!
//! Every field has a default, so a partial JSON document (or `{}`) is valid.

use crate::error::ConfigError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Default fanout of the ordered tree
pub const DEFAULT_DEGREE: usize = 32;

/// Default initial capacity of the dictionary maps
pub const DEFAULT_DICT_CAPACITY: usize = 1024;

/// Ordered tree configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Maximum number of children of an internal node
    pub degree: usize,
}

impl TreeConfig {
    /// Check that the fanout lets splits make progress
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.degree < 2 {
            return Err(ConfigError::InvalidDegree(self.degree));
        }
        Ok(())
    }
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            degree: DEFAULT_DEGREE,
        }
    }
}

/// Expiring dictionary configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictConfig {
    /// Initial capacity of the value map
    pub initial_capacity: usize,
}

impl Default for DictConfig {
    fn default() -> Self {
        DictConfig {
            initial_capacity: DEFAULT_DICT_CAPACITY,
        }
    }
}

/// Configuration for both engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tree: TreeConfig,
    pub dict: DictConfig,
}

impl Config {
    /// Parse and validate a JSON configuration document
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Config =
            serde_json::from_str(json).context("Failed to parse engine configuration")?;
        config.validate()?;

        info!(
            "Loaded configuration: tree degree {}, dict capacity {}",
            config.tree.degree, config.dict.initial_capacity
        );

        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tree.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.tree.degree, DEFAULT_DEGREE);
        assert_eq!(config.dict.initial_capacity, DEFAULT_DICT_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = Config::from_json(r#"{ "tree": { "degree": 3 } }"#).unwrap();
        assert_eq!(config.tree.degree, 3);
        assert_eq!(config.dict.initial_capacity, DEFAULT_DICT_CAPACITY);

        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_json_rejects_small_degree() {
        let err = Config::from_json(r#"{ "tree": { "degree": 1 } }"#).unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::InvalidDegree(1))
        );
    }

    #[test]
    fn test_from_json_malformed() {
        let err = Config::from_json("{ tree: ").unwrap_err();
        assert!(err.to_string().contains("Failed to parse engine configuration"));
    }

    #[test]
    fn test_round_trip_json() {
        let config = Config {
            tree: TreeConfig { degree: 5 },
            dict: DictConfig { initial_capacity: 16 },
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }
}
