//! Exchange configuration
//!
//! Loaded from YAML. Controls how each registry's store is sized and which
//! log filter applies when the caller asks this crate to install logging.
//!
//! ```yaml
//! name: ifc-to-cobie
//! log_filter: exchanger=debug
//! defaults:
//!   initial_capacity: 256
//! registries:
//!   SpaceToZone:
//!     initial_capacity: 4096
//!     shard_amount: 64
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid shard amount {0}: must be a power of two greater than 1")]
    InvalidShardAmount(usize),
}

/// Number of lock shards in a registry's store.
///
/// Always a power of two greater than 1; anything else is rejected when the
/// value is built or deserialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct ShardAmount(usize);

impl ShardAmount {
    pub fn new(shards: usize) -> Result<Self, ConfigError> {
        if shards > 1 && shards.is_power_of_two() {
            Ok(Self(shards))
        } else {
            Err(ConfigError::InvalidShardAmount(shards))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl TryFrom<usize> for ShardAmount {
    type Error = ConfigError;

    fn try_from(shards: usize) -> Result<Self, Self::Error> {
        Self::new(shards)
    }
}

impl From<ShardAmount> for usize {
    fn from(shards: ShardAmount) -> Self {
        shards.0
    }
}

/// Store sizing for one registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Entries to preallocate
    pub initial_capacity: usize,
    /// Lock shards; `None` lets the map pick from the CPU count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shard_amount: Option<ShardAmount>,
}

/// Configuration for an exchanger and the registries it creates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Human-readable exchange name, used in logs
    pub name: String,
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    /// Applied to every registry without an override
    pub defaults: RegistryConfig,
    /// Overrides keyed by mapping name
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub registries: HashMap<String, RegistryConfig>,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            name: "exchange".to_string(),
            log_filter: None,
            defaults: RegistryConfig::default(),
            registries: HashMap::new(),
        }
    }
}

impl ExchangeConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Store sizing for the registry named `name`
    pub fn registry(&self, name: &str) -> &RegistryConfig {
        self.registries.get(name).unwrap_or(&self.defaults)
    }

    pub fn with_registry(mut self, name: impl Into<String>, config: RegistryConfig) -> Self {
        self.registries.insert(name.into(), config);
        self
    }
}
