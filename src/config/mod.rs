//! Configuration for the denormalizer plugin and its host entities
//!
//! Mirrors the host contract: an entity-configuration mapping from entity
//! name to its api functions plus an optional denormalizer plugin section.
//! Plugin sections deserialize from JSON or YAML; camelCase keys from older
//! declarations are accepted as aliases.

use crate::core::error::DenormResult;
use crate::core::handler::ApiFnHandle;
use crate::core::schema::Schema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Depth limit applied when neither the entity nor the global config sets one
pub const DEFAULT_MAX_DEPTH: usize = 12;

/// Global plugin configuration
///
/// Per-entity settings take precedence over these; unset values fall back to
/// the defaults (threshold ∞, max depth [`DEFAULT_MAX_DEPTH`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    pub threshold: Option<usize>,
    #[serde(alias = "maxDepth")]
    pub max_depth: Option<usize>,
}

impl PluginConfig {
    /// Threshold for a type: type config, then global, then ∞
    pub fn threshold_for(&self, entity: Option<&EntityPluginConfig>) -> usize {
        entity
            .and_then(|conf| conf.threshold)
            .or(self.threshold)
            .unwrap_or(usize::MAX)
    }

    /// Depth limit for an entity: entity config, then global, then default
    pub fn max_depth_for(&self, entity: Option<&EntityPluginConfig>) -> usize {
        entity
            .and_then(|conf| conf.max_depth)
            .or(self.max_depth)
            .unwrap_or(DEFAULT_MAX_DEPTH)
    }
}

/// Per-entity denormalizer configuration
///
/// `schema` declares where this entity stores foreign keys; the accessor
/// names declare which of the entity's own api functions fetch it when it is
/// referenced by others.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityPluginConfig {
    pub schema: Option<Schema>,
    #[serde(alias = "getOne")]
    pub get_one: Option<String>,
    #[serde(alias = "getSome")]
    pub get_some: Option<String>,
    #[serde(alias = "getAll")]
    pub get_all: Option<String>,
    pub threshold: Option<usize>,
    #[serde(alias = "maxDepth")]
    pub max_depth: Option<usize>,
}

impl EntityPluginConfig {
    /// Load a plugin section from a YAML string
    pub fn from_yaml_str(yaml: &str) -> DenormResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a plugin section from a YAML file
    pub fn from_yaml_file(path: &str) -> DenormResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }
}

/// Configuration for one entity exposed by the host
///
/// Built with the fluent constructors; the entity's name is the key in the
/// surrounding configuration map.
#[derive(Clone, Default)]
pub struct EntityConfig {
    /// The entity's exposed api functions, by name
    pub api: HashMap<String, ApiFnHandle>,
    /// The denormalizer plugin section, if declared
    pub denormalizer: Option<EntityPluginConfig>,
}

impl EntityConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an api function under `name`
    pub fn api_fn(mut self, name: impl Into<String>, handler: ApiFnHandle) -> Self {
        self.api.insert(name.into(), handler);
        self
    }

    /// Attach the denormalizer plugin section
    pub fn denormalizer(mut self, config: EntityPluginConfig) -> Self {
        self.denormalizer = Some(config);
        self
    }
}

/// The full entity-configuration mapping consumed from the host
pub type EntityConfigs = HashMap<String, EntityConfig>;
