//! Typed error handling for the denormalizer
//!
//! Build-time failures (schema or fetcher configuration problems) are fatal
//! and surfaced synchronously as [`DenormError`]. Call-time fetch failures
//! are not wrapped: a rejected fetch propagates unchanged through
//! `anyhow::Result` and fails the enclosing resolve pass.

use thiserror::Error;

/// Errors raised while building or finalizing a denormalizer
#[derive(Debug, Error)]
pub enum DenormError {
    /// A schema references a type that has no denormalizer configuration
    #[error("no denormalizer config found for type '{0}'")]
    MissingPluginConfig(String),

    /// A referenced type's configuration lacks a usable `get_one` accessor
    #[error("no 'get_one' accessor defined on type '{0}'")]
    MissingGetOne(String),

    /// A configured function name was never registered for the entity
    #[error("api function '{fn_name}' is not registered on entity '{entity}'")]
    UnknownApiFn { entity: String, fn_name: String },

    /// A to-many schema leaf must contain exactly one type name
    #[error("list reference at '{path}' must name exactly one type, found {len}")]
    InvalidListRef { path: String, len: usize },

    /// Failed to parse a YAML configuration document
    #[error("failed to parse denormalizer config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),

    /// IO error while reading a configuration file
    #[error("failed to read denormalizer config: {0}")]
    ConfigIo(#[from] std::io::Error),
}

/// A specialized Result type for build-time denormalizer operations
pub type DenormResult<T> = Result<T, DenormError>;
