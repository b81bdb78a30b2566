//! # denorm-rs
//!
//! A schema-driven denormalization engine for composable entity APIs.
//!
//! Entities store foreign-key references: a single id, a list of ids, or id
//! lists inside nested objects. This crate wraps each entity's exposed fetch
//! functions so their results come back with those references recursively
//! resolved into live nested objects, while batching fetches per referenced
//! type and bounding recursion depth.
//!
//! ## Features
//!
//! - **Declarative Schemas**: Per-entity reference schemas, flattened into
//!   path accessors; declarable in code, JSON, or YAML
//! - **Batched Fetching**: One fetch per referenced type per resolve pass,
//!   with a threshold-based `get_one`/`get_some`/`get_all` strategy
//! - **Recursive Resolution**: Resolved entities are themselves denormalized,
//!   bounded by a configurable depth limit
//! - **Transparent Wrapping**: Wrapped functions keep the raw function's call
//!   shape; entities without schemas pass through untouched
//! - **Two-Phase Build**: Explicit decorate-then-finalize wiring with
//!   build-time validation of every fetcher reference
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use denorm::prelude::*;
//!
//! let mut configs = EntityConfigs::new();
//! configs.insert(
//!     "user".to_string(),
//!     EntityConfig::new()
//!         .api_fn("getUser", handler_fn(get_user))
//!         .denormalizer(EntityPluginConfig {
//!             get_one: Some("getUser".to_string()),
//!             ..Default::default()
//!         }),
//! );
//! configs.insert(
//!     "message".to_string(),
//!     EntityConfig::new()
//!         .api_fn("getMessage", handler_fn(get_message))
//!         .denormalizer(EntityPluginConfig {
//!             schema: Some(serde_json::from_value(
//!                 serde_json::json!({ "author": "user" }),
//!             )?),
//!             ..Default::default()
//!         }),
//! );
//!
//! let api = Denormalizer::build(PluginConfig::default(), &configs)?;
//! // `author` now holds the full user object instead of an id
//! let message = api.call("message", "getMessage", vec!["x".into()]).await?;
//! ```

pub mod config;
pub mod core;
pub mod plugin;

/// Re-exports of commonly used types and functions
pub mod prelude {
    // === Configuration ===
    pub use crate::config::{
        DEFAULT_MAX_DEPTH, EntityConfig, EntityConfigs, EntityPluginConfig, PluginConfig,
    };

    // === Core ===
    pub use crate::core::{
        Accessor, ApiFnHandle, ApiHandler, DenormError, DenormResult, ResolutionContext, Schema,
        TypeRef, extract_accessors, handler_fn,
    };

    // === Plugin ===
    pub use crate::plugin::{DecoratedApi, DecoratedFn, Denormalizer};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use serde_json::{Value, json};
}
