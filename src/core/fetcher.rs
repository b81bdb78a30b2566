//! Per-type fetch descriptors
//!
//! [`extract_fetchers`] runs at build time and validates, for every type
//! referenced by any schema, that the type declares a denormalizer section
//! with a usable `get_one` accessor. It resolves function *names*; the
//! functions themselves are wired in a separate finalize step, once every
//! entity has been decorated (a type's fetchers point at another entity's
//! decorated function, which only exists after all entities are processed).

use crate::config::{EntityConfigs, PluginConfig};
use crate::core::error::{DenormError, DenormResult};
use crate::plugin::DecoratedFn;
use std::collections::HashMap;
use std::sync::Arc;

/// Build-time fetch descriptor: validated function names and threshold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherSpec {
    /// Name of the function fetching a single entity by id; mandatory
    pub get_one: String,
    /// Name of the function fetching a batch of ids, if declared
    pub get_some: Option<String>,
    /// Name of the function fetching every entity, if declared
    pub get_all: Option<String>,
    /// Id-count cutoff above which `get_all` is preferred over `get_some`
    pub threshold: usize,
}

/// Finalized fetch descriptor: wired to decorated functions
#[derive(Clone)]
pub struct Fetcher {
    pub(crate) get_one: Arc<DecoratedFn>,
    pub(crate) get_some: Option<Arc<DecoratedFn>>,
    pub(crate) get_all: Option<Arc<DecoratedFn>>,
    pub(crate) threshold: usize,
}

/// Resolve a fetch descriptor for every referenced type.
///
/// Fails if a type has no denormalizer configuration, or if its configured
/// `get_one` name is absent from the entity's api. `get_some` and `get_all`
/// names that do not match an api function are treated as undeclared.
pub fn extract_fetchers(
    global: &PluginConfig,
    configs: &EntityConfigs,
    types: &[String],
) -> DenormResult<HashMap<String, FetcherSpec>> {
    let mut fetchers = HashMap::new();
    for type_name in types {
        let entity = configs
            .get(type_name)
            .ok_or_else(|| DenormError::MissingPluginConfig(type_name.clone()))?;
        let conf = entity
            .denormalizer
            .as_ref()
            .ok_or_else(|| DenormError::MissingPluginConfig(type_name.clone()))?;

        let from_api =
            |name: &Option<String>| name.as_ref().filter(|n| entity.api.contains_key(*n)).cloned();

        let get_one =
            from_api(&conf.get_one).ok_or_else(|| DenormError::MissingGetOne(type_name.clone()))?;

        fetchers.insert(
            type_name.clone(),
            FetcherSpec {
                get_one,
                get_some: from_api(&conf.get_some),
                get_all: from_api(&conf.get_all),
                threshold: global.threshold_for(Some(conf)),
            },
        );
    }
    Ok(fetchers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityConfig, EntityPluginConfig};
    use crate::core::handler::handler_fn;
    use serde_json::Value;

    fn noop() -> crate::core::handler::ApiFnHandle {
        handler_fn(|_| async { Ok(Value::Null) })
    }

    fn user_config(plugin: EntityPluginConfig) -> EntityConfigs {
        let mut configs = EntityConfigs::new();
        configs.insert(
            "user".to_string(),
            EntityConfig::new()
                .api_fn("getUser", noop())
                .api_fn("getUsers", noop())
                .denormalizer(plugin),
        );
        configs
    }

    fn types() -> Vec<String> {
        vec!["user".to_string()]
    }

    #[test]
    fn test_extracts_declared_accessors() {
        let configs = user_config(EntityPluginConfig {
            get_one: Some("getUser".to_string()),
            get_all: Some("getUsers".to_string()),
            threshold: Some(5),
            ..Default::default()
        });
        let fetchers = extract_fetchers(&PluginConfig::default(), &configs, &types()).unwrap();
        let spec = &fetchers["user"];
        assert_eq!(spec.get_one, "getUser");
        assert_eq!(spec.get_all.as_deref(), Some("getUsers"));
        assert_eq!(spec.get_some, None);
        assert_eq!(spec.threshold, 5);
    }

    #[test]
    fn test_threshold_falls_back_to_global_then_infinity() {
        let configs = user_config(EntityPluginConfig {
            get_one: Some("getUser".to_string()),
            ..Default::default()
        });
        let global = PluginConfig {
            threshold: Some(7),
            max_depth: None,
        };
        let fetchers = extract_fetchers(&global, &configs, &types()).unwrap();
        assert_eq!(fetchers["user"].threshold, 7);

        let fetchers = extract_fetchers(&PluginConfig::default(), &configs, &types()).unwrap();
        assert_eq!(fetchers["user"].threshold, usize::MAX);
    }

    #[test]
    fn test_missing_plugin_config_fails() {
        let mut configs = EntityConfigs::new();
        configs.insert("user".to_string(), EntityConfig::new());
        let err = extract_fetchers(&PluginConfig::default(), &configs, &types()).unwrap_err();
        assert!(matches!(err, DenormError::MissingPluginConfig(t) if t == "user"));
    }

    #[test]
    fn test_unknown_type_fails() {
        let err =
            extract_fetchers(&PluginConfig::default(), &EntityConfigs::new(), &types())
                .unwrap_err();
        assert!(matches!(err, DenormError::MissingPluginConfig(t) if t == "user"));
    }

    #[test]
    fn test_missing_get_one_fails() {
        let configs = user_config(EntityPluginConfig {
            get_all: Some("getUsers".to_string()),
            ..Default::default()
        });
        let err = extract_fetchers(&PluginConfig::default(), &configs, &types()).unwrap_err();
        assert!(matches!(err, DenormError::MissingGetOne(t) if t == "user"));
    }

    #[test]
    fn test_get_one_name_not_in_api_fails() {
        let configs = user_config(EntityPluginConfig {
            get_one: Some("fetchUser".to_string()),
            ..Default::default()
        });
        let err = extract_fetchers(&PluginConfig::default(), &configs, &types()).unwrap_err();
        assert!(matches!(err, DenormError::MissingGetOne(t) if t == "user"));
    }

    #[test]
    fn test_optional_names_not_in_api_are_dropped() {
        let configs = user_config(EntityPluginConfig {
            get_one: Some("getUser".to_string()),
            get_some: Some("fetchSomeUsers".to_string()),
            ..Default::default()
        });
        let fetchers = extract_fetchers(&PluginConfig::default(), &configs, &types()).unwrap();
        assert_eq!(fetchers["user"].get_some, None);
    }
}
