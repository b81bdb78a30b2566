//! The denormalizer plugin: decoration and finalization
//!
//! Wraps each entity's exposed api functions so their results pass through
//! batched reference resolution before being returned. Construction is an
//! explicit two-phase build:
//!
//! 1. [`Denormalizer::decorate`] registers every entity function and returns
//!    its wrapped form.
//! 2. [`Denormalizer::finalize`] resolves cross-entity fetcher references
//!    once, producing an immutable [`Resolver`] shared by all wrapped
//!    functions.
//!
//! Finalization must come second because a type's fetchers point at another
//! entity's decorated function, which only exists after every entity has
//! been processed. `finalize` is idempotent; redundant or racing attempts
//! are safe, the first resolver wins.

use crate::config::{EntityConfigs, PluginConfig};
use crate::core::accessors::{extract_accessors, extract_types};
use crate::core::context::ResolutionContext;
use crate::core::error::{DenormError, DenormResult};
use crate::core::fetcher::{Fetcher, FetcherSpec, extract_fetchers};
use crate::core::handler::ApiFnHandle;
use crate::core::resolver::Resolver;
use crate::core::schema::Accessor;
use anyhow::Result;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

type Registry = HashMap<String, HashMap<String, Arc<DecoratedFn>>>;

/// The denormalizer plugin for one entity-configuration set
pub struct Denormalizer {
    global: PluginConfig,
    accessors: HashMap<String, Arc<Vec<Accessor>>>,
    specs: HashMap<String, FetcherSpec>,
    entity_confs: EntityConfigs,
    registry: Mutex<Registry>,
    resolver: Arc<OnceLock<Resolver>>,
}

impl Denormalizer {
    /// Validate schemas and fetcher configuration for all entities.
    ///
    /// Fails fast on any schema or fetcher problem; nothing is wired yet.
    pub fn new(global: PluginConfig, configs: &EntityConfigs) -> DenormResult<Self> {
        let accessors = extract_accessors(configs)?;
        let types = extract_types(&accessors);
        let specs = extract_fetchers(&global, configs, &types)?;
        tracing::debug!(
            entities = accessors.len(),
            types = types.len(),
            "denormalizer built"
        );
        Ok(Self {
            global,
            accessors: accessors
                .into_iter()
                .map(|(name, list)| (name, Arc::new(list)))
                .collect(),
            specs,
            entity_confs: configs.clone(),
            registry: Mutex::new(Registry::new()),
            resolver: Arc::new(OnceLock::new()),
        })
    }

    /// Wrap one entity function and register it for fetcher wiring.
    ///
    /// The wrapped function has the same externally-observable call shape as
    /// the raw one; for an entity without declared accessors it is a plain
    /// pass-through.
    pub fn decorate(
        &self,
        entity_name: &str,
        fn_name: &str,
        handler: ApiFnHandle,
    ) -> Arc<DecoratedFn> {
        let plugin_conf = self
            .entity_confs
            .get(entity_name)
            .and_then(|c| c.denormalizer.as_ref());
        let decorated = Arc::new(DecoratedFn {
            entity: entity_name.to_string(),
            raw: handler,
            accessors: self.accessors.get(entity_name).cloned(),
            max_depth: self.global.max_depth_for(plugin_conf),
            resolver: self.resolver.clone(),
        });
        tracing::debug!(entity = %entity_name, function = %fn_name, "decorated api function");
        self.registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(entity_name.to_string())
            .or_default()
            .insert(fn_name.to_string(), decorated.clone());
        decorated
    }

    /// Wire every fetcher spec to its decorated function and freeze the
    /// resolver. Idempotent.
    pub fn finalize(&self) -> DenormResult<()> {
        if self.resolver.get().is_some() {
            return Ok(());
        }
        let registry = self
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut fetchers = HashMap::new();
        for (type_name, spec) in &self.specs {
            let lookup = |fn_name: &str| {
                registry
                    .get(type_name)
                    .and_then(|fns| fns.get(fn_name))
                    .cloned()
                    .ok_or_else(|| DenormError::UnknownApiFn {
                        entity: type_name.clone(),
                        fn_name: fn_name.to_string(),
                    })
            };
            fetchers.insert(
                type_name.clone(),
                Fetcher {
                    get_one: lookup(&spec.get_one)?,
                    get_some: spec.get_some.as_deref().map(&lookup).transpose()?,
                    get_all: spec.get_all.as_deref().map(&lookup).transpose()?,
                    threshold: spec.threshold,
                },
            );
        }
        tracing::debug!(types = fetchers.len(), "denormalizer finalized");
        // Racing finalize calls are deterministic; the first resolver wins.
        let _ = self.resolver.set(Resolver::new(fetchers));
        Ok(())
    }

    /// Decorate every api function of every entity and finalize in one step.
    ///
    /// Convenience wiring for hosts (and tests) that do not drive the two
    /// phases themselves.
    pub fn build(global: PluginConfig, configs: &EntityConfigs) -> DenormResult<DecoratedApi> {
        let plugin = Denormalizer::new(global, configs)?;
        for (entity_name, config) in configs {
            for (fn_name, handler) in &config.api {
                plugin.decorate(entity_name, fn_name, handler.clone());
            }
        }
        plugin.finalize()?;
        let fns = plugin
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        Ok(DecoratedApi { fns })
    }
}

/// A wrapped entity function
///
/// [`DecoratedFn::call`] is the public entry point and supplies a fresh root
/// context; [`DecoratedFn::invoke`] is the internal recursive entry taking
/// an explicit context. The context never leaks into the raw function's
/// argument list.
pub struct DecoratedFn {
    entity: String,
    raw: ApiFnHandle,
    accessors: Option<Arc<Vec<Accessor>>>,
    max_depth: usize,
    resolver: Arc<OnceLock<Resolver>>,
}

impl DecoratedFn {
    /// Call the wrapped function with a fresh root context
    pub async fn call(&self, args: Vec<Value>) -> Result<Value> {
        self.invoke(args, ResolutionContext::root(self.max_depth))
            .await
    }

    /// Call the wrapped function under an existing resolution context.
    ///
    /// Returns a boxed future: nested references re-enter this method
    /// through the wired fetchers, so the recursion must go through a boxing
    /// point.
    pub fn invoke(
        &self,
        args: Vec<Value>,
        ctx: ResolutionContext,
    ) -> BoxFuture<'static, Result<Value>> {
        let entity = self.entity.clone();
        let raw = self.raw.clone();
        let accessors = self.accessors.clone();
        let resolver = self.resolver.clone();
        Box::pin(async move {
            let result = raw.call(args).await?;

            let Some(accessors) = accessors else {
                return Ok(result);
            };
            let Some(resolver) = resolver.get() else {
                tracing::warn!(entity = %entity, "denormalizer not finalized, returning raw result");
                return Ok(result);
            };
            if ctx.exhausted() {
                tracing::trace!(
                    entity = %entity,
                    level = ctx.level,
                    "depth limit reached, skipping resolution"
                );
                return Ok(result);
            }

            match result {
                Value::Array(items) => {
                    let resolved = resolver.resolve(&accessors, &ctx, items).await?;
                    Ok(Value::Array(resolved))
                }
                item => {
                    let mut resolved = resolver.resolve(&accessors, &ctx, vec![item]).await?;
                    Ok(resolved.pop().unwrap_or(Value::Null))
                }
            }
        })
    }
}

/// Lookup table of decorated functions, keyed by entity and function name
pub struct DecoratedApi {
    fns: Registry,
}

impl std::fmt::Debug for DecoratedApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecoratedApi")
            .field("fns", &self.fns.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl DecoratedApi {
    /// The decorated function registered under `entity.fn_name`, if any
    pub fn get(&self, entity: &str, fn_name: &str) -> Option<Arc<DecoratedFn>> {
        self.fns.get(entity).and_then(|fns| fns.get(fn_name)).cloned()
    }

    /// Call `entity.fn_name` with the given arguments
    pub async fn call(&self, entity: &str, fn_name: &str, args: Vec<Value>) -> Result<Value> {
        let decorated = self.get(entity, fn_name).ok_or_else(|| {
            anyhow::anyhow!("unknown api function '{entity}.{fn_name}'")
        })?;
        decorated.call(args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EntityConfig, EntityPluginConfig};
    use crate::core::handler::handler_fn;
    use serde_json::json;

    fn configs() -> EntityConfigs {
        let mut configs = EntityConfigs::new();
        configs.insert(
            "user".to_string(),
            EntityConfig::new()
                .api_fn("getUser", handler_fn(|_| async { Ok(json!({ "id": "u" })) }))
                .denormalizer(EntityPluginConfig {
                    get_one: Some("getUser".to_string()),
                    ..Default::default()
                }),
        );
        configs.insert(
            "message".to_string(),
            EntityConfig::new()
                .api_fn(
                    "getMessage",
                    handler_fn(|_| async { Ok(json!({ "author": "u" })) }),
                )
                .denormalizer(EntityPluginConfig {
                    schema: Some(serde_json::from_value(json!({ "author": "user" })).unwrap()),
                    ..Default::default()
                }),
        );
        configs
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let configs = configs();
        let plugin = Denormalizer::new(PluginConfig::default(), &configs).unwrap();
        for (entity_name, config) in &configs {
            for (fn_name, handler) in &config.api {
                plugin.decorate(entity_name, fn_name, handler.clone());
            }
        }
        plugin.finalize().unwrap();
        plugin.finalize().unwrap();
    }

    #[test]
    fn test_finalize_without_decoration_fails() {
        let plugin = Denormalizer::new(PluginConfig::default(), &configs()).unwrap();
        let err = plugin.finalize().unwrap_err();
        assert!(matches!(
            err,
            DenormError::UnknownApiFn { entity, fn_name }
                if entity == "user" && fn_name == "getUser"
        ));
    }

    #[tokio::test]
    async fn test_call_before_finalize_passes_through() {
        let plugin = Denormalizer::new(PluginConfig::default(), &configs()).unwrap();
        let decorated = plugin.decorate(
            "message",
            "getMessage",
            handler_fn(|_| async { Ok(json!({ "author": "u" })) }),
        );
        let result = decorated.call(vec![]).await.unwrap();
        assert_eq!(result, json!({ "author": "u" }));
    }
}
