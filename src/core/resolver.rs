//! Batched reference resolution
//!
//! Given a batch of items and the owning entity's accessors, the resolver
//! collects every foreign id per referenced type, picks a fetch strategy per
//! type, executes all fetches concurrently, and rewrites each item's
//! reference positions with the resolved entities.
//!
//! Within one resolve pass each distinct (type, id) pair triggers at most one
//! fetch, and the same id resolves to the same JSON object across all items.

use crate::core::context::ResolutionContext;
use crate::core::fetcher::Fetcher;
use crate::core::path::{get_path, set_path};
use crate::core::schema::Accessor;
use anyhow::{Result, anyhow};
use futures::future;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Immutable fetch dispatcher produced by the finalize step
pub struct Resolver {
    fetchers: HashMap<String, Fetcher>,
}

impl Resolver {
    pub(crate) fn new(fetchers: HashMap<String, Fetcher>) -> Self {
        Self { fetchers }
    }

    /// Resolve every reference in `items` and return the rewritten batch.
    ///
    /// Fetches for different types run concurrently and are joined before
    /// rewriting begins; any fetch failure fails the whole call.
    pub async fn resolve(
        &self,
        accessors: &[Accessor],
        ctx: &ResolutionContext,
        items: Vec<Value>,
    ) -> Result<Vec<Value>> {
        let mut pending = Vec::new();
        for (type_name, ids) in collect_targets(accessors, &items) {
            let fetcher = self
                .fetchers
                .get(&type_name)
                .ok_or_else(|| anyhow!("no fetcher wired for type '{type_name}'"))?
                .clone();
            pending.push((type_name, fetcher, ids));
        }

        let fetched = future::try_join_all(pending.into_iter().map(|(type_name, fetcher, ids)| {
            let ctx = ctx.clone();
            async move {
                let entities = request_entities(&fetcher, &ctx, ids).await?;
                Ok::<_, anyhow::Error>((type_name, entities))
            }
        }))
        .await?;

        let mut entities_by_type: HashMap<String, HashMap<String, Value>> = HashMap::new();
        for (type_name, entities) in fetched {
            entities_by_type.insert(type_name, index_by_id(entities));
        }

        Ok(items
            .into_iter()
            .map(|item| rewrite_item(accessors, &entities_by_type, item))
            .collect())
    }
}

/// Collect the pending id list per referenced type.
///
/// Array values are spread into the list, scalars appended as-is; nulls are
/// kept here and filtered when the fetch is planned. BTreeMap keeps the
/// fetch fan-out order deterministic.
fn collect_targets(accessors: &[Accessor], items: &[Value]) -> BTreeMap<String, Vec<Value>> {
    let mut targets: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    for item in items {
        for accessor in accessors {
            let ids = targets
                .entry(accessor.target.name().to_string())
                .or_default();
            match get_path(&accessor.path, item) {
                Some(Value::Array(values)) => ids.extend(values.iter().cloned()),
                Some(value) => ids.push(value.clone()),
                None => ids.push(Value::Null),
            }
        }
    }
    targets
}

/// Fetch the entities behind `ids`, picking a strategy per the threshold.
///
/// Exactly one distinct id goes through `get_one`; more distinct ids than
/// the threshold go through `get_all` when it is declared; everything else
/// goes through `get_some`, falling back to concurrent `get_one` calls when
/// no batch accessor exists. No valid ids means no fetch at all.
async fn request_entities(
    fetcher: &Fetcher,
    ctx: &ResolutionContext,
    ids: Vec<Value>,
) -> Result<Vec<Value>> {
    let mut seen = HashSet::new();
    let distinct: Vec<Value> = ids
        .into_iter()
        .filter(|id| id_key(id).is_some_and(|key| seen.insert(key)))
        .collect();

    if distinct.is_empty() {
        return Ok(Vec::new());
    }

    let child = ctx.descend();

    if let [id] = distinct.as_slice() {
        tracing::debug!(level = child.level, "fetching single entity via get_one");
        let entity = fetcher.get_one.invoke(vec![id.clone()], child).await?;
        return Ok(vec![entity]);
    }

    if distinct.len() > fetcher.threshold {
        if let Some(get_all) = &fetcher.get_all {
            tracing::debug!(
                ids = distinct.len(),
                threshold = fetcher.threshold,
                "over threshold, fetching everything via get_all"
            );
            return as_entity_list(get_all.invoke(Vec::new(), child).await?);
        }
    }

    if let Some(get_some) = &fetcher.get_some {
        tracing::debug!(ids = distinct.len(), "fetching batch via get_some");
        return as_entity_list(get_some.invoke(vec![Value::Array(distinct)], child).await?);
    }

    tracing::debug!(ids = distinct.len(), "no get_some declared, fanning out get_one calls");
    future::try_join_all(
        distinct
            .into_iter()
            .map(|id| fetcher.get_one.invoke(vec![id], child.clone())),
    )
    .await
}

fn as_entity_list(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Array(entities) => Ok(entities),
        other => Err(anyhow!("expected a list of entities, got: {other}")),
    }
}

/// Key a fetched batch by each entity's own `id` field
fn index_by_id(entities: Vec<Value>) -> HashMap<String, Value> {
    entities
        .into_iter()
        .filter_map(|entity| {
            let key = entity.get("id").and_then(id_key)?;
            Some((key, entity))
        })
        .collect()
}

/// Replace every reference position with its resolved entity.
///
/// Null ids stay null, missing paths stay missing, unknown ids become null.
fn rewrite_item(
    accessors: &[Accessor],
    entities_by_type: &HashMap<String, HashMap<String, Value>>,
    item: Value,
) -> Value {
    let mut item = item;
    for accessor in accessors {
        let type_name = accessor.target.name();
        let resolved = match get_path(&accessor.path, &item) {
            Some(Value::Array(ids)) => Value::Array(
                ids.iter()
                    .map(|id| lookup(entities_by_type, type_name, id))
                    .collect(),
            ),
            Some(id) => lookup(entities_by_type, type_name, id),
            None => continue,
        };
        item = set_path(&accessor.path, resolved, item);
    }
    item
}

fn lookup(
    entities_by_type: &HashMap<String, HashMap<String, Value>>,
    type_name: &str,
    id: &Value,
) -> Value {
    match id_key(id) {
        Some(key) => entities_by_type
            .get(type_name)
            .and_then(|entities| entities.get(&key))
            .cloned()
            .unwrap_or(Value::Null),
        // Null and other non-id values pass through unchanged.
        None => id.clone(),
    }
}

/// Normalize an id value into an index key; null and structured values are
/// not ids
fn id_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
