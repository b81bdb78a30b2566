//! Accessor extraction across all entity configurations
//!
//! Pure functions, independent of any fetch execution, usable standalone for
//! introspection and testing.

use crate::core::error::DenormResult;
use crate::core::schema::Accessor;
use crate::config::EntityConfigs;
use std::collections::{BTreeSet, HashMap};

/// Flatten every entity's declared schema into its accessor list.
///
/// Entities without a schema are omitted from the result.
pub fn extract_accessors(configs: &EntityConfigs) -> DenormResult<HashMap<String, Vec<Accessor>>> {
    let mut accessors = HashMap::new();
    for (entity_name, config) in configs {
        let Some(schema) = config.denormalizer.as_ref().and_then(|c| c.schema.as_ref()) else {
            continue;
        };
        accessors.insert(entity_name.clone(), schema.flatten()?);
    }
    Ok(accessors)
}

/// The distinct set of types referenced by any accessor, sorted
pub fn extract_types(accessors: &HashMap<String, Vec<Accessor>>) -> Vec<String> {
    let types: BTreeSet<&str> = accessors
        .values()
        .flatten()
        .map(|accessor| accessor.target.name())
        .collect();
    types.into_iter().map(str::to_string).collect()
}
