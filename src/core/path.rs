//! Generic get/set of values at a dotted path inside a JSON tree
//!
//! Reads tolerate missing intermediate containers and return `None`; writes
//! assume the path exists because the value was read first. `set_path` never
//! mutates the caller's data: it consumes the item and returns a new one with
//! only the addressed position replaced.

use serde_json::Value;

/// Read the value at `path`, returning `None` if any intermediate is missing.
///
/// Objects are traversed by key; arrays by numeric segment.
pub fn get_path<'a>(path: &[String], value: &'a Value) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Replace the value at `path`, returning the updated item.
///
/// Containers outside the path are unaffected. If the path spine does not
/// exist the item is returned unchanged; callers only write to positions they
/// have already read.
pub fn set_path(path: &[String], new_value: Value, item: Value) -> Value {
    let mut item = item;
    let mut current = &mut item;
    for (i, segment) in path.iter().enumerate() {
        let slot = match current {
            Value::Object(map) => map.get_mut(segment),
            Value::Array(items) => segment
                .parse::<usize>()
                .ok()
                .and_then(|idx| items.get_mut(idx)),
            _ => None,
        };
        match slot {
            Some(slot) if i + 1 == path.len() => {
                *slot = new_value;
                return item;
            }
            Some(slot) => current = slot,
            None => return item,
        }
    }
    // Empty path replaces the item wholesale.
    new_value
}
