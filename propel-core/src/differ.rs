//! Differ - Compare desired state with stored local state
//!
//! Adapters use this to decide whether an update has to reach the remote API.

use std::collections::HashMap;

use crate::resource::{Resource, State, Value};

/// Find the attributes whose desired value differs from the stored one
///
/// Attributes only present in local state (computed values) are ignored.
pub fn changed_attributes(from: &State, to: &Resource) -> Vec<String> {
    let mut changed = find_changed_attributes(&to.attributes, &from.attributes);
    changed.sort();
    changed
}

/// Returns true if any of `keys` is set in `to` with a value that differs
/// from the stored one
pub fn has_changes(from: &State, to: &Resource, keys: &[&str]) -> bool {
    changed_attributes(from, to)
        .iter()
        .any(|changed| keys.contains(&changed.as_str()))
}

/// Returns true if any of `keys` holds a non-empty stored value but is
/// absent or empty in `to`
pub fn has_cleared(from: &State, to: &Resource, keys: &[&str]) -> bool {
    keys.iter().any(|key| {
        let stored = from.attributes.get(*key).is_some_and(|v| !is_empty(v));
        let desired = to.attributes.get(*key).is_some_and(|v| !is_empty(v));
        stored && !desired
    })
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        Value::Int(_) | Value::Bool(_) => false,
    }
}

fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        // Skip internal attributes (starting with _)
        if key.starts_with('_') {
            continue;
        }

        match current.get(key) {
            Some(current_value) if current_value == desired_value => {}
            _ => changed.push(key.clone()),
        }
    }

    changed
}
