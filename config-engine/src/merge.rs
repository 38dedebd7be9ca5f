//! Deep merge of configuration documents.
//!
//! Objects merge key by key, recursively. Every other value (scalars,
//! arrays, null) in the overlay replaces the target value wholesale.

use serde_json::{Map, Value};

/// Merge `overlay` into `target`; the overlay wins on conflict
pub fn merge_values(target: &mut Value, overlay: Value) {
    match (target, overlay) {
        (Value::Object(target), Value::Object(overlay)) => merge_objects(target, overlay),
        (target, overlay) => *target = overlay,
    }
}

pub fn merge_objects(target: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        match target.get_mut(&key) {
            Some(existing) => merge_values(existing, value),
            None => {
                target.insert(key, value);
            }
        }
    }
}

/// Fold layers in order, later layers taking precedence
pub fn merge_all<I>(layers: I) -> Map<String, Value>
where
    I: IntoIterator<Item = Map<String, Value>>,
{
    layers.into_iter().fold(Map::new(), |mut acc, layer| {
        merge_objects(&mut acc, layer);
        acc
    })
}
