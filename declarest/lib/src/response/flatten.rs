//! Collapses nested maps into dot-joined keys.

use serde_json::{Map, Value};

/// Key separator for flattened map entries.
pub const SEPARATOR: char = '.';

/// Flattens `value`.
///
/// - Nested maps become `"parent.child"` entries, at any depth.
/// - Arrays keep their place; each element is flattened on its own.
/// - Null entries are dropped from maps (array elements are kept).
///
/// The result is a fixed point: flattening it again changes nothing.
///
/// ## Examples
///
/// ```
/// use declarest_lib::response::flatten;
/// use serde_json::json;
///
/// let raw = json!({
///     "response": {"count": "10"},
///     "list": [{"weather": {"temp": 10}}, {"weather": {"temp": 15}}],
/// });
/// assert_eq!(
///     flatten(raw),
///     json!({
///         "response.count": "10",
///         "list": [{"weather.temp": 10}, {"weather.temp": 15}],
///     })
/// );
/// ```
pub fn flatten(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(flatten_map(map)),
        Value::Array(items) => Value::Array(items.into_iter().map(flatten).collect()),
        other => other,
    }
}

/// Flattens one map; see [`flatten`].
pub fn flatten_map(map: Map<String, Value>) -> Map<String, Value> {
    let mut out = Map::with_capacity(map.len());
    for (key, value) in map {
        flatten_into(key, value, &mut out);
    }
    out
}

fn flatten_into(key: String, value: Value, out: &mut Map<String, Value>) {
    match value {
        Value::Null => {}
        Value::Object(nested) => {
            for (child, value) in nested {
                flatten_into(format!("{key}{SEPARATOR}{child}"), value, out);
            }
        }
        Value::Array(items) => {
            out.insert(key, Value::Array(items.into_iter().map(flatten).collect()));
        }
        scalar => {
            out.insert(key, scalar);
        }
    }
}

/// Returns `true` when `value` has no map nested directly inside a map and no
/// null map entries.
pub fn is_flat(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.values().all(|v| match v {
            Value::Null | Value::Object(_) => false,
            Value::Array(items) => items.iter().all(is_flat),
            _ => true,
        }),
        Value::Array(items) => items.iter().all(is_flat),
        _ => true,
    }
}
