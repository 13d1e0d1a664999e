//! Final pass turning arrays of maps into [`DataTable`]s.

use serde_json::Value;

use super::table::{DataTable, Row};
use super::value::ResponseValue;

/// Converts a flattened value into a [`ResponseValue`].
///
/// Maps are walked recursively. A non-empty array whose elements are all maps
/// becomes a [`DataTable`]; any other array stays an array. Cells of table
/// rows are converted the same way.
pub fn tabularize(value: Value) -> ResponseValue {
    match value {
        Value::Null => ResponseValue::Null,
        Value::Bool(b) => ResponseValue::Bool(b),
        Value::Number(n) => ResponseValue::Number(n),
        Value::String(s) => ResponseValue::String(s),
        Value::Object(map) => ResponseValue::Map(
            map.into_iter()
                .map(|(k, v)| (k, tabularize(v)))
                .collect(),
        ),
        Value::Array(items) if is_array_of_maps(&items) => {
            let rows = items.into_iter().filter_map(|item| match item {
                Value::Object(map) => Some(
                    map.into_iter()
                        .map(|(k, v)| (k, tabularize(v)))
                        .collect::<Row>(),
                ),
                _ => None,
            });
            ResponseValue::Table(DataTable::from_rows(rows))
        }
        Value::Array(items) => ResponseValue::Array(items.into_iter().map(tabularize).collect()),
    }
}

fn is_array_of_maps(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(Value::is_object)
}
