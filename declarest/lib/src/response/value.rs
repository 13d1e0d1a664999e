//! Processed response value types.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number, Value};

use super::table::DataTable;

/// A fully processed response.
///
/// This enum represents the OUTPUT of the response pipeline: a flattened
/// JSON-like tree in which every non-empty array of maps has been replaced by
/// a [`DataTable`]. It serializes back to plain JSON, with tables written as
/// arrays of row objects.
///
/// ## Examples
///
/// ```rust
/// use declarest_lib::response::{ResponseValue, tabularize};
/// use serde_json::json;
///
/// let value = tabularize(json!({"list": [{"a": 1}, {"a": 2}]}));
/// let table = value.get("list").and_then(ResponseValue::as_table).unwrap();
/// assert_eq!(table.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(untagged)]
pub enum ResponseValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<ResponseValue>),
    Map(IndexMap<String, ResponseValue>),
    Table(DataTable),
}

impl ResponseValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns `true` if this is a tabularized array of maps.
    pub fn is_table(&self) -> bool {
        matches!(self, Self::Table(_))
    }

    /// Looks up `key` in a map value, returning `None` for other variants.
    pub fn get(&self, key: &str) -> Option<&ResponseValue> {
        self.as_map().and_then(|m| m.get(key))
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, ResponseValue>> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&DataTable> {
        match self {
            Self::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ResponseValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    /// Convert into the table, returning `Err(self)` for other variants.
    pub fn into_table(self) -> Result<DataTable, Self> {
        match self {
            Self::Table(t) => Ok(t),
            other => Err(other),
        }
    }

    /// Converts back into a plain JSON tree; tables become arrays of objects.
    pub fn into_json(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(b),
            Self::Number(n) => Value::Number(n),
            Self::String(s) => Value::String(s),
            Self::Array(items) => Value::Array(items.into_iter().map(Self::into_json).collect()),
            Self::Map(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_json()))
                    .collect(),
            ),
            Self::Table(table) => Value::Array(
                table
                    .into_rows()
                    .into_iter()
                    .map(|row| {
                        Value::Object(row.into_iter().map(|(k, v)| (k, v.into_json())).collect())
                    })
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ResponseValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for ResponseValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for ResponseValue {
    fn from(n: i64) -> Self {
        Self::Number(n.into())
    }
}

impl From<bool> for ResponseValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<DataTable> for ResponseValue {
    fn from(t: DataTable) -> Self {
        Self::Table(t)
    }
}
