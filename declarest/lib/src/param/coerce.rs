//! Type coercion for parameter values.
//!
//! A [`ParamType`] is selected once when a parameter is declared and then
//! validates and converts every value supplied for it:
//!
//! - [`ParamType::Identity`] - any value, passed through unchanged
//! - [`ParamType::Class`] - the value's runtime kind must match a [`ValueKind`]
//! - [`ParamType::Duck`] - the value must be able to produce a [`Capability`]
//! - [`ParamType::Enum`] - the value must be a key of an [`EnumMapping`]
//!
//! Invalid values always raise; nothing is coerced to a best-effort default.

use std::fmt;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::error::{NonconvertibleError, NonconvertibleReason};

/// Runtime kind of a JSON-like value, used for class constraints.
///
/// ## Examples
///
/// ```
/// use declarest_lib::param::ValueKind;
/// use serde_json::json;
///
/// assert_eq!(ValueKind::of(&json!(42)), ValueKind::Integer);
/// assert!(ValueKind::Number.matches(&json!(1.5)));
/// assert_eq!("boolean".parse::<ValueKind>().unwrap(), ValueKind::Boolean);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Float,
    /// Any number, integer or float.
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    /// Returns the most specific kind of `value`.
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Returns `true` if `value` satisfies this kind.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Number => value.is_number(),
            other => *other == Self::of(value),
        }
    }
}

/// A named conversion a value may be able to perform.
///
/// Duck-typed parameters accept any value that can produce the capability
/// and pass along what it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum Capability {
    /// Date-like values: RFC 3339 or `YYYY-MM-DD` strings and integer epoch
    /// seconds. Produces an RFC 3339 UTC string.
    #[strum(to_string = "to_time")]
    ToTime,
    /// Integers, integral floats and numeric strings. Produces an integer.
    #[strum(to_string = "to_i")]
    ToInteger,
    /// Numbers and numeric strings. Produces a float.
    #[strum(to_string = "to_f")]
    ToFloat,
    /// Strings, numbers and booleans. Produces a string.
    #[strum(to_string = "to_s")]
    ToText,
    /// Booleans, `"true"`/`"false"` and `0`/`1`. Produces a boolean.
    #[strum(to_string = "to_bool")]
    ToBool,
}

impl Capability {
    /// Invokes the capability, returning `None` when `value` cannot provide it.
    pub fn invoke(&self, value: &Value) -> Option<Value> {
        match self {
            Self::ToTime => to_time(value).map(|t| {
                Value::String(t.to_rfc3339_opts(SecondsFormat::Secs, true))
            }),
            Self::ToInteger => match value {
                Value::Number(n) => n.as_i64().or_else(|| {
                    n.as_f64()
                        .filter(|f| {
                            f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64
                        })
                        .map(|f| f as i64)
                }),
                Value::String(s) => s.trim().parse::<i64>().ok(),
                _ => None,
            }
            .map(Value::from),
            Self::ToFloat => match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }
            .and_then(|f| serde_json::Number::from_f64(f).map(Value::Number)),
            Self::ToText => match value {
                Value::String(_) => Some(value.clone()),
                Value::Number(n) => Some(Value::String(n.to_string())),
                Value::Bool(b) => Some(Value::String(b.to_string())),
                _ => None,
            },
            Self::ToBool => match value {
                Value::Bool(_) => Some(value.clone()),
                Value::String(s) if s == "true" => Some(Value::Bool(true)),
                Value::String(s) if s == "false" => Some(Value::Bool(false)),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Some(Value::Bool(false)),
                    Some(1) => Some(Value::Bool(true)),
                    _ => None,
                },
                _ => None,
            },
        }
    }
}

/// Interprets a value as a point in time.
pub(crate) fn to_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|t| t.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            }),
        _ => None,
    }
}

/// Fixed mapping of accepted keys to the values they convert into.
///
/// Keys are JSON values so that non-string keys (booleans, numbers) can be
/// mapped as well. Declaration order is kept for documentation and error
/// messages.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnumMapping {
    entries: Vec<(Value, Value)>,
}

impl EnumMapping {
    /// Builds a mapping from explicit key/value pairs.
    ///
    /// ## Examples
    ///
    /// ```
    /// use declarest_lib::param::EnumMapping;
    /// use serde_json::json;
    ///
    /// let mapping = EnumMapping::from_pairs([(json!(true), json!("yes")), (json!(false), json!("no"))]);
    /// assert_eq!(mapping.get(&json!(true)), Some(&json!("yes")));
    /// ```
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut mapping = Self::default();
        for (key, value) in pairs {
            mapping.insert(key.into(), value.into());
        }
        mapping
    }

    /// Builds a mapping from a plain set, where each element maps to itself.
    pub fn from_values<K: Into<Value>>(values: impl IntoIterator<Item = K>) -> Self {
        let mut mapping = Self::default();
        for key in values {
            let key = key.into();
            mapping.insert(key.clone(), key);
        }
        mapping
    }

    fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Looks up the mapped value for `key`.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Iterates over the accepted keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }

    /// Renders every accepted key for documentation and error messages.
    pub fn key_labels(&self) -> Vec<String> {
        self.keys().map(label).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Strings render bare, everything else as JSON.
fn label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Validation and conversion rule of a parameter.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamType {
    /// Always valid; values pass through unchanged.
    #[default]
    Identity,
    /// Valid iff the value's runtime kind matches; conversion is identity.
    Class(ValueKind),
    /// Valid iff the value can produce the capability; conversion invokes it.
    Duck(Capability),
    /// Valid iff the value is a key of the mapping; conversion yields the
    /// mapped value.
    Enum(EnumMapping),
}

impl ParamType {
    /// Builds an enum type where each of `values` maps to itself.
    pub fn one_of<K: Into<Value>>(values: impl IntoIterator<Item = K>) -> Self {
        Self::Enum(EnumMapping::from_values(values))
    }

    /// Validates `value` and converts it.
    ///
    /// ## Errors
    ///
    /// Returns [`NonconvertibleError`] carrying the offending value when
    /// validation fails.
    pub fn convert(&self, value: Value) -> Result<Value, NonconvertibleError> {
        match self {
            Self::Identity => Ok(value),
            Self::Class(kind) => {
                if kind.matches(&value) {
                    Ok(value)
                } else {
                    let actual = ValueKind::of(&value);
                    Err(NonconvertibleError::new(
                        value,
                        NonconvertibleReason::WrongKind {
                            expected: *kind,
                            actual,
                        },
                    ))
                }
            }
            Self::Duck(capability) => match capability.invoke(&value) {
                Some(converted) => Ok(converted),
                None => Err(NonconvertibleError::new(
                    value,
                    NonconvertibleReason::MissingCapability(*capability),
                )),
            },
            Self::Enum(mapping) => match mapping.get(&value) {
                Some(mapped) => Ok(mapped.clone()),
                None => Err(NonconvertibleError::new(
                    value,
                    NonconvertibleReason::NotInEnum {
                        valid: mapping.key_labels(),
                    },
                )),
            },
        }
    }

    /// Documentation tag for the accepted type.
    pub fn doc_type(&self) -> String {
        match self {
            Self::Identity => "any".to_string(),
            Self::Class(kind) => kind.to_string(),
            Self::Duck(capability) => format!("#{capability}"),
            Self::Enum(mapping) => {
                let mut kinds: Vec<ValueKind> = Vec::new();
                for kind in mapping.keys().map(ValueKind::of) {
                    if !kinds.contains(&kind) {
                        kinds.push(kind);
                    }
                }
                match kinds.as_slice() {
                    [single] => single.to_string(),
                    _ => "any".to_string(),
                }
            }
        }
    }

    /// Every accepted key, for enum types.
    pub fn possible_values(&self) -> Option<Vec<String>> {
        match self {
            Self::Enum(mapping) => Some(mapping.key_labels()),
            _ => None,
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.doc_type())
    }
}

impl From<ValueKind> for ParamType {
    fn from(kind: ValueKind) -> Self {
        Self::Class(kind)
    }
}

impl From<Capability> for ParamType {
    fn from(capability: Capability) -> Self {
        Self::Duck(capability)
    }
}

impl From<EnumMapping> for ParamType {
    fn from(mapping: EnumMapping) -> Self {
        Self::Enum(mapping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn identity_passes_anything() {
        let ty = ParamType::Identity;
        assert_eq!(ty.convert(json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert_eq!(ty.convert(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn class_accepts_matching_kind() {
        let ty = ParamType::Class(ValueKind::Integer);
        assert_eq!(ty.convert(json!(7)).unwrap(), json!(7));
    }

    #[test]
    fn class_rejects_other_kind() {
        let ty = ParamType::Class(ValueKind::Integer);
        let err = ty.convert(json!("7")).unwrap_err();
        assert_eq!(err.value, json!("7"));
        assert_eq!(
            err.reason,
            NonconvertibleReason::WrongKind {
                expected: ValueKind::Integer,
                actual: ValueKind::String,
            }
        );
    }

    #[test]
    fn number_kind_accepts_integers_and_floats() {
        assert!(ValueKind::Number.matches(&json!(1)));
        assert!(ValueKind::Number.matches(&json!(1.5)));
        assert!(!ValueKind::Number.matches(&json!("1")));
    }

    #[test]
    fn duck_time_from_epoch_and_strings() {
        let ty = ParamType::Duck(Capability::ToTime);
        assert_eq!(ty.convert(json!(0)).unwrap(), json!("1970-01-01T00:00:00Z"));
        assert_eq!(
            ty.convert(json!("2024-03-01T12:30:00+02:00")).unwrap(),
            json!("2024-03-01T10:30:00Z")
        );
        assert_eq!(
            ty.convert(json!("2024-03-01")).unwrap(),
            json!("2024-03-01T00:00:00Z")
        );
    }

    #[test]
    fn duck_time_rejects_non_dates() {
        let ty = ParamType::Duck(Capability::ToTime);
        let err = ty.convert(json!("next tuesday")).unwrap_err();
        assert_eq!(
            err.reason,
            NonconvertibleReason::MissingCapability(Capability::ToTime)
        );
        assert!(ty.convert(json!(true)).is_err());
    }

    #[test]
    fn duck_integer_and_float() {
        assert_eq!(
            ParamType::Duck(Capability::ToInteger).convert(json!(" 42 ")).unwrap(),
            json!(42)
        );
        assert_eq!(
            ParamType::Duck(Capability::ToInteger).convert(json!(3.0)).unwrap(),
            json!(3)
        );
        assert!(ParamType::Duck(Capability::ToInteger).convert(json!(3.5)).is_err());
        assert!(ParamType::Duck(Capability::ToInteger).convert(json!(1e20)).is_err());
        assert!(ParamType::Duck(Capability::ToInteger).convert(json!(-1e20)).is_err());
        assert_eq!(
            ParamType::Duck(Capability::ToFloat).convert(json!("2.5")).unwrap(),
            json!(2.5)
        );
    }

    #[test]
    fn duck_text_and_bool() {
        assert_eq!(
            ParamType::Duck(Capability::ToText).convert(json!(12)).unwrap(),
            json!("12")
        );
        assert!(ParamType::Duck(Capability::ToText).convert(json!([1])).is_err());
        assert_eq!(
            ParamType::Duck(Capability::ToBool).convert(json!("false")).unwrap(),
            json!(false)
        );
        assert_eq!(
            ParamType::Duck(Capability::ToBool).convert(json!(1)).unwrap(),
            json!(true)
        );
        assert!(ParamType::Duck(Capability::ToBool).convert(json!(2)).is_err());
    }

    #[test]
    fn enum_maps_present_keys() {
        let ty = ParamType::Enum(EnumMapping::from_pairs([
            (json!(true), json!(1)),
            (json!(false), json!(0)),
        ]));
        assert_eq!(ty.convert(json!(true)).unwrap(), json!(1));
        assert_eq!(ty.convert(json!(false)).unwrap(), json!(0));
    }

    #[test]
    fn enum_rejects_absent_key_listing_all_valid_keys() {
        let ty = ParamType::one_of(["metric", "imperial", "standard"]);
        let err = ty.convert(json!("kelvin")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("metric"));
        assert!(message.contains("imperial"));
        assert!(message.contains("standard"));
        assert_eq!(
            err.reason,
            NonconvertibleReason::NotInEnum {
                valid: vec![
                    "metric".to_string(),
                    "imperial".to_string(),
                    "standard".to_string()
                ],
            }
        );
    }

    #[test]
    fn enum_from_set_maps_to_itself() {
        let ty = ParamType::one_of(["xml", "json"]);
        assert_eq!(ty.convert(json!("json")).unwrap(), json!("json"));
    }

    #[test]
    fn doc_types() {
        assert_eq!(ParamType::Identity.doc_type(), "any");
        assert_eq!(ParamType::Class(ValueKind::String).doc_type(), "string");
        assert_eq!(ParamType::Duck(Capability::ToTime).doc_type(), "#to_time");
        assert_eq!(ParamType::one_of(["a", "b"]).doc_type(), "string");
        assert_eq!(
            ParamType::Enum(EnumMapping::from_pairs([(json!(1), json!("a")), (json!("x"), json!("b"))]))
                .doc_type(),
            "any"
        );
    }

    #[test]
    fn capability_parses_from_str() {
        assert_eq!(Capability::from_str("to_time").unwrap(), Capability::ToTime);
        assert_eq!(Capability::ToInteger.to_string(), "to_i");
    }
}
