//! Value formatters and wire stringification.

use std::fmt::{self, Write};
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use serde_json::Value;

use super::coerce::to_time;

type FormatFn = dyn Fn(Value) -> Result<Value, String> + Send + Sync;

/// Turns a converted parameter value into the value sent on the wire.
///
/// Formatters run after type conversion and before stringification. The
/// default formatter is the identity.
///
/// ## Examples
///
/// ```
/// use declarest_lib::param::Formatter;
/// use serde_json::json;
///
/// let fmt = Formatter::unix_timestamp();
/// assert_eq!(fmt.apply(json!("1970-01-02T00:00:00Z")).unwrap(), json!(86400));
///
/// let upper = Formatter::custom("upcase", |v| {
///     Ok(v.as_str().map(|s| s.to_uppercase().into()).unwrap_or(v))
/// });
/// assert_eq!(upper.apply(json!("ny")).unwrap(), json!("NY"));
/// ```
#[derive(Clone, Default)]
pub struct Formatter {
    label: Option<String>,
    f: Option<Arc<FormatFn>>,
}

impl Formatter {
    /// Returns the value unchanged.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Wraps an arbitrary formatting function.
    ///
    /// The error string becomes the reason of the resulting
    /// `NonconvertibleError`.
    pub fn custom<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self {
            label: Some(label.into()),
            f: Some(Arc::new(f)),
        }
    }

    /// Date-like values to integer epoch seconds.
    pub fn unix_timestamp() -> Self {
        Self::custom("unix_timestamp", |value| {
            to_time(&value)
                .map(|t| Value::from(t.timestamp()))
                .ok_or_else(|| format!("{value} is not a date-like value"))
        })
    }

    /// Date-like values rendered with a `strftime` pattern.
    ///
    /// An invalid pattern is detected here and makes every application fail.
    pub fn strftime(pattern: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let valid = !StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error));
        Self::custom(format!("strftime({pattern})"), move |value| {
            if !valid {
                return Err(format!("invalid strftime pattern `{pattern}`"));
            }
            let t = to_time(&value).ok_or_else(|| format!("{value} is not a date-like value"))?;
            let mut out = String::new();
            write!(out, "{}", t.format(&pattern))
                .map_err(|_| format!("invalid strftime pattern `{pattern}`"))?;
            Ok(Value::String(out))
        })
    }

    /// Lowercases string values; other values pass through.
    pub fn lowercase() -> Self {
        Self::custom("lowercase", |value| {
            Ok(match value {
                Value::String(s) => Value::String(s.to_lowercase()),
                other => other,
            })
        })
    }

    pub fn apply(&self, value: Value) -> Result<Value, String> {
        match &self.f {
            Some(f) => f(value),
            None => Ok(value),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.f.is_none()
    }

    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("identity")
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Formatter").field(&self.label()).finish()
    }
}

/// Stringifies a formatted value for the URL.
///
/// Arrays join their elements with commas; strings are used as-is; anything
/// else goes through its generic string form.
pub fn to_wire(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(to_wire).collect::<Vec<_>>().join(","),
        other => other.to_string(),
    }
}
