//! Ordered, inheritable response transform processors.

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::trace;

use super::flatten::flatten;
use crate::error::{BoxError, ProcessingError};

type MutateFn = dyn Fn(&mut Map<String, Value>) -> Result<(), BoxError> + Send + Sync;
type ValueFn = dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync;

/// Selects response keys by exact name or regular expression.
#[derive(Debug, Clone)]
pub enum KeyMatcher {
    Exact(String),
    Pattern(Regex),
}

impl KeyMatcher {
    /// Compiles `pattern` into a [`KeyMatcher::Pattern`].
    ///
    /// ## Errors
    ///
    /// Returns the regex compile error for an invalid pattern.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self::Pattern)
    }

    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Exact(name) => name == key,
            Self::Pattern(re) => re.is_match(key),
        }
    }
}

impl fmt::Display for KeyMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(name) => write!(f, "`{name}`"),
            Self::Pattern(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl From<&str> for KeyMatcher {
    fn from(name: &str) -> Self {
        Self::Exact(name.to_string())
    }
}

impl From<String> for KeyMatcher {
    fn from(name: String) -> Self {
        Self::Exact(name)
    }
}

impl From<Regex> for KeyMatcher {
    fn from(re: Regex) -> Self {
        Self::Pattern(re)
    }
}

/// One step of a [`TransformPipeline`].
///
/// Processors see the response after it has been flattened, so nested keys
/// are addressed by their dotted names (`"main.temp"`).
#[derive(Clone)]
pub enum Processor {
    /// Mutates the whole response map in place.
    Mutate(Arc<MutateFn>),
    /// Replaces the value of every matching key.
    Keyed { key: KeyMatcher, f: Arc<ValueFn> },
    /// Replaces the whole response.
    Replace(Arc<ValueFn>),
    /// Transforms each element of every matching array-valued key, or only
    /// one sub-key of each element when `subkey` is set.
    Items {
        key: KeyMatcher,
        subkey: Option<String>,
        f: Arc<ValueFn>,
    },
}

impl Processor {
    pub fn mutate<F>(f: F) -> Self
    where
        F: Fn(&mut Map<String, Value>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self::Mutate(Arc::new(f))
    }

    pub fn keyed<F>(key: impl Into<KeyMatcher>, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::Keyed {
            key: key.into(),
            f: Arc::new(f),
        }
    }

    pub fn replace<F>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::Replace(Arc::new(f))
    }

    /// Transforms every element of the arrays under `key`.
    pub fn items<F>(key: impl Into<KeyMatcher>, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::Items {
            key: key.into(),
            subkey: None,
            f: Arc::new(f),
        }
    }

    /// Transforms `subkey` inside every element of the arrays under `key`.
    ///
    /// Elements without `subkey` are left as they are.
    pub fn item_field<F>(key: impl Into<KeyMatcher>, subkey: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::Items {
            key: key.into(),
            subkey: Some(subkey.into()),
            f: Arc::new(f),
        }
    }

    /// Short description used in logs and [`ProcessingError`].
    pub fn label(&self) -> String {
        match self {
            Self::Mutate(_) => "mutate".to_string(),
            Self::Keyed { key, .. } => format!("keyed {key}"),
            Self::Replace(_) => "replace".to_string(),
            Self::Items {
                key,
                subkey: Some(subkey),
                ..
            } => format!("items {key}.{subkey}"),
            Self::Items { key, .. } => format!("items {key}"),
        }
    }

    /// Applies this processor once.
    ///
    /// Key-addressed processors and `Mutate` leave non-map responses alone.
    pub fn apply(&self, value: Value) -> Result<Value, BoxError> {
        match (self, value) {
            (Self::Replace(f), value) => f(value),
            (Self::Mutate(f), Value::Object(mut map)) => {
                f(&mut map)?;
                Ok(Value::Object(map))
            }
            (Self::Keyed { key, f }, Value::Object(map)) => map
                .into_iter()
                .map(|(k, v)| -> Result<(String, Value), BoxError> {
                    let v = if key.matches(&k) { f(v)? } else { v };
                    Ok((k, v))
                })
                .collect::<Result<Map<_, _>, BoxError>>()
                .map(Value::Object),
            (Self::Items { key, subkey, f }, Value::Object(map)) => map
                .into_iter()
                .map(|(k, v)| -> Result<(String, Value), BoxError> {
                    match v {
                        Value::Array(items) if key.matches(&k) => {
                            let items = items
                                .into_iter()
                                .map(|item| apply_item(item, subkey.as_deref(), f.as_ref()))
                                .collect::<Result<Vec<_>, _>>()?;
                            Ok((k, Value::Array(items)))
                        }
                        v => Ok((k, v)),
                    }
                })
                .collect::<Result<Map<_, _>, BoxError>>()
                .map(Value::Object),
            (_, value) => Ok(value),
        }
    }
}

fn apply_item(item: Value, subkey: Option<&str>, f: &ValueFn) -> Result<Value, BoxError> {
    match (subkey, item) {
        (None, item) => f(item),
        (Some(subkey), Value::Object(mut element)) => {
            if let Some(slot) = element.get_mut(subkey) {
                *slot = f(slot.take())?;
            }
            Ok(Value::Object(element))
        }
        (Some(_), item) => Ok(item),
    }
}

impl fmt::Debug for Processor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Processor").field(&self.label()).finish()
    }
}

/// The processors attached to one node, linked to its parent's pipeline.
///
/// ## Examples
///
/// ```
/// use declarest_lib::response::{Processor, TransformPipeline};
/// use serde_json::json;
///
/// let mut pipeline = TransformPipeline::new();
/// pipeline.push(Processor::keyed("main.temp", |v| {
///     Ok(json!(v.as_f64().unwrap_or_default() - 273.15))
/// }));
///
/// let out = pipeline.run(json!({"main": {"temp": 300.0}}), "https://example.com").unwrap();
/// assert!((out["main.temp"].as_f64().unwrap() - 26.85).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TransformPipeline {
    parent: Option<Arc<TransformPipeline>>,
    processors: Vec<Processor>,
}

impl TransformPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Arc<TransformPipeline>) -> Self {
        Self {
            parent: Some(parent),
            processors: Vec::new(),
        }
    }

    pub fn push(&mut self, processor: Processor) {
        self.processors.push(processor);
    }

    pub fn parent(&self) -> Option<&Arc<TransformPipeline>> {
        self.parent.as_ref()
    }

    /// Processors registered on this node only.
    pub fn local_processors(&self) -> &[Processor] {
        &self.processors
    }

    /// Ancestors' processors first, then this node's, each in registration
    /// order.
    pub fn all_processors(&self) -> Vec<&Processor> {
        let mut all = match &self.parent {
            Some(parent) => parent.all_processors(),
            None => Vec::new(),
        };
        all.extend(self.processors.iter());
        all
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty() && self.parent.as_ref().is_none_or(|p| p.is_empty())
    }

    /// Flattens `value`, then folds it through every processor, flattening
    /// again after each one.
    ///
    /// ## Errors
    ///
    /// Returns [`ProcessingError`] for the first processor that fails; no
    /// partial result is kept.
    pub fn run(&self, value: Value, url: &str) -> Result<Value, ProcessingError> {
        let mut value = flatten(value);

        for (index, processor) in self.all_processors().into_iter().enumerate() {
            trace!(index, processor = %processor.label(), url, "applying processor");
            value = processor
                .apply(value)
                .map(flatten)
                .map_err(|source| ProcessingError {
                    url: url.to_string(),
                    processor: processor.label(),
                    index,
                    source,
                })?;
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://example.com/data";

    #[test]
    fn keyed_exact_and_pattern() {
        let value = json!({"temp.min": 1, "temp.max": 3, "name": "x"});

        let exact = Processor::keyed("name", |v| Ok(json!(v.as_str().map(str::to_uppercase))));
        assert_eq!(
            exact.apply(value.clone()).unwrap(),
            json!({"temp.min": 1, "temp.max": 3, "name": "X"})
        );

        let pattern = Processor::keyed(KeyMatcher::pattern(r"^temp\.").unwrap(), |v| {
            Ok(json!(v.as_i64().unwrap_or_default() * 10))
        });
        assert_eq!(
            pattern.apply(value).unwrap(),
            json!({"temp.min": 10, "temp.max": 30, "name": "x"})
        );
    }

    #[test]
    fn mutate_sees_whole_map() {
        let p = Processor::mutate(|map| {
            let sum: i64 = map.values().filter_map(Value::as_i64).sum();
            map.insert("sum".into(), json!(sum));
            Ok(())
        });
        assert_eq!(
            p.apply(json!({"a": 1, "b": 2})).unwrap(),
            json!({"a": 1, "b": 2, "sum": 3})
        );
        assert_eq!(p.apply(json!([1, 2])).unwrap(), json!([1, 2]));
    }

    #[test]
    fn replace_restructures_top_level() {
        let p = Processor::replace(|v| Ok(v["list"].clone()));
        assert_eq!(p.apply(json!({"list": [1, 2]})).unwrap(), json!([1, 2]));
    }

    #[test]
    fn item_field_skips_elements_without_subkey() {
        let p = Processor::item_field("list", "t", |v| Ok(json!(v.as_i64().unwrap_or_default() * 2)));
        let out = p
            .apply(json!({"list": [{"t": 1}, {"u": 5}, 7], "other": [{"t": 1}]}))
            .unwrap();
        assert_eq!(out, json!({"list": [{"t": 2}, {"u": 5}, 7], "other": [{"t": 1}]}));
    }

    #[test]
    fn items_without_subkey_map_whole_elements() {
        let p = Processor::items("list", |mut v| {
            if let Some(map) = v.as_object_mut() {
                map.remove("secret");
            }
            Ok(v)
        });
        let out = p.apply(json!({"list": [{"a": 1, "secret": 2}]})).unwrap();
        assert_eq!(out, json!({"list": [{"a": 1}]}));
    }

    #[test]
    fn pipeline_runs_parent_first() {
        let mut parent = TransformPipeline::new();
        parent.push(Processor::mutate(|m| {
            m.insert("order".into(), json!(["parent"]));
            Ok(())
        }));
        let mut child = TransformPipeline::with_parent(Arc::new(parent));
        child.push(Processor::keyed("order", |mut v| {
            if let Some(items) = v.as_array_mut() {
                items.push(json!("child"));
            }
            Ok(v)
        }));

        let out = child.run(json!({}), URL).unwrap();
        assert_eq!(out, json!({"order": ["parent", "child"]}));
        assert_eq!(child.all_processors().len(), 2);
        assert_eq!(child.local_processors().len(), 1);
    }

    #[test]
    fn pipeline_reflattens_after_each_step() {
        let mut pipeline = TransformPipeline::new();
        pipeline.push(Processor::keyed("wind", |v| Ok(json!({"speed": v}))));
        pipeline.push(Processor::keyed("wind.speed", |v| {
            Ok(json!(v.as_i64().unwrap_or_default() + 1))
        }));

        let out = pipeline.run(json!({"wind": 4}), URL).unwrap();
        assert_eq!(out, json!({"wind.speed": 5}));
    }

    #[test]
    fn null_result_removes_key() {
        let mut pipeline = TransformPipeline::new();
        pipeline.push(Processor::keyed("debug", |_| Ok(Value::Null)));
        let out = pipeline.run(json!({"debug": "x", "data": 1}), URL).unwrap();
        assert_eq!(out, json!({"data": 1}));
    }

    #[test]
    fn failure_carries_url_label_and_index() {
        let mut pipeline = TransformPipeline::new();
        pipeline.push(Processor::keyed("a", Ok));
        pipeline.push(Processor::keyed("dt", |_| Err("bad timestamp".into())));

        let err = pipeline.run(json!({"a": 1, "dt": "x"}), URL).unwrap_err();
        assert_eq!(err.url, URL);
        assert_eq!(err.index, 1);
        assert_eq!(err.processor, "keyed `dt`");
        assert_eq!(err.source.to_string(), "bad timestamp");
    }
}
