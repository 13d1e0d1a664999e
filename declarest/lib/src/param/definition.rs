//! A single declared parameter.

use serde_json::Value;

use super::coerce::ParamType;
use super::format::{Formatter, to_wire};
use crate::error::{NonconvertibleError, NonconvertibleReason, ParamError};

/// Declaration options for a parameter.
///
/// Every field is optional so that a re-declaration of the same name on the
/// same node overrides only what it sets.
///
/// ## Examples
///
/// ```
/// use declarest_lib::param::{ParamOptions, ValueKind};
///
/// let opts = ParamOptions::new()
///     .field("q")
///     .param_type(ValueKind::String)
///     .required()
///     .description("City name");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ParamOptions {
    pub(crate) field: Option<String>,
    pub(crate) param_type: Option<ParamType>,
    pub(crate) required: Option<bool>,
    pub(crate) default: Option<Value>,
    pub(crate) keyword: Option<bool>,
    pub(crate) description: Option<String>,
    pub(crate) formatter: Option<Formatter>,
}

impl ParamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the wire-level key (defaults to the parameter name).
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Sets the coercion rule.
    pub fn param_type(mut self, param_type: impl Into<ParamType>) -> Self {
        self.param_type = Some(param_type.into());
        self
    }

    /// Marks the parameter as required.
    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }

    /// Marks the parameter as optional.
    pub fn optional(mut self) -> Self {
        self.required = Some(false);
        self
    }

    /// Sets the value used when an optional parameter is not supplied.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Makes the parameter positional in the call signature.
    pub fn positional(mut self) -> Self {
        self.keyword = Some(false);
        self
    }

    /// Makes the parameter a keyword argument in the call signature.
    pub fn keyword(mut self) -> Self {
        self.keyword = Some(true);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the formatter applied after conversion.
    pub fn format(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }
}

/// One declared input of a node.
///
/// Processing is pure: [`Param::convert_and_format`] runs the type
/// conversion, then the formatter, then stringifies the result.
#[derive(Debug, Clone)]
pub struct Param {
    name: String,
    field: String,
    param_type: ParamType,
    required: bool,
    default: Option<Value>,
    keyword: bool,
    description: Option<String>,
    formatter: Formatter,
}

impl Param {
    /// Declares a parameter. Unset options default to an optional keyword
    /// parameter of any type whose field is its name.
    pub fn new(name: impl Into<String>, options: ParamOptions) -> Self {
        let name = name.into();
        let mut param = Self {
            field: name.clone(),
            name,
            param_type: ParamType::Identity,
            required: false,
            default: None,
            keyword: true,
            description: None,
            formatter: Formatter::identity(),
        };
        param.merge(options);
        param
    }

    /// A parameter extracted from a `{placeholder}` in a path template.
    pub(crate) fn from_path(name: impl Into<String>) -> Self {
        let mut param = Self::new(name, ParamOptions::default());
        param.force_positional();
        param
    }

    /// Field-wise override with whatever `options` sets.
    pub(crate) fn merge(&mut self, options: ParamOptions) {
        let ParamOptions {
            field,
            param_type,
            required,
            default,
            keyword,
            description,
            formatter,
        } = options;

        if let Some(field) = field {
            self.field = field;
        }
        if let Some(param_type) = param_type {
            self.param_type = param_type;
        }
        if let Some(required) = required {
            self.required = required;
        }
        if default.is_some() {
            self.default = default;
        }
        if let Some(keyword) = keyword {
            self.keyword = keyword;
        }
        if description.is_some() {
            self.description = description;
        }
        if let Some(formatter) = formatter {
            self.formatter = formatter;
        }
    }

    /// Path parameters are always positional, required and without default.
    ///
    /// The template is expanded by placeholder name, so the field is reset
    /// to the name.
    pub(crate) fn force_positional(&mut self) {
        self.field = self.name.clone();
        self.keyword = false;
        self.required = true;
        self.default = None;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn param_type(&self) -> &ParamType {
        &self.param_type
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_keyword(&self) -> bool {
        self.keyword
    }

    /// The default value; never set for required parameters.
    pub fn default_value(&self) -> Option<&Value> {
        if self.required {
            None
        } else {
            self.default.as_ref()
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    /// Converts `raw` by type and applies the formatter.
    pub fn convert(&self, raw: Value) -> Result<Value, ParamError> {
        let converted = self
            .param_type
            .convert(raw)
            .map_err(|source| self.nonconvertible(source))?;

        self.formatter.apply(converted.clone()).map_err(|message| {
            self.nonconvertible(NonconvertibleError::new(
                converted,
                NonconvertibleReason::Format(message),
            ))
        })
    }

    /// Converts, formats and stringifies `raw` for the wire.
    ///
    /// ## Errors
    ///
    /// Returns [`ParamError::Nonconvertible`] when the type rejects the value
    /// or the formatter fails.
    pub fn convert_and_format(&self, raw: Value) -> Result<String, ParamError> {
        self.convert(raw).map(|v| to_wire(&v))
    }

    fn nonconvertible(&self, source: NonconvertibleError) -> ParamError {
        ParamError::Nonconvertible {
            param: self.name.clone(),
            source,
        }
    }

    /// Documentation tag for the accepted type.
    pub fn doc_type(&self) -> String {
        self.param_type.doc_type()
    }

    /// Documentation fragment: name, type tag, description, possible values
    /// and default.
    pub fn describe(&self) -> String {
        let mut out = format!("@param {} [{}]", self.name, self.doc_type());
        if let Some(description) = &self.description {
            out.push(' ');
            out.push_str(description);
        }
        if let Some(values) = self.param_type.possible_values() {
            out.push_str("\n  Possible values: ");
            out.push_str(&values.join(", "));
        }
        if let Some(default) = self.default_value() {
            out.push_str(&format!("\n  (default = {default})"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Capability, ValueKind};
    use serde_json::json;

    #[test]
    fn defaults() {
        let param = Param::new("city", ParamOptions::new());
        assert_eq!(param.field(), "city");
        assert!(param.is_keyword());
        assert!(!param.is_required());
        assert_eq!(param.param_type(), &ParamType::Identity);
    }

    #[test]
    fn from_path_is_positional_required() {
        let param = Param::from_path("id");
        assert!(!param.is_keyword());
        assert!(param.is_required());
        assert_eq!(param.default_value(), None);
    }

    #[test]
    fn merge_overrides_only_set_fields() {
        let mut param = Param::new(
            "units",
            ParamOptions::new().field("u").description("Units"),
        );
        param.merge(ParamOptions::new().default_value("metric"));
        assert_eq!(param.field(), "u");
        assert_eq!(param.description(), Some("Units"));
        assert_eq!(param.default_value(), Some(&json!("metric")));
    }

    #[test]
    fn required_hides_default() {
        let param = Param::new(
            "units",
            ParamOptions::new().default_value("metric").required(),
        );
        assert_eq!(param.default_value(), None);
    }

    #[test]
    fn convert_and_format_pipeline() {
        let param = Param::new(
            "dt",
            ParamOptions::new()
                .param_type(Capability::ToTime)
                .format(Formatter::unix_timestamp()),
        );
        assert_eq!(
            param.convert_and_format(json!("1970-01-01T00:01:00Z")).unwrap(),
            "60"
        );
    }

    #[test]
    fn convert_and_format_joins_arrays() {
        let param = Param::new("ids", ParamOptions::new().param_type(ValueKind::Array));
        assert_eq!(param.convert_and_format(json!([1, 2, 3])).unwrap(), "1,2,3");
    }

    #[test]
    fn type_failure_names_param() {
        let param = Param::new("count", ParamOptions::new().param_type(ValueKind::Integer));
        let err = param.convert_and_format(json!("ten")).unwrap_err();
        match err {
            ParamError::Nonconvertible { param, source } => {
                assert_eq!(param, "count");
                assert_eq!(source.value, json!("ten"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn formatter_failure_is_nonconvertible() {
        let param = Param::new("at", ParamOptions::new().format(Formatter::unix_timestamp()));
        let err = param.convert_and_format(json!(true)).unwrap_err();
        assert!(matches!(
            err,
            ParamError::Nonconvertible {
                source: NonconvertibleError {
                    reason: NonconvertibleReason::Format(_),
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn describe_includes_values_and_default() {
        let param = Param::new(
            "units",
            ParamOptions::new()
                .param_type(ParamType::one_of(["metric", "imperial"]))
                .default_value("metric")
                .description("Units of measurement"),
        );
        assert_eq!(
            param.describe(),
            "@param units [string] Units of measurement\n  Possible values: metric, imperial\n  (default = \"metric\")"
        );
    }
}
