//! Parameter validation and conversion errors.

use serde_json::Value;
use thiserror::Error;

use crate::param::{Capability, ValueKind};

/// Why a value failed its parameter's type validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NonconvertibleReason {
    /// The value's runtime kind does not match the declared class constraint.
    #[error("expected {expected}, got {actual}")]
    WrongKind {
        /// The declared kind.
        expected: ValueKind,
        /// The kind actually supplied.
        actual: ValueKind,
    },

    /// The value cannot produce the declared capability.
    #[error("value does not respond to {0}")]
    MissingCapability(Capability),

    /// The value is not a key of the declared enum mapping.
    #[error("expected one of: {}", .valid.join(", "))]
    NotInEnum {
        /// Every valid key, in declaration order.
        valid: Vec<String>,
    },

    /// The parameter's formatter rejected the converted value.
    #[error("formatting failed: {0}")]
    Format(String),
}

/// A supplied value failed a parameter's type validation.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{value} is not convertible: {reason}")]
pub struct NonconvertibleError {
    /// The offending value as supplied.
    pub value: Value,
    /// What went wrong.
    pub reason: NonconvertibleReason,
}

impl NonconvertibleError {
    pub fn new(value: Value, reason: NonconvertibleReason) -> Self {
        Self { value, reason }
    }
}

/// Errors raised while processing caller-supplied parameter values.
///
/// Unknown and missing parameters are batch-reported: every offending name is
/// listed, not just the first one found. Type errors fail fast.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    /// A value failed its parameter's type validation.
    #[error("Invalid value for `{param}`: {source}")]
    Nonconvertible {
        /// The parameter name.
        param: String,
        /// The underlying conversion failure.
        #[source]
        source: NonconvertibleError,
    },

    /// Names absent from the resolved parameter set were supplied.
    #[error("Unknown parameter(s): {}", .names.join(", "))]
    Unknown {
        /// Every unknown name, in the order supplied.
        names: Vec<String>,
    },

    /// Required parameters were not supplied.
    #[error("Missing required parameter(s): {}", .names.join(", "))]
    Missing {
        /// Every missing name, in declaration order.
        names: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_in_enum_lists_valid_keys() {
        let err = NonconvertibleError::new(
            json!("kelvin"),
            NonconvertibleReason::NotInEnum {
                valid: vec!["metric".to_string(), "imperial".to_string()],
            },
        );
        assert_eq!(
            err.to_string(),
            "\"kelvin\" is not convertible: expected one of: metric, imperial"
        );
    }

    #[test]
    fn test_wrong_kind_display() {
        let reason = NonconvertibleReason::WrongKind {
            expected: ValueKind::Integer,
            actual: ValueKind::String,
        };
        assert_eq!(reason.to_string(), "expected integer, got string");
    }

    #[test]
    fn test_batch_messages() {
        let unknown = ParamError::Unknown {
            names: vec!["foo".to_string(), "bar".to_string()],
        };
        assert_eq!(unknown.to_string(), "Unknown parameter(s): foo, bar");

        let missing = ParamError::Missing {
            names: vec!["city".to_string()],
        };
        assert_eq!(missing.to_string(), "Missing required parameter(s): city");
    }
}
