//! Response body decoding errors.

use thiserror::Error;

/// Errors while turning a raw body into a JSON-like value tree.
///
/// Each variant corresponds to a specific wire format.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failed.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// XML parsing failed.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    /// Empty response body when content was expected.
    #[error("Empty response body")]
    EmptyBody,
}

impl DecodeError {
    /// Returns `true` if this is a parsing error rather than a missing body.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, Self::Json(_) | Self::Yaml(_) | Self::Xml(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_parse_is_parse_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = DecodeError::Json(json_err);
        assert!(err.is_parse_error());
        assert!(err.to_string().starts_with("JSON parse error"));
    }

    #[test]
    fn test_empty_body_not_parse_error() {
        assert!(!DecodeError::EmptyBody.is_parse_error());
        assert_eq!(DecodeError::EmptyBody.to_string(), "Empty response body");
    }
}
