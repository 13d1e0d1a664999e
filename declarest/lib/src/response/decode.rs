//! Body decoders.
//!
//! A [`Decoder`] turns a raw response body into the JSON-like value tree the
//! pipeline works on. Each wire format (JSON, YAML, XML) has its own
//! implementation; nodes inherit their parent's decoder unless they set one.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use strum::{Display, EnumIter, EnumString};

use crate::error::DecodeError;

/// Trait for body decoding strategies.
pub trait Decoder: Send + Sync + fmt::Debug {
    /// Decodes `body` into a value tree.
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError>;

    /// Returns the Content-Type this decoder expects.
    fn content_type(&self) -> &'static str;
}

fn non_empty(body: &[u8]) -> Result<&[u8], DecodeError> {
    if body.trim_ascii().is_empty() {
        Err(DecodeError::EmptyBody)
    } else {
        Ok(body)
    }
}

/// JSON bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        Ok(serde_json::from_slice(non_empty(body)?)?)
    }

    fn content_type(&self) -> &'static str {
        "application/json"
    }
}

/// YAML bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlDecoder;

impl Decoder for YamlDecoder {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        Ok(serde_yaml::from_slice(non_empty(body)?)?)
    }

    fn content_type(&self) -> &'static str {
        "application/yaml"
    }
}

/// XML bodies.
///
/// The root element's children become map entries; attributes are keyed with
/// a leading `@` and mixed text with `$text`, following quick-xml's serde
/// conventions. All leaf values arrive as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDecoder;

impl Decoder for XmlDecoder {
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        Ok(quick_xml::de::from_reader(non_empty(body)?)?)
    }

    fn content_type(&self) -> &'static str {
        "application/xml"
    }
}

/// Built-in wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum BodyFormat {
    #[default]
    Json,
    Yaml,
    Xml,
}

impl BodyFormat {
    /// Returns the decoder for this format.
    pub fn decoder(self) -> Arc<dyn Decoder> {
        match self {
            Self::Json => Arc::new(JsonDecoder),
            Self::Yaml => Arc::new(YamlDecoder),
            Self::Xml => Arc::new(XmlDecoder),
        }
    }
}
