//! Response entry points: status classification, decoding, normalization.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde_json::Value;
use tracing::debug;

use super::decode::Decoder;
use super::tabularize::tabularize;
use super::transform::TransformPipeline;
use super::value::ResponseValue;
use crate::error::{ApiError, ProcessingError, TransportError};

/// The envelope a transport hands to the engine.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// The effective request URL.
    pub url: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            url: url.into(),
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Returns `true` for statuses in `200..=399`.
    pub fn is_success(&self) -> bool {
        (200..=399).contains(&self.status)
    }
}

/// Classifies, decodes and normalizes a raw response.
///
/// ## Errors
///
/// - [`TransportError::HttpStatus`] for statuses outside `200..=399`, with the
///   body's `message`/`error` text when it is JSON carrying one
/// - [`TransportError::Decode`] when the body does not decode
/// - [`ProcessingError`] when a transform processor fails
///
/// A success status with an empty body (`204 No Content`, `304 Not
/// Modified`) yields [`ResponseValue::Null`] without decoding.
pub fn process_response(
    raw: &RawResponse,
    decoder: &dyn Decoder,
    pipeline: &TransformPipeline,
) -> Result<ResponseValue, ApiError> {
    if !raw.is_success() {
        return Err(TransportError::HttpStatus {
            status: raw.status,
            url: raw.url.clone(),
            message: error_message(&raw.body),
        }
        .into());
    }

    if raw.body.trim_ascii().is_empty() {
        debug!(url = %raw.url, status = raw.status, "empty success body");
        return Ok(ResponseValue::Null);
    }

    let body = decoder
        .decode(&raw.body)
        .map_err(|source| TransportError::Decode {
            url: raw.url.clone(),
            source,
        })?;

    Ok(process_value(body, pipeline, &raw.url)?)
}

/// Runs an already decoded body through flattening, the transform pipeline
/// and tabularization.
pub fn process_value(
    body: Value,
    pipeline: &TransformPipeline,
    url: &str,
) -> Result<ResponseValue, ProcessingError> {
    let value = pipeline.run(body, url)?;
    debug!(url, "response processed");
    Ok(tabularize(value))
}

/// Extracts an error description from a JSON body's `message` or `error`
/// key. An `error` object contributes its own `message`.
pub fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let map = value.as_object()?;

    ["message", "error"].iter().find_map(|key| match map.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Object(inner) => inner
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}
