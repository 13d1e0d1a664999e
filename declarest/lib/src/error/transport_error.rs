//! HTTP status and transport errors.

use thiserror::Error;

use super::DecodeError;

/// Errors from the transport boundary.
///
/// These cover non-success HTTP statuses, bodies that cannot be decoded, and
/// failures of the bundled HTTP client.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The server returned a status outside 200..=399.
    #[error("HTTP {status} at {url}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    HttpStatus {
        /// The HTTP status code returned.
        status: u16,
        /// The effective request URL.
        url: String,
        /// Message extracted from a JSON body's `message`/`error` key.
        message: Option<String>,
    },

    /// The body could not be decoded in the expected wire format.
    #[error("Undecodable body from {url}: {source}")]
    Decode {
        /// The effective request URL.
        url: String,
        /// The decoder failure.
        #[source]
        source: DecodeError,
    },

    /// HTTP request failed due to a network or protocol error.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl TransportError {
    /// Returns the HTTP status code if one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::Decode { .. } => None,
        }
    }

    /// Returns the URL the failure relates to, when known.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { url, .. } | Self::Decode { url, .. } => Some(url),
            Self::Request(e) => e.url().map(|u| u.as_str()),
        }
    }
}
