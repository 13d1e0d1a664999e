//! Top-level API error type.

use super::{ConfigError, ParamError, ProcessingError, TransportError};
use thiserror::Error;

/// Top-level error type for all engine operations.
///
/// Every failure surfaces synchronously to the caller of `build_url` or
/// `process_response`; nothing is retried or swallowed along the way.
///
/// ## Examples
///
/// ```rust,ignore
/// use declarest_lib::error::ApiError;
///
/// fn handle_error(err: ApiError) {
///     match err {
///         ApiError::Param(e) => eprintln!("Bad arguments: {e}"),
///         ApiError::Transport(e) => eprintln!("Request failed: {e}"),
///         ApiError::Processing(e) => eprintln!("Post-processing failed: {e}"),
///         ApiError::Config(e) => eprintln!("Invalid declaration: {e}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// Parameter validation or conversion failed.
    #[error(transparent)]
    Param(#[from] ParamError),

    /// HTTP status errors and undecodable bodies.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response transform processor failed.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// The API tree or a lookup against it is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Returns the HTTP status code if this error came from a failed response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status_code(),
            _ => None,
        }
    }
}
