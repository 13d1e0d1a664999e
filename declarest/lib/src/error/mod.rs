//! Layered error types for the engine.
//!
//! The error hierarchy is structured for actionable diagnostics:
//! - [`ApiError`] - Top-level error type returned by every entry point
//! - [`ParamError`] - Caller-supplied parameter values were rejected
//! - [`TransportError`] - HTTP status failures and unreadable bodies
//! - [`DecodeError`] - Body decoding failures (JSON, YAML, XML)
//! - [`ProcessingError`] - A response transform processor failed
//! - [`ConfigError`] - The declared API tree is invalid

mod api_error;
mod config_error;
mod decode_error;
mod param_error;
mod processing_error;
mod transport_error;

pub use api_error::ApiError;
pub use config_error::ConfigError;
pub use decode_error::DecodeError;
pub use param_error::{NonconvertibleError, NonconvertibleReason, ParamError};
pub use processing_error::ProcessingError;
pub use transport_error::TransportError;

/// Boxed error returned by user-supplied transform processors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
