//! Response transform failures.

use thiserror::Error;

use super::BoxError;

/// A transform processor raised while post-processing a response.
///
/// The originating URL is attached so the failure can be traced back to the
/// request that produced the body. Processing has no partial result: the
/// whole call fails.
#[derive(Debug, Error)]
#[error("Processor #{index} ({processor}) failed for {url}: {source}")]
pub struct ProcessingError {
    /// The URL whose response was being processed.
    pub url: String,
    /// Human-readable label of the failing processor.
    pub processor: String,
    /// Position of the processor in the resolved (inherited-first) order.
    pub index: usize,
    /// The error the processor returned.
    #[source]
    pub source: BoxError,
}
