//! HTTP transport for assembled APIs.

mod executor;

pub use executor::{ApiClient, ApiClientBuilder};
