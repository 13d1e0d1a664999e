//! Declarative REST API engine.
//!
//! The `declarest-lib` crate describes REST-style APIs as a tree of
//! namespaces and endpoints, each carrying a typed parameter schema, and
//! normalizes their responses into a discoverable shape.
//!
//! ## Features
//!
//! - **Typed, inheritable parameters**: identity, class, duck-typed and enum
//!   coercion; defaults, formatters, batch-reported unknown/missing names
//! - **URL building**: path placeholders filled from parameters, everything
//!   else appended as a correctly encoded query string
//! - **Response pipeline**: flattening to dot-joined keys, ordered transform
//!   processors inherited down the tree, tabularization of arrays of maps
//! - **Pluggable decoding**: JSON, YAML and XML bodies
//! - **Async HTTP client**: Built on `reqwest` with `tokio`, traced with
//!   OpenTelemetry-style span fields
//!
//! ## Example
//!
//! ```rust
//! use declarest_lib::{Api, NodeBuilder, ParamOptions, Processor, RawResponse};
//! use serde_json::json;
//!
//! let api = Api::builder("weather", "https://api.example.com/data/2.5")
//!     .param("appid", ParamOptions::new().required())
//!     .child(
//!         NodeBuilder::endpoint("find")
//!             .param("city", ParamOptions::new().field("q").required())
//!             .processor(Processor::item_field("list", "dt", |v| {
//!                 Ok(json!(v.as_i64().map(|t| t * 1000)))
//!             })),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let args = json!({"appid": "KEY", "city": "New York"});
//! let url = api.build_url("find", args.as_object().unwrap()).unwrap();
//! assert_eq!(url, "https://api.example.com/data/2.5/find?appid=KEY&q=New%20York");
//!
//! let raw = RawResponse::new(200, url, r#"{"list": [{"dt": 1, "main": {"temp": 3}}]}"#);
//! let value = api.process_response("find", &raw).unwrap();
//! let list = value.get("list").and_then(|v| v.as_table()).unwrap();
//! assert_eq!(list.keys(), ["dt", "main.temp"]);
//! ```

pub mod client;
pub mod error;
pub mod node;
pub mod param;
pub mod response;
pub mod symbol;
pub mod uri_template;
pub mod url_builder;

// Re-exports for convenience
pub use client::{ApiClient, ApiClientBuilder};
pub use error::{ApiError, ConfigError, DecodeError, ParamError, ProcessingError, TransportError};
pub use node::{Api, ApiBuilder, Node, NodeBuilder, NodeKind};
pub use param::{Formatter, Param, ParamOptions, ParamSet, ParamType, Redeclaration};
pub use response::{DataTable, Processor, RawResponse, ResponseValue, TransformPipeline};
pub use symbol::{Symbol, SymbolError};
