//! GET transport for assembled APIs.
//!
//! This module provides the [`ApiClient`] struct, the bundled transport for
//! an assembled [`Api`]: it builds the URL of a node, fetches it and hands
//! the raw response to the node's processing pipeline.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde_json::{Map, Value};
use tracing::{Span, debug, instrument};
use url::Url;

use crate::error::{ApiError, ConfigError, TransportError};
use crate::node::{Api, Node};
use crate::response::{RawResponse, ResponseValue};

/// Seconds before an unanswered request is abandoned.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configures timeout and default headers of an [`ApiClient`].
#[derive(Debug)]
pub struct ApiClientBuilder {
    timeout: Duration,
    default_headers: HeaderMap,
}

impl ApiClientBuilder {
    fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("declarest/", env!("CARGO_PKG_VERSION"))),
        );
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers,
        }
    }

    /// Overrides the per-request timeout.
    ///
    /// ## Examples
    ///
    /// ```rust,ignore
    /// use std::time::Duration;
    ///
    /// let client = ApiClient::builder()
    ///     .timeout(Duration::from_secs(60))
    ///     .build()?;
    /// ```
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sends `name: value` with every request.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if the header name or value is
    /// invalid.
    pub fn default_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Result<Self, ApiError> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| ConfigError::InvalidHeader(format!("invalid header name: {e}")))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| ConfigError::InvalidHeader(format!("invalid header value: {e}")))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Replaces the `User-Agent` header.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidHeader`] if the value is invalid.
    pub fn user_agent(self, agent: impl AsRef<str>) -> Result<Self, ApiError> {
        self.default_header(USER_AGENT.as_str(), agent)
    }

    /// Finishes configuration.
    ///
    /// ## Errors
    ///
    /// Returns [`TransportError::Request`] when reqwest rejects the settings.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .default_headers(self.default_headers)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(TransportError::Request)?;

        Ok(ApiClient { client })
    }
}

/// Async HTTP client for calling the nodes of an [`Api`].
///
/// The client only moves bytes: status classification, decoding and
/// post-processing belong to the node. It is cheap to clone and safe to
/// share.
///
/// ## Examples
///
/// ```rust,ignore
/// use declarest_lib::{Api, ApiClient, NodeBuilder, ParamOptions};
/// use serde_json::json;
///
/// let api = Api::builder("weather", "https://api.example.com/data/2.5")
///     .param("appid", ParamOptions::new().required())
///     .child(NodeBuilder::endpoint("weather").param("q", ParamOptions::new()))
///     .build()?;
///
/// let client = ApiClient::new()?;
/// let args = json!({"appid": "KEY", "q": "Kyiv"});
/// let current = client.invoke(&api, "weather", args.as_object().unwrap()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    /// Starts a builder with the default timeout and `User-Agent`.
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::new()
    }

    /// A client with default settings.
    ///
    /// ## Errors
    ///
    /// See [`ApiClientBuilder::build`].
    pub fn new() -> Result<Self, ApiError> {
        Self::builder().build()
    }

    /// Calls the node at dotted `path` of `api` with `args`.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::UnknownNode`] for an unknown path, and
    /// otherwise whatever [`ApiClient::call`] returns.
    pub async fn invoke(
        &self,
        api: &Api,
        path: &str,
        args: &Map<String, Value>,
    ) -> Result<ResponseValue, ApiError> {
        self.call(api.node(path)?, args).await
    }

    /// Builds the node's URL, fetches it and processes the response.
    ///
    /// ## Errors
    ///
    /// - [`ParamError`](crate::ParamError) when the node's parameters reject `args`
    /// - [`TransportError::Request`] on connection failure or timeout
    /// - [`TransportError::HttpStatus`] for a status outside `200..=399`
    /// - [`TransportError::Decode`] or [`ProcessingError`](crate::ProcessingError)
    ///   from the node's response pipeline
    pub async fn call(
        &self,
        node: &Node,
        args: &Map<String, Value>,
    ) -> Result<ResponseValue, ApiError> {
        let url = node.build_url(args)?;
        let raw = self.fetch(&url).await?;
        node.process_response(&raw)
    }

    /// Sends a GET request and returns the raw response, whatever its status.
    ///
    /// ## Errors
    ///
    /// Returns an error if the URL is invalid or the request itself fails.
    #[instrument(
        name = "api_request",
        skip(self),
        fields(
            http.method = "GET",
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    pub async fn fetch(&self, url: &str) -> Result<RawResponse, ApiError> {
        let url = Url::parse(url).map_err(ConfigError::InvalidUrl)?;

        Span::current().record("http.url", url.as_str());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(TransportError::Request)?;

        let status = response.status();
        let status_code = status.as_u16();

        Span::current().record("http.status_code", status_code);

        let otel_status = if status.is_server_error() {
            "ERROR"
        } else if status.is_client_error() {
            "UNSET"
        } else {
            "OK"
        };
        Span::current().record("otel.status_code", otel_status);

        let effective_url = response.url().to_string();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(TransportError::Request)?;

        debug!(bytes = body.len(), "response received");

        Ok(RawResponse {
            status: status_code,
            url: effective_url,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParamError;
    use crate::node::NodeBuilder;
    use crate::param::ParamOptions;
    use crate::response::{BodyFormat, Processor};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap_or_default()
    }

    fn weather_api(base: &str) -> Api {
        Api::builder("weather", base)
            .param("appid", ParamOptions::new().required())
            .child(
                NodeBuilder::endpoint("current")
                    .path("/weather")
                    .param("city", ParamOptions::new().field("q").required())
                    .processor(Processor::keyed("main.temp", |v| {
                        Ok(json!(v.as_f64().unwrap_or_default().round()))
                    })),
            )
            .child(
                NodeBuilder::endpoint("stations")
                    .path("/stations.yaml")
                    .format(BodyFormat::Yaml),
            )
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_invoke_processes_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("appid", "KEY"))
            .and(query_param("q", "New York"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "New York",
                "main": {"temp": 21.4, "humidity": null},
                "weather": [{"id": 800, "main": "Clear"}]
            })))
            .mount(&mock_server)
            .await;

        let api = weather_api(&mock_server.uri());
        let client = ApiClient::new().unwrap();

        let result = client
            .invoke(&api, "current", &args(json!({"appid": "KEY", "city": "New York"})))
            .await
            .unwrap();

        assert_eq!(result.get("name").and_then(ResponseValue::as_str), Some("New York"));
        assert_eq!(result.get("main.temp").and_then(ResponseValue::as_f64), Some(21.0));
        assert!(result.get("main.humidity").is_none());
        let weather = result.get("weather").and_then(ResponseValue::as_table).unwrap();
        assert_eq!(weather.keys(), ["id", "main"]);
    }

    #[tokio::test]
    async fn test_node_decoder_is_used() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/stations.yaml"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("- id: 1\n  name: A\n- id: 2\n"),
            )
            .mount(&mock_server)
            .await;

        let api = weather_api(&mock_server.uri());
        let client = ApiClient::new().unwrap();
        let result = client
            .invoke(&api, "stations", &args(json!({"appid": "KEY"})))
            .await
            .unwrap();

        let table = result.as_table().unwrap();
        assert_eq!(table.keys(), ["id", "name"]);
        assert!(table.row(1).unwrap()["name"].is_null());
    }

    #[tokio::test]
    async fn test_http_error_carries_message() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"cod": 401, "message": "Invalid API key"})),
            )
            .mount(&mock_server)
            .await;

        let api = weather_api(&mock_server.uri());
        let client = ApiClient::new().unwrap();
        let err = client
            .invoke(&api, "current", &args(json!({"appid": "bad", "city": "Kyiv"})))
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_redirect_status_is_success() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(203).set_body_json(json!({"ok": true})))
            .mount(&mock_server)
            .await;

        let api = weather_api(&mock_server.uri());
        let client = ApiClient::new().unwrap();
        let result = client
            .invoke(&api, "current", &args(json!({"appid": "k", "city": "x"})))
            .await
            .unwrap();
        assert_eq!(result.get("ok").and_then(ResponseValue::as_bool), Some(true));
    }

    #[tokio::test]
    async fn test_param_errors_short_circuit() {
        let api = weather_api("http://127.0.0.1:9");
        let client = ApiClient::new().unwrap();
        let err = client
            .invoke(&api, "current", &args(json!({"city": "Kyiv"})))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Param(ParamError::Missing { .. })));
    }

    #[tokio::test]
    async fn test_unknown_node() {
        let api = weather_api("http://127.0.0.1:9");
        let client = ApiClient::new().unwrap();
        let err = client.invoke(&api, "forecast", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ApiError::Config(ConfigError::UnknownNode { .. })));
    }

    #[tokio::test]
    async fn test_default_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/ping"))
            .and(header("X-Custom", "value"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&mock_server)
            .await;

        let client = ApiClient::builder()
            .default_header("X-Custom", "value")
            .unwrap()
            .build()
            .unwrap();

        let raw = client
            .fetch(&format!("{}/ping", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(raw.status, 200);
        assert_eq!(raw.body.as_ref(), b"{}");
    }

    #[tokio::test]
    async fn test_custom_timeout_and_user_agent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(header("user-agent", "weather-bot/1.0"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = ApiClient::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("weather-bot/1.0")
            .unwrap()
            .build()
            .unwrap();

        let raw = client.fetch(&mock_server.uri()).await.unwrap();
        assert_eq!(raw.status, 200);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let err = ApiClient::builder()
            .default_header("bad header", "v")
            .unwrap_err();
        assert!(matches!(err, ApiError::Config(ConfigError::InvalidHeader(_))));
    }

    #[tokio::test]
    async fn test_invalid_url() {
        let client = ApiClient::new().unwrap();
        let err = client.fetch("not a url").await.unwrap_err();
        assert!(matches!(err, ApiError::Config(ConfigError::InvalidUrl(_))));
    }

    #[tokio::test]
    #[tracing_test::traced_test]
    async fn test_fetch_records_span_fields() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&mock_server)
            .await;

        let client = ApiClient::new().unwrap();
        client.fetch(&mock_server.uri()).await.unwrap();

        assert!(logs_contain("api_request"));
        assert!(logs_contain("http.status_code=200"));
        assert!(logs_contain("response received"));
    }
}
