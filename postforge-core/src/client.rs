//! Authenticated LinkedIn REST client.
//!
//! [`ApiClient::call`] issues exactly one request and normalizes the outcome:
//! - 2xx with an empty body -> [`UpstreamBody::Empty`] (status + headers survive
//!   so callers can recover ids from headers)
//! - 2xx with a JSON body -> [`UpstreamBody::Json`]
//! - 2xx with anything else -> [`UpstreamBody::Text`]
//! - any other status -> [`ApiError::Upstream`] with the body text verbatim
//!
//! There is no retry, backoff or caching here. A timed-out request is a
//! [`ApiError::Transport`] failure like any other.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::credential::Credential;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.linkedin.com";

/// `LinkedIn-Version` sent when none is configured.
pub const DEFAULT_API_VERSION: &str = "202501";

/// Rest.li protocol version required by the versioned endpoints.
pub const RESTLI_PROTOCOL_VERSION: &str = "2.0.0";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error type for upstream calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// LinkedIn answered with a non-success status.
    #[error("LinkedIn API error {status}: {body}")]
    Upstream { status: u16, body: String },

    /// No response was received (connect failure, timeout, bad URL).
    #[error("request failed: {message}")]
    Transport { message: String },
}

/// Connection settings for [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme + host the REST paths are appended to.
    pub base_url: String,

    /// Value of the `LinkedIn-Version` header.
    pub api_version: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl ApiConfig {
    /// Point the client at a different host (used by tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the `LinkedIn-Version` header.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// One logical upstream operation.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Path below the base URL, e.g. `/rest/posts`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query parameter. Values are form-encoded on send.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Decoded body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// The body was empty.
    Empty,
    /// The body parsed as JSON.
    Json(Value),
    /// The body was present but not JSON.
    Text(String),
}

/// A successful upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    /// Response headers, lower-cased names.
    pub headers: BTreeMap<String, String>,
    pub body: UpstreamBody,
}

impl UpstreamResponse {
    /// Look up a response header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The body as text: JSON re-serialized, text verbatim, empty as `""`.
    pub fn body_text(&self) -> String {
        match &self.body {
            UpstreamBody::Json(value) => value.to_string(),
            UpstreamBody::Text(raw) => raw.clone(),
            UpstreamBody::Empty => String::new(),
        }
    }

    /// Collapse the response into a single JSON value.
    ///
    /// Empty bodies become `{"status": .., "headers": {..}}` and non-JSON
    /// bodies become `{"raw": ".."}`.
    pub fn into_value(self) -> Value {
        match self.body {
            UpstreamBody::Json(value) => value,
            UpstreamBody::Text(raw) => json!({ "raw": raw }),
            UpstreamBody::Empty => json!({
                "status": self.status,
                "headers": self.headers,
            }),
        }
    }
}

/// Authenticated client for the LinkedIn REST API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a client with the given settings.
    pub fn new(config: ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("postforge/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Issue one authenticated request and normalize the response.
    pub async fn call(
        &self,
        request: UpstreamRequest,
        credential: &Credential,
    ) -> Result<UpstreamResponse, ApiError> {
        let url = self.url(&request.path);
        debug!(
            "{} {} as {} (LinkedIn-Version {})",
            request.method, url, credential.account, self.config.api_version
        );

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .bearer_auth(credential.access_token.expose())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header("X-Restli-Protocol-Version", RESTLI_PROTOCOL_VERSION)
            .header("LinkedIn-Version", &self.config.api_version);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = builder.send().await.map_err(|e| ApiError::Transport {
            message: e.to_string(),
        })?;

        let status = response.status();
        let headers: BTreeMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        let text = response.text().await.map_err(|e| ApiError::Transport {
            message: format!("failed to read response body: {}", e),
        })?;

        debug!("{} {} -> {} ({} bytes)", request.method, url, status, text.len());

        if !status.is_success() {
            return Err(ApiError::Upstream {
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(UpstreamResponse {
            status: status.as_u16(),
            headers,
            body: decode_body(text),
        })
    }
}

fn decode_body(text: String) -> UpstreamBody {
    if text.trim().is_empty() {
        return UpstreamBody::Empty;
    }
    match serde_json::from_str(&text) {
        Ok(value) => UpstreamBody::Json(value),
        Err(_) => UpstreamBody::Text(text),
    }
}

/// Everything but RFC 3986 unreserved characters is escaped, so `:` and `/`
/// inside a URN stay within one segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a URN (or any string) for use as a single path segment.
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, PATH_SEGMENT).to_string()
}
