//! HTTP transport seam between the fetchers and the network.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, IF_MODIFIED_SINCE, LAST_MODIFIED};
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// A single outbound GET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Target URL
    pub url: String,
    /// Conditional revalidation token sent as `If-Modified-Since`
    pub if_modified_since: Option<String>,
}

impl HttpRequest {
    /// Unconditional GET for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            if_modified_since: None,
        }
    }

    /// Attach a revalidation token. Empty tokens are ignored.
    pub fn with_if_modified_since(mut self, token: Option<&str>) -> Self {
        self.if_modified_since = token.filter(|t| !t.is_empty()).map(str::to_string);
        self
    }
}

/// What came back from the origin, before any status interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Decoded body text (empty on 304)
    pub body: String,
    /// `Last-Modified` header value
    pub last_modified: Option<String>,
    /// `Content-Type` header value
    pub content_type: Option<String>,
}

/// Network-level failure: the origin was never heard from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create a transport error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for TransportError {}

/// Sends requests to the network.
///
/// Implementations report every status the origin returns as `Ok`; only
/// failures to get a response at all are `Err`.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Execute one request.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Production transport backed by `reqwest`.
///
/// The client is built with gzip and deflate decoding, which also makes it
/// advertise `Accept-Encoding: gzip, deflate`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport that identifies itself with `user_agent`.
    pub fn new(user_agent: &str, timeout: Duration, proxy: Option<&str>) -> crate::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .deflate(true);

        if let Some(proxy) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Wrap an already configured client.
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn header_string(
    headers: &reqwest::header::HeaderMap,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.get(&request.url);
        if let Some(token) = &request.if_modified_since {
            builder = builder.header(IF_MODIFIED_SINCE, token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::new(format!("request timeout: {e}"))
            } else if e.is_connect() {
                TransportError::new(format!("connection failed: {e}"))
            } else {
                TransportError::new(format!("request failed: {e}"))
            }
        })?;

        let status = response.status().as_u16();
        let last_modified = header_string(response.headers(), LAST_MODIFIED);
        let content_type = header_string(response.headers(), CONTENT_TYPE);
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::new(format!("failed to read response body: {e}")))?;

        Ok(HttpResponse {
            status,
            body,
            last_modified,
            content_type,
        })
    }
}
