//! HTTP client seam.
//!
//! The transport only needs "POST this body with these headers", so the
//! network layer is a small trait. `ReqwestHttpClient` is the production
//! implementation; tests plug in an in-memory one.

use crate::error::{SdkError, SdkResult};
use crate::headers::HeaderBundle;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::trace;

/// A raw HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers. Repeated headers are joined with `", "`.
    pub headers: HeaderBundle,
    /// Response body text.
    pub body: String,
}

impl HttpResponse {
    /// Creates a 200 response with a body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            headers: HeaderBundle::new(),
            body: body.into(),
        }
    }

    /// Adds a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends POST requests.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POSTs `body` to `url` with exactly the given headers.
    async fn post(&self, url: &str, headers: &HeaderBundle, body: String)
        -> SdkResult<HttpResponse>;
}

/// `HttpClient` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Creates a client with reqwest defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing reqwest client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn post(
        &self,
        url: &str,
        headers: &HeaderBundle,
        body: String,
    ) -> SdkResult<HttpResponse> {
        let header_map = to_header_map(headers)?;

        let response = self
            .client
            .post(url)
            .headers(header_map)
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers = from_header_map(response.headers());
        let body = response.text().await.map_err(map_reqwest_error)?;

        trace!(status, bytes = body.len(), "Received HTTP response");
        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

/// Converts a bundle into reqwest headers, rejecting invalid names or values.
fn to_header_map(headers: &HeaderBundle) -> SdkResult<HeaderMap> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| SdkError::invalid_header(format!("{name:?}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| SdkError::invalid_header(format!("value of {name}: {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Collects response headers, skipping values that are not visible ASCII.
fn from_header_map(map: &HeaderMap) -> HeaderBundle {
    let mut bundle = HeaderBundle::new();
    for (name, value) in map {
        if let Ok(value) = value.to_str() {
            bundle.append(name.as_str(), value);
        }
    }
    bundle
}

fn map_reqwest_error(err: reqwest::Error) -> SdkError {
    if err.is_timeout() {
        SdkError::timeout()
    } else if err.is_decode() {
        SdkError::invalid_response(err.to_string())
    } else {
        SdkError::network(err.to_string())
    }
}
