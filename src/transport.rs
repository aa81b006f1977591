//! HTTP transport seam.
//!
//! The gate never talks to the network directly; it hands a [`DocumentRequest`] to a
//! [`Transport`] and inspects the [`HttpResponse`]. Production code uses [`ReqwestTransport`]
//! (HTTPS via rustls); tests plug in scripted transports.

use async_trait::async_trait;
use std::time::Duration;

/// A ready-to-send document submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRequest {
    /// Absolute endpoint URL.
    pub url: String,
    /// Serialized JSON body.
    pub body: String,
}

impl DocumentRequest {
    /// Content type sent with every submission.
    pub const CONTENT_TYPE: &'static str = "application/json";

    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self { url: url.into(), body: body.into() }
    }
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Failures that prevent a response from being obtained at all.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The endpoint URL could not be used.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Connecting or sending failed.
    #[error("request failed: {0}")]
    Request(String),
    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Sends a document submission and reports what the server answered.
///
/// Implementations must be safe to call from many tasks at once.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `POST` the request body with `Content-Type: application/json`.
    async fn post_json(&self, request: DocumentRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post_json(&self, request: DocumentRequest) -> Result<HttpResponse, TransportError> {
        (**self).post_json(request).await
    }
}

/// [`Transport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// HTTPS-only client with a request timeout.
    pub fn new(request_timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .https_only(true)
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post_json(&self, request: DocumentRequest) -> Result<HttpResponse, TransportError> {
        let url = reqwest::Url::parse(&request.url)
            .map_err(|e| TransportError::InvalidEndpoint(format!("{}: {}", request.url, e)))?;

        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, DocumentRequest::CONTENT_TYPE)
            .body(request.body)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| TransportError::Body(e.to_string()))?;
        Ok(HttpResponse { status, body })
    }
}
