//! Gated document client.
//!
//! Semantics:
//! - `submit` serializes first, so a document that cannot be encoded never takes a permit.
//! - Exactly one permit is acquired and exactly one HTTP call is made per `submit`; there is no
//!   retry. Retrying is left to the caller.
//! - The permit is released on every exit path, including when the `submit` future is dropped.
//! - Only statuses in [`ACCEPTED_STATUSES`] count as success.
//!
//! ```rust,no_run
//! use docgate::{DocumentClient, GateConfig, TimeUnit};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = DocumentClient::https(GateConfig::new(TimeUnit::Minutes, 10)?)?;
//! let receipt = client.submit(&json!({ "doc_id": "123", "doc_status": "NEW" })).await?;
//! println!("created: {}", receipt.status);
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

use crate::config::GateConfig;
use crate::error::{SubmitError, ACCEPTED_STATUSES};
use crate::rate_limit::{AcquireError, FixedWindowLimiter, Permit, RateLimiter, ResetTask};
use crate::transport::{DocumentRequest, ReqwestTransport, Transport, TransportError};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Request timeout used by [`DocumentClient::https`].
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Successful submission outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitReceipt {
    /// HTTP status, one of [`ACCEPTED_STATUSES`].
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// Client that admits at most `request_limit` submissions per window.
///
/// Owns its limiter and the reset task driving it; independent clients have independent
/// windows. Must be created inside a tokio runtime.
#[derive(Debug)]
pub struct DocumentClient<T> {
    config: GateConfig,
    limiter: Arc<FixedWindowLimiter>,
    transport: T,
    reset: ResetTask,
}

impl DocumentClient<ReqwestTransport> {
    /// Client talking HTTPS through `reqwest`.
    pub fn https(config: GateConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(DEFAULT_REQUEST_TIMEOUT)?;
        Ok(Self::new(config, transport))
    }
}

impl<T: Transport> DocumentClient<T> {
    /// Build a client with a fresh limiter and start its reset task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn new(config: GateConfig, transport: T) -> Self {
        let limiter = Arc::new(FixedWindowLimiter::from_config(&config));
        Self::with_limiter(config, limiter, transport)
    }

    /// Build a client around an existing limiter (e.g. one with a test clock) and start a reset
    /// task for it.
    ///
    /// The limiter's own capacity and window win over `config`'s, and [`DocumentClient::config`]
    /// reports the limiter's values.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn with_limiter(config: GateConfig, limiter: Arc<FixedWindowLimiter>, transport: T) -> Self {
        if config.request_limit() != limiter.capacity() || config.window() != limiter.window() {
            tracing::warn!(
                configured_limit = config.request_limit(),
                configured_window = ?config.window(),
                capacity = limiter.capacity(),
                window = ?limiter.window(),
                "config limits differ from injected limiter; using the limiter's"
            );
        }
        let config = config.with_limits(limiter.window(), limiter.capacity());
        let reset = ResetTask::spawn(&limiter);
        tracing::debug!(
            capacity = limiter.capacity(),
            window = ?limiter.window(),
            endpoint = config.endpoint(),
            "document client started"
        );
        Self { config, limiter, transport, reset }
    }

    /// Submit a document, waiting for a permit as long as it takes (or up to the configured
    /// `acquire_timeout`).
    pub async fn submit<D>(&self, document: &D) -> Result<SubmitReceipt, SubmitError>
    where
        D: Serialize + ?Sized,
    {
        let body = serde_json::to_string(document)?;
        let permit = match self.config.acquire_timeout() {
            Some(timeout) => self.acquire_within(timeout).await?,
            None => Permit::acquire(self.limiter.clone()).await,
        };
        self.send(body, permit).await
    }

    /// Submit a document, waiting at most `timeout` for a permit.
    ///
    /// The bound applies to admission only; the HTTP exchange is not cut short.
    pub async fn submit_with_timeout<D>(
        &self,
        document: &D,
        timeout: Duration,
    ) -> Result<SubmitReceipt, SubmitError>
    where
        D: Serialize + ?Sized,
    {
        let body = serde_json::to_string(document)?;
        let permit = self.acquire_within(timeout).await?;
        self.send(body, permit).await
    }

    /// The limiter gating this client.
    pub fn limiter(&self) -> &Arc<FixedWindowLimiter> {
        &self.limiter
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Stop the reset task. In-flight submissions keep their permits until they finish.
    pub async fn shutdown(self) {
        self.reset.shutdown().await;
    }

    async fn acquire_within(
        &self,
        timeout: Duration,
    ) -> Result<Permit<FixedWindowLimiter>, SubmitError> {
        Permit::acquire_timeout(self.limiter.clone(), timeout).await.map_err(|e| match e {
            AcquireError::TimedOut { waited } => {
                tracing::debug!(?waited, "gave up waiting for permit");
                SubmitError::Cancelled { waited }
            }
        })
    }

    async fn send(
        &self,
        body: String,
        permit: Permit<FixedWindowLimiter>,
    ) -> Result<SubmitReceipt, SubmitError> {
        let request = DocumentRequest::new(self.config.endpoint(), body);
        let response = self.transport.post_json(request).await;
        drop(permit);

        let response = response?;
        if !ACCEPTED_STATUSES.contains(&response.status) {
            tracing::warn!(status = response.status, "document rejected");
            return Err(SubmitError::Rejected { status: response.status, body: response.body });
        }
        Ok(SubmitReceipt { status: response.status, body: response.body })
    }
}
