#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # docgate
//!
//! Client-side admission control for a document submission API: at most `request_limit`
//! submissions are admitted per fixed time window, excess callers wait, and each admitted
//! caller performs exactly one HTTP `POST`.
//!
//! ## Features
//!
//! - **Fixed-window limiter** with lock-free permit accounting and full refills at window
//!   boundaries
//! - **Background reset task** that is stoppable and never outlives its limiter
//! - **RAII permits** released on every exit path, including cancellation
//! - **Tower middleware** to gate any `Service` with the same limiter
//! - **Pluggable transport** with a `reqwest`/rustls implementation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docgate::{DocumentClient, GateConfig, TimeUnit};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DocumentClient::https(GateConfig::new(TimeUnit::Minutes, 10)?)?;
//!
//!     let document = serde_json::json!({ "doc_id": "123", "doc_status": "NEW" });
//!     match client.submit(&document).await {
//!         Ok(receipt) => println!("created ({})", receipt.status),
//!         Err(e) if e.is_rejected() => eprintln!("rejected: {}", e),
//!         Err(e) => return Err(e.into()),
//!     }
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod transport;

// Re-exports
pub use client::{DocumentClient, SubmitReceipt};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{ConfigError, GateConfig, GateConfigBuilder, TimeUnit};
pub use error::{SubmitError, ACCEPTED_STATUSES};
pub use rate_limit::{AcquireError, FixedWindowLimiter, Permit, RateLimiter, ResetTask};
pub use transport::{DocumentRequest, HttpResponse, ReqwestTransport, Transport, TransportError};
