//! Rate limiting primitives.
//!
//! This module provides the building blocks for admission control:
//! - [`RateLimiter`]: the core trait (blocking acquire, release, observation).
//! - [`Permit`]: RAII guard that hands its unit back exactly once when dropped.
//! - [`FixedWindowLimiter`]: the fixed-window policy with full refills at window boundaries.
//! - [`ResetTask`]: the background process that drives window resets.
//! - [`RateLimitLayer`]: Tower middleware that gates any service with a limiter.
//!
//! # Architecture
//!
//! - **Logic**: a `RateLimiter` owns the permit count. It never hands out more than
//!   `capacity` units and never lets a release push the count past `capacity`.
//! - **Time**: window resets are driven from outside by a [`ResetTask`], so the limiter itself
//!   stays synchronous and can be ticked by hand in tests.
//! - **Callers**: hold a [`Permit`] for the duration of the gated call. Dropping the permit on
//!   any exit path (return, `?`, panic, or cancellation of the owning future) releases it.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub mod fixed_window;
pub mod middleware;
pub mod reset;

pub use fixed_window::FixedWindowLimiter;
pub use middleware::{RateLimitLayer, RateLimitService};
pub use reset::ResetTask;

/// Why a bounded acquire gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AcquireError {
    /// No permit became available before the deadline. Nothing was reserved.
    #[error("no permit available after waiting {waited:?}")]
    TimedOut {
        /// How long the caller was suspended.
        waited: Duration,
    },
}

/// Core interface for admission limiting.
///
/// Implementations must keep `0 <= available_permits() <= capacity()` under any interleaving
/// of `acquire`, `try_acquire`, `release` and window resets.
#[async_trait::async_trait]
pub trait RateLimiter: Send + Sync {
    /// Maximum permits per window.
    fn capacity(&self) -> u32;

    /// Permits that can be taken right now.
    fn available_permits(&self) -> u32;

    /// Suspend until one permit is reserved.
    ///
    /// Cancel-safe: if the returned future is dropped before completing, no permit was taken.
    async fn acquire(&self);

    /// Reserve one permit without waiting.
    fn try_acquire(&self) -> bool;

    /// Hand one permit back.
    ///
    /// Returns `false` when the limiter was already full and the release was absorbed by the
    /// cap (double release, or a permit reclaimed by a window reset).
    fn release(&self) -> bool;
}

/// A reserved unit of admission capacity.
///
/// Dropping the permit releases it. There is no way to release twice through a permit.
#[must_use = "dropping a permit releases it immediately"]
pub struct Permit<L: RateLimiter + ?Sized> {
    limiter: Arc<L>,
    acquired_at: Instant,
}

impl<L: RateLimiter + ?Sized> Permit<L> {
    /// Wait for a permit.
    pub async fn acquire(limiter: Arc<L>) -> Self {
        limiter.acquire().await;
        Self { limiter, acquired_at: Instant::now() }
    }

    /// Take a permit if one is available right now.
    pub fn try_acquire(limiter: Arc<L>) -> Option<Self> {
        if limiter.try_acquire() {
            Some(Self { limiter, acquired_at: Instant::now() })
        } else {
            None
        }
    }

    /// Wait for a permit for at most `timeout`.
    pub async fn acquire_timeout(limiter: Arc<L>, timeout: Duration) -> Result<Self, AcquireError> {
        let start = Instant::now();
        match tokio::time::timeout(timeout, limiter.acquire()).await {
            Ok(()) => Ok(Self { limiter, acquired_at: Instant::now() }),
            Err(_) => Err(AcquireError::TimedOut { waited: start.elapsed() }),
        }
    }

    /// How long this permit has been held.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// The limiter this permit belongs to.
    pub fn limiter(&self) -> &Arc<L> {
        &self.limiter
    }
}

impl<L: RateLimiter + ?Sized> Drop for Permit<L> {
    fn drop(&mut self) {
        self.limiter.release();
    }
}

impl<L: RateLimiter + ?Sized> std::fmt::Debug for Permit<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Permit").field("held_for", &self.held_for()).finish()
    }
}
