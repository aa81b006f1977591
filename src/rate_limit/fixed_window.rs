//! Fixed-window limiter with lock-free atomics.
//!
//! Semantics:
//! - Up to `capacity` permits are handed out per window; a caller that finds none suspends
//!   until a release or a window reset wakes it.
//! - Releases return a permit immediately, so a freed unit can be reused within the same
//!   window.
//! - At each window boundary the count is refilled to `capacity` in one step, regardless of how
//!   many permits are still held. A burst at the end of one window followed by a burst at the
//!   start of the next may therefore admit up to `2 * capacity` calls in a short span.
//!
//! Invariants:
//! - `0 <= available_permits() <= capacity()`; a release that would exceed the cap is absorbed
//!   and reported as `false`.
//! - Only [`FixedWindowLimiter::tick`] moves `window_start_millis`.
//!
//! ```rust
//! use docgate::rate_limit::{FixedWindowLimiter, Permit, RateLimiter};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let limiter = Arc::new(FixedWindowLimiter::new(2, Duration::from_secs(1)).unwrap());
//! let first = Permit::acquire(limiter.clone()).await;
//! let _second = Permit::acquire(limiter.clone()).await;
//! assert!(Permit::try_acquire(limiter.clone()).is_none());
//! drop(first);
//! assert_eq!(limiter.available_permits(), 1);
//! # });
//! ```

use crate::clock::{Clock, MonotonicClock};
use crate::config::{ConfigError, GateConfig};
use crate::rate_limit::RateLimiter;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Fixed-window admission limiter.
///
/// Share it behind an `Arc`; every clone of the `Arc` sees the same window.
#[derive(Debug)]
pub struct FixedWindowLimiter {
    capacity: u32,
    window: Duration,
    available: AtomicU32,
    window_start_millis: AtomicU64,
    waiters: Notify,
    clock: Arc<dyn Clock>,
}

impl FixedWindowLimiter {
    /// Create a full limiter. Errors if `capacity` is zero or `window` is shorter than 1ms.
    pub fn new(capacity: u32, window: Duration) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroRequestLimit(capacity));
        }
        if window < Duration::from_millis(1) {
            return Err(ConfigError::ZeroWindow(window));
        }
        Ok(Self::full(capacity, window))
    }

    /// Build from a validated gate config.
    pub fn from_config(config: &GateConfig) -> Self {
        Self::full(config.request_limit(), config.window())
    }

    fn full(capacity: u32, window: Duration) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(MonotonicClock::default());
        Self {
            capacity,
            window,
            available: AtomicU32::new(capacity),
            window_start_millis: AtomicU64::new(clock.now_millis()),
            waiters: Notify::new(),
            clock,
        }
    }

    /// Override the clock (useful for deterministic tests). The current window restarts at the
    /// new clock's reading.
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.window_start_millis = AtomicU64::new(clock.now_millis());
        self.clock = Arc::new(clock);
        self
    }

    /// Length of one window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Clock reading at which the current window began.
    pub fn window_start_millis(&self) -> u64 {
        self.window_start_millis.load(Ordering::Acquire)
    }

    /// One step of the reset process.
    ///
    /// If at least one window has elapsed since `window_start_millis`, refills the count to
    /// `capacity`, moves the window start to the latest boundary not after now, and wakes every
    /// waiter. Returns whether a reset happened.
    pub fn tick(&self) -> bool {
        let now = self.clock.now_millis();
        let start = self.window_start_millis.load(Ordering::Acquire);
        let window_ms = self.window_millis();
        let elapsed = now.saturating_sub(start);
        if elapsed < window_ms {
            return false;
        }

        // Boundaries stay aligned to the first window so a late tick does not push every later
        // window back.
        let boundary = start + (elapsed / window_ms) * window_ms;
        if self
            .window_start_millis
            .compare_exchange(start, boundary, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            // A concurrent tick already opened this window.
            return false;
        }
        let previous = self.available.swap(self.capacity, Ordering::AcqRel);
        tracing::info!(
            capacity = self.capacity,
            reclaimed = self.capacity - previous,
            window_start_ms = boundary,
            "Fixed window → reset"
        );
        self.waiters.notify_waiters();
        true
    }

    fn window_millis(&self) -> u64 {
        u64::try_from(self.window.as_millis()).unwrap_or(u64::MAX).max(1)
    }

    fn take(&self) -> bool {
        self.available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl RateLimiter for FixedWindowLimiter {
    fn capacity(&self) -> u32 {
        self.capacity
    }

    fn available_permits(&self) -> u32 {
        self.available.load(Ordering::Acquire)
    }

    async fn acquire(&self) {
        loop {
            // Register interest before checking so a release between the check and the await
            // still wakes us.
            let notified = self.waiters.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.take() {
                tracing::debug!(available = self.available_permits(), "permit acquired");
                return;
            }
            notified.await;
        }
    }

    fn try_acquire(&self) -> bool {
        let taken = self.take();
        if taken {
            tracing::debug!(available = self.available_permits(), "permit acquired");
        }
        taken
    }

    fn release(&self) -> bool {
        let capacity = self.capacity;
        match self
            .available
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < capacity).then_some(n + 1))
        {
            Ok(previous) => {
                tracing::debug!(available = previous + 1, "permit released");
                self.waiters.notify_one();
                true
            }
            Err(_) => {
                tracing::warn!(capacity, "release absorbed: limiter already full");
                false
            }
        }
    }
}
