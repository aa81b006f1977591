//! Background reset process for [`FixedWindowLimiter`].

use crate::rate_limit::FixedWindowLimiter;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Handle to the task that ticks a limiter once per window.
///
/// The first tick fires immediately, later ticks every `window`. The task only holds a weak
/// reference to the limiter and ends on its own once the limiter is gone. Dropping the handle
/// aborts the task; [`ResetTask::shutdown`] stops it gracefully.
#[derive(Debug)]
pub struct ResetTask {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ResetTask {
    /// Spawn the reset loop on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn spawn(limiter: &Arc<FixedWindowLimiter>) -> Self {
        let weak = Arc::downgrade(limiter);
        let period = limiter.window();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = interval.tick() => {
                        let Some(limiter) = weak.upgrade() else { break };
                        limiter.tick();
                    }
                }
            }
            tracing::debug!(?period, "reset task stopped");
        });

        Self { stop: Some(stop_tx), handle: Some(handle) }
    }

    /// Stop the loop and wait for it to exit.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                if err.is_panic() {
                    tracing::warn!(error = %err, "reset task panicked");
                }
            }
        }
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        match &self.handle {
            Some(handle) => handle.is_finished(),
            None => true,
        }
    }
}

impl Drop for ResetTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
