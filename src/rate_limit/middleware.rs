use crate::rate_limit::{Permit, RateLimiter};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower_layer::Layer;
use tower_service::Service;

/// A layer that gates every call of the wrapped service behind a [`RateLimiter`] permit.
///
/// Unlike a deny-style limiter, callers without a permit wait; the permit is released when the
/// inner future completes or is dropped.
#[derive(Debug)]
pub struct RateLimitLayer<L: ?Sized> {
    limiter: Arc<L>,
}

impl<L: ?Sized> Clone for RateLimitLayer<L> {
    fn clone(&self) -> Self {
        Self { limiter: self.limiter.clone() }
    }
}

impl<L: ?Sized> RateLimitLayer<L> {
    /// Create a new rate limit layer sharing `limiter`.
    pub fn new(limiter: Arc<L>) -> Self {
        Self { limiter }
    }
}

impl<S, L> Layer<S> for RateLimitLayer<L>
where
    L: RateLimiter + ?Sized + 'static,
{
    type Service = RateLimitService<S, L>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService { inner: service, limiter: self.limiter.clone() }
    }
}

/// Middleware service that holds a permit for the duration of each inner call.
#[derive(Debug)]
pub struct RateLimitService<S, L: ?Sized> {
    inner: S,
    limiter: Arc<L>,
}

impl<S: Clone, L: ?Sized> Clone for RateLimitService<S, L> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone(), limiter: self.limiter.clone() }
    }
}

impl<S, L, Req> Service<Req> for RateLimitService<S, L>
where
    S: Service<Req> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
    S::Response: Send + 'static,
    L: RateLimiter + ?Sized + 'static,
    Req: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let limiter = self.limiter.clone();
        // Take the service that was driven to readiness; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let _permit = Permit::acquire(limiter).await;
            inner.call(req).await
        })
    }
}
