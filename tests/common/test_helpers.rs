use async_trait::async_trait;
use docgate::{DocumentRequest, HttpResponse, Transport, TransportError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Scripted transport. Clones share call counters, so a test can keep one handle while the
/// client owns another.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    default_status: u16,
    scripted: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    // When set, every call waits for one permit before answering.
    gate: Option<Semaphore>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    bodies: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    /// Answers every call immediately with `status`.
    pub fn always(status: u16) -> Self {
        Self::build(status, None)
    }

    /// Answers with `status`, but only once [`ScriptedTransport::open`] lets a call through.
    pub fn gated(status: u16) -> Self {
        Self::build(status, Some(Semaphore::new(0)))
    }

    fn build(status: u16, gate: Option<Semaphore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                default_status: status,
                scripted: Mutex::new(VecDeque::new()),
                gate,
                calls: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                bodies: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Queue a one-off outcome; consumed before falling back to the default status.
    pub fn push(&self, outcome: Result<HttpResponse, TransportError>) -> &Self {
        self.inner.scripted.lock().unwrap().push_back(outcome);
        self
    }

    /// Let `n` gated calls complete.
    pub fn open(&self, n: usize) {
        if let Some(gate) = &self.inner.gate {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.inner.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn bodies(&self) -> Vec<String> {
        self.inner.bodies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, request: DocumentRequest) -> Result<HttpResponse, TransportError> {
        let inner = &self.inner;
        inner.calls.fetch_add(1, Ordering::SeqCst);
        let current = inner.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        inner.max_in_flight.fetch_max(current, Ordering::SeqCst);
        inner.bodies.lock().unwrap().push(request.body);

        if let Some(gate) = &inner.gate {
            gate.acquire().await.expect("gate never closes").forget();
        }

        inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        let scripted = inner.scripted.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(HttpResponse::new(inner.default_status, "{}")))
    }
}

/// Yield to the scheduler until `cond` holds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if cond() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition never became true");
}
