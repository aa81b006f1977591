use docgate::rate_limit::{FixedWindowLimiter, Permit, RateLimitLayer, RateLimiter, ResetTask};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::{service_fn, Layer, Service, ServiceBuilder, ServiceExt};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn permits_stay_within_bounds_under_contention() {
    let limiter = Arc::new(FixedWindowLimiter::new(4, Duration::from_millis(5)).unwrap());
    let reset = ResetTask::spawn(&limiter);
    let done = Arc::new(AtomicBool::new(false));

    let observer = tokio::spawn({
        let limiter = limiter.clone();
        let done = done.clone();
        async move {
            while !done.load(Ordering::SeqCst) {
                assert!(limiter.available_permits() <= limiter.capacity());
                tokio::task::yield_now().await;
            }
        }
    });

    let workers: Vec<_> = (0..16)
        .map(|_| {
            let limiter = limiter.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    let permit = Permit::acquire(limiter.clone()).await;
                    tokio::task::yield_now().await;
                    drop(permit);
                    // Stray releases may hand a unit back early but never push past capacity.
                    limiter.release();
                }
            })
        })
        .collect();

    for worker in futures::future::join_all(workers).await {
        worker.expect("worker completes");
    }
    done.store(true, Ordering::SeqCst);
    observer.await.expect("invariant held throughout");
    reset.shutdown().await;

    assert_eq!(limiter.available_permits(), 4);
}

#[tokio::test(start_paused = true)]
async fn reset_refills_regardless_of_consumption() {
    let limiter = Arc::new(FixedWindowLimiter::new(3, Duration::from_secs(1)).unwrap());
    let _reset = ResetTask::spawn(&limiter);

    for consumed in 0..=3u32 {
        for _ in 0..consumed {
            assert!(limiter.try_acquire());
        }
        tokio::time::sleep(Duration::from_millis(1_010)).await;
        assert_eq!(limiter.available_permits(), 3, "refill after consuming {consumed}");
    }
}

#[tokio::test]
async fn tower_stack_gates_concurrency() {
    let limiter = Arc::new(FixedWindowLimiter::new(2, Duration::from_secs(3600)).unwrap());
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let svc = ServiceBuilder::new().layer(RateLimitLayer::new(limiter.clone())).service(
        service_fn({
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            move |req: usize| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, std::io::Error>(req)
                }
            }
        }),
    );

    let calls = (0..8).map(|i| {
        let mut svc = svc.clone();
        async move { svc.ready().await?.call(i).await }
    });
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    assert!(peak.load(Ordering::SeqCst) <= 2);
    assert_eq!(limiter.available_permits(), 2);
}

#[tokio::test]
async fn limiter_usable_as_trait_object() {
    let limiter: Arc<dyn RateLimiter> =
        Arc::new(FixedWindowLimiter::new(1, Duration::from_secs(60)).unwrap());
    let svc = RateLimitLayer::new(limiter.clone())
        .layer(service_fn(|_: ()| async { Ok::<_, std::io::Error>(()) }));

    svc.oneshot(()).await.unwrap();
    assert_eq!(limiter.available_permits(), 1);
}
