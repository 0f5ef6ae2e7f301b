use contact_intake_lib::security::rate_limit::{ManualClock, Quota, RateLimiter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const HOUR: Duration = Duration::from_secs(60 * 60);

#[test]
fn test_sweep_removes_only_expired_entries() {
    let clock = ManualClock::default();
    let limiter = RateLimiter::with_clock(Arc::new(clock.clone()));
    let quota = Quota::new(3, HOUR);

    limiter.check("old", quota);
    clock.advance(Duration::from_secs(40 * 60));
    limiter.check("new", quota);
    assert_eq!(limiter.tracked_keys(), 2);

    clock.advance(Duration::from_secs(21 * 60));
    assert_eq!(limiter.sweep(), 1);
    assert_eq!(limiter.tracked_keys(), 1);
    assert!(limiter.peek("old").is_none());
    assert!(limiter.peek("new").is_some());
}

#[test]
fn test_recreated_after_sweep_has_full_quota() {
    let clock = ManualClock::default();
    let limiter = RateLimiter::with_clock(Arc::new(clock.clone()));
    let quota = Quota::new(3, HOUR);

    for _ in 0..3 {
        limiter.check("k", quota);
    }
    clock.advance(HOUR + Duration::from_secs(1));
    limiter.sweep();

    assert_eq!(limiter.check("k", quota).remaining(), 2);
}

#[test]
fn test_concurrent_checks_never_exceed_quota() {
    let limiter = Arc::new(RateLimiter::new());
    let quota = Quota::new(3, HOUR);

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            std::thread::spawn(move || limiter.check("shared", quota).is_allowed())
        })
        .collect();

    let allowed = handles
        .into_iter()
        .filter_map(|h| h.join().ok())
        .filter(|allowed| *allowed)
        .count();

    assert_eq!(allowed, 3, "exactly the quota should be admitted");
    assert_eq!(limiter.peek("shared").map(|e| e.count), Some(3));
}

#[tokio::test(start_paused = true)]
async fn test_sweeper_runs_on_interval_and_stops() {
    let clock = ManualClock::default();
    let limiter = Arc::new(RateLimiter::with_clock(Arc::new(clock.clone())));
    limiter.check("k", Quota::new(3, Duration::from_secs(60)));
    clock.advance(Duration::from_secs(61));

    let shutdown = CancellationToken::new();
    let handle = limiter.spawn_sweeper(Duration::from_secs(600), shutdown.clone());

    tokio::time::sleep(Duration::from_secs(599)).await;
    assert_eq!(limiter.tracked_keys(), 1, "no sweep before the first interval");

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(limiter.tracked_keys(), 0);

    shutdown.cancel();
    assert!(handle.await.is_ok());
}
