use front_proxy_lib::security::TokenBucketLimiter;
use std::time::{Duration, Instant};

#[test]
fn test_burst_then_sustained_rate() {
    let t0 = Instant::now();
    let limiter = TokenBucketLimiter::new_at(1.0, 3, t0);

    // burst of 3 admitted back-to-back
    for i in 0..3 {
        assert!(limiter.try_acquire_at(t0), "request {i} should be admitted");
    }
    assert!(!limiter.try_acquire_at(t0), "4th request should be rejected");

    // one token per second afterwards
    let t1 = t0 + Duration::from_secs(1);
    assert!(limiter.try_acquire_at(t1));
    assert!(!limiter.try_acquire_at(t1));
}

#[test]
fn test_partial_refill_is_not_enough() {
    let t0 = Instant::now();
    let limiter = TokenBucketLimiter::new_at(2.0, 1, t0);

    assert!(limiter.try_acquire_at(t0));
    assert!(!limiter.try_acquire_at(t0 + Duration::from_millis(250)));
    // 0.25s + 0.25s at 2 tokens/s = one full token
    assert!(limiter.try_acquire_at(t0 + Duration::from_millis(500)));
}

#[test]
fn test_long_idle_refills_only_to_burst() {
    let t0 = Instant::now();
    let limiter = TokenBucketLimiter::new_at(10.0, 5, t0);
    for _ in 0..5 {
        assert!(limiter.try_acquire_at(t0));
    }

    let later = t0 + Duration::from_secs(3600);
    assert!((limiter.tokens_at(later) - 5.0).abs() < f64::EPSILON);

    let admitted = (0..10).filter(|_| limiter.try_acquire_at(later)).count();
    assert_eq!(admitted, 5);
}

#[test]
fn test_fractional_rate() {
    let t0 = Instant::now();
    // one request every four seconds
    let limiter = TokenBucketLimiter::new_at(0.25, 1, t0);

    assert!(limiter.try_acquire_at(t0));
    assert!(!limiter.try_acquire_at(t0 + Duration::from_secs(3)));
    assert!(limiter.try_acquire_at(t0 + Duration::from_secs(4)));
}

#[test]
fn test_concurrent_acquire_never_exceeds_burst() {
    let limiter = std::sync::Arc::new(TokenBucketLimiter::new(0.001, 50));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limiter = limiter.clone();
            std::thread::spawn(move || (0..20).filter(|_| limiter.try_acquire()).count())
        })
        .collect();

    let admitted: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap_or_else(|_| panic!("worker panicked")))
        .sum();
    assert_eq!(admitted, 50);
}

#[test]
fn test_wall_clock_refill() {
    let limiter = TokenBucketLimiter::new(20.0, 1);
    assert!(limiter.try_acquire());
    assert!(!limiter.try_acquire());

    std::thread::sleep(Duration::from_millis(100));
    assert!(limiter.try_acquire(), "a token should have refilled after 100ms at 20/s");
}

#[test]
fn test_accessors() {
    let limiter = TokenBucketLimiter::new(2.5, 7);
    assert!((limiter.rate() - 2.5).abs() < f64::EPSILON);
    assert_eq!(limiter.burst(), 7);
    assert!(limiter.tokens() <= 7.0);
}
