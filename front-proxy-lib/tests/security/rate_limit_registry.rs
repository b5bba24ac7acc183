use front_proxy_lib::auth::Identity;
use front_proxy_lib::config::RateLimitConfig;
use front_proxy_lib::security::IdentityLimiterRegistry;
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::time::{Duration, Instant};

fn id(name: &str) -> Identity {
    Identity::new(name).unwrap_or_else(|| panic!("invalid identity {name:?}"))
}

#[test]
fn test_same_identity_same_limiter() {
    let registry = IdentityLimiterRegistry::new(1.0, 3, 1000, 4);

    let a1 = registry.get_or_create(&id("alice"));
    let a2 = registry.get_or_create(&id("alice"));
    let b = registry.get_or_create(&id("bob"));

    assert!(Arc::ptr_eq(&a1, &a2));
    assert!(!Arc::ptr_eq(&a1, &b));
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_limiters_use_registry_parameters() {
    let registry = IdentityLimiterRegistry::new(4.0, 9, 1000, 4);
    let limiter = registry.get_or_create(&id("alice"));

    assert!((limiter.rate() - 4.0).abs() < f64::EPSILON);
    assert_eq!(limiter.burst(), 9);
}

#[test]
fn test_concurrent_first_access_creates_one_limiter() {
    let registry = Arc::new(IdentityLimiterRegistry::new(1.0, 3, 1000, 16));
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let registry = registry.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                Arc::as_ptr(&registry.get_or_create(&id("carol"))) as usize
            })
        })
        .collect();

    let ptrs: HashSet<usize> = handles
        .into_iter()
        .map(|h| h.join().unwrap_or_else(|_| panic!("worker panicked")))
        .collect();

    assert_eq!(ptrs.len(), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_concurrent_burst_shared_across_threads() {
    let registry = Arc::new(IdentityLimiterRegistry::new(0.001, 10, 1000, 16));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            std::thread::spawn(move || {
                (0..10)
                    .filter(|_| registry.get_or_create(&id("dave")).try_acquire())
                    .count()
            })
        })
        .collect();

    let admitted: usize = handles
        .into_iter()
        .map(|h| h.join().unwrap_or_else(|_| panic!("worker panicked")))
        .sum();
    assert_eq!(admitted, 10);
}

#[test]
fn test_evict_stale_removes_only_idle_entries() {
    let registry = IdentityLimiterRegistry::new(1.0, 3, 1000, 4);
    let t0 = Instant::now();

    registry.get_or_create_at(&id("idle"), t0);
    registry.get_or_create_at(&id("active"), t0);
    registry.get_or_create_at(&id("active"), t0 + Duration::from_secs(50));

    let removed = registry.evict_stale_at(Duration::from_secs(30), t0 + Duration::from_secs(60));

    assert_eq!(removed, 1);
    assert!(!registry.contains(&id("idle")));
    assert!(registry.contains(&id("active")));
}

#[test]
fn test_evict_stale_keeps_entries_exactly_at_max_idle() {
    let registry = IdentityLimiterRegistry::new(1.0, 3, 1000, 4);
    let t0 = Instant::now();
    registry.get_or_create_at(&id("edge"), t0);

    assert_eq!(registry.evict_stale_at(Duration::from_secs(10), t0 + Duration::from_secs(10)), 0);
    assert!(registry.contains(&id("edge")));
}

#[test]
fn test_evict_stale_is_idempotent() {
    let registry = IdentityLimiterRegistry::new(1.0, 3, 1000, 4);
    let t0 = Instant::now();
    for name in ["a", "b", "c"] {
        registry.get_or_create_at(&id(name), t0);
    }

    let later = t0 + Duration::from_secs(120);
    assert_eq!(registry.evict_stale_at(Duration::from_secs(60), later), 3);
    assert_eq!(registry.evict_stale_at(Duration::from_secs(60), later), 0);
    assert!(registry.is_empty());
}

#[test]
fn test_evicted_identity_starts_with_full_burst() {
    let registry = IdentityLimiterRegistry::new(1.0, 2, 1000, 4);
    let t0 = Instant::now();

    let limiter = registry.get_or_create_at(&id("erin"), t0);
    assert!(limiter.try_acquire_at(t0));
    assert!(limiter.try_acquire_at(t0));
    assert!(!limiter.try_acquire_at(t0));

    let later = t0 + Duration::from_secs(1000);
    registry.evict_stale_at(Duration::from_secs(600), later);

    let fresh = registry.get_or_create_at(&id("erin"), later);
    assert!(!Arc::ptr_eq(&limiter, &fresh));
    assert!(fresh.try_acquire_at(later));
    assert!(fresh.try_acquire_at(later));
}

#[test]
fn test_held_limiter_survives_eviction() {
    let registry = IdentityLimiterRegistry::new(1.0, 1, 1000, 4);
    let t0 = Instant::now();
    let held = registry.get_or_create_at(&id("frank"), t0);

    registry.evict_stale_at(Duration::from_secs(1), t0 + Duration::from_secs(5));

    assert!(!registry.contains(&id("frank")));
    assert!(held.try_acquire_at(t0 + Duration::from_secs(5)));
}

#[test]
fn test_max_entries_bounds_registry_size() {
    let registry = IdentityLimiterRegistry::new(1.0, 3, 64, 8);

    for i in 0..1000 {
        registry.get_or_create(&id(&format!("user-{i}")));
    }

    assert!(registry.len() <= 64, "registry grew to {}", registry.len());
    assert!(registry.contains(&id("user-999")));
}

#[test]
fn test_below_max_entries_nothing_is_evicted() {
    // one slot per shard, so any two identities sharing a shard would collide
    let registry = IdentityLimiterRegistry::new(1.0, 3, 64, 64);
    let t0 = Instant::now();

    let limiters: Vec<_> = (0..64)
        .map(|i| registry.get_or_create_at(&id(&format!("user-{i}")), t0))
        .collect();

    assert_eq!(registry.len(), 64);
    for (i, limiter) in limiters.iter().enumerate() {
        let again = registry.get_or_create_at(&id(&format!("user-{i}")), t0);
        assert!(Arc::ptr_eq(limiter, &again), "user-{i} was evicted below max_entries");
    }
}

#[test]
fn test_active_identity_stays_limited_when_others_churn() {
    let registry = IdentityLimiterRegistry::new(1.0, 1, 2, 2);
    let t0 = Instant::now();
    let alice = registry.get_or_create_at(&id("alice"), t0);

    let mut admitted = 0;
    for i in 0..10u64 {
        let now = t0 + Duration::from_millis(i);
        let limiter = registry.get_or_create_at(&id("alice"), now);
        assert!(Arc::ptr_eq(&alice, &limiter), "alice got a fresh bucket in round {i}");
        if limiter.try_acquire_at(now) {
            admitted += 1;
        }
        registry.get_or_create_at(&id(&format!("user-{i}")), now);
        assert!(registry.len() <= 2);
    }

    assert_eq!(admitted, 1);
}

#[test]
fn test_from_config() {
    let config = RateLimitConfig { rate: 5.0, burst: 10, max_entries: 100, shards: 4, ..Default::default() };
    let registry = IdentityLimiterRegistry::from_config(&config);

    assert!((registry.rate() - 5.0).abs() < f64::EPSILON);
    assert_eq!(registry.burst(), 10);
    assert_eq!(registry.max_entries(), 100);
    assert_eq!(registry.shard_count(), 4);
}

#[test]
fn test_clear() {
    let registry = IdentityLimiterRegistry::new(1.0, 3, 1000, 4);
    registry.get_or_create(&id("a"));
    registry.get_or_create(&id("b"));
    registry.clear();
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_sweeper_evicts_in_background() {
    use front_proxy_lib::security::rate_limit::spawn_sweeper;
    use tokio_util::sync::CancellationToken;

    let registry = Arc::new(IdentityLimiterRegistry::new(1.0, 3, 1000, 4));
    registry.get_or_create(&id("ghost"));

    let shutdown = CancellationToken::new();
    let handle = spawn_sweeper(
        registry.clone(),
        Duration::from_millis(20),
        Duration::from_millis(10),
        None,
        shutdown.clone(),
    );

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(registry.is_empty());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap_or_else(|_| panic!("sweeper did not stop"))
        .unwrap_or_else(|e| panic!("sweeper panicked: {e}"));
}
