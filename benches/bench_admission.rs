//! Admission-path microbenchmarks.
//!
//! Measures the per-request cost of the rate limiting decision without any
//! networking: limiter lookup, token acquisition and the full admission check
//! on a request carrying an authenticated user.
//!
//! ## Run
//! ```bash
//! cargo bench --bench bench_admission
//! ```

use std::sync::Arc;
use std::thread;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use front_proxy_lib::auth::{AuthenticatedUser, Identity};
use front_proxy_lib::config::RateLimitConfig;
use front_proxy_lib::security::{IdentityLimiterRegistry, TokenBucketLimiter};
use front_proxy_lib::AdmissionControl;
use http::Request;

fn identities(n: usize) -> Vec<Identity> {
    (0..n)
        .filter_map(|i| Identity::new(format!("user-{i}")))
        .collect()
}

fn bench_token_bucket(c: &mut Criterion) {
    // high rate so the bucket never runs dry during measurement
    let limiter = TokenBucketLimiter::new(1e12, 1_000_000);
    c.bench_function("token_bucket_try_acquire", |b| {
        b.iter(|| std::hint::black_box(limiter.try_acquire()));
    });
}

fn bench_registry_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_get_or_create");
    for &population in &[1usize, 1_000, 100_000] {
        let registry = IdentityLimiterRegistry::new(1.0, 3, population.max(1), 16);
        let ids = identities(population);
        for id in &ids {
            registry.get_or_create(id);
        }

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(population), &ids, |b, ids| {
            let mut i = 0usize;
            b.iter(|| {
                i = i.wrapping_add(1);
                let id = &ids[i % ids.len()];
                std::hint::black_box(registry.get_or_create(id))
            });
        });
    }
    group.finish();
}

fn bench_registry_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_contended");
    for &threads in &[1usize, 4, 8] {
        let registry = Arc::new(IdentityLimiterRegistry::new(1e12, 1_000_000, 10_000, 16));
        let ids = Arc::new(identities(1_000));

        group.throughput(Throughput::Elements((threads * 1_000) as u64));
        group.bench_function(BenchmarkId::from_parameter(threads), |b| {
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let registry = registry.clone();
                        let ids = ids.clone();
                        thread::spawn(move || {
                            ids.iter()
                                .skip(t)
                                .chain(ids.iter().take(t))
                                .filter(|id| registry.get_or_create(id).try_acquire())
                                .count()
                        })
                    })
                    .collect();
                for h in handles {
                    let _ = h.join();
                }
            });
        });
    }
    group.finish();
}

fn bench_admission_check(c: &mut Criterion) {
    let config = RateLimitConfig { rate: 1e12, burst: 1_000_000, ..RateLimitConfig::default() };
    let control = AdmissionControl::new(
        Arc::new(IdentityLimiterRegistry::from_config(&config)),
        &config,
        None,
    );

    let mut req = Request::new(());
    req.extensions_mut().insert(AuthenticatedUser::new("alice"));

    c.bench_function("admission_check_admitted", |b| {
        b.iter(|| std::hint::black_box(control.check(&req)));
    });
}

criterion_group!(
    admission_benches,
    bench_token_bucket,
    bench_registry_lookup,
    bench_registry_contention,
    bench_admission_check
);
criterion_main!(admission_benches);
