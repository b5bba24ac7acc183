//! Per-identity rate limiting for the front proxy.
//!
//! # Architecture
//!
//! 1. **TokenBucketLimiter** (`limiter.rs`): continuous-refill token bucket.
//!    Admits short bursts up to `burst` while capping sustained throughput at
//!    `rate` requests per second.
//!
//! 2. **IdentityLimiterRegistry** (`registry.rs`): sharded map from identity to
//!    limiter. Creates limiters lazily and bounds its own size with an LRU cap
//!    and a TTL sweep.
//!
//! 3. **Sweeper** (`sweeper.rs`): background task running the TTL sweep.
//!
//! The HTTP side lives in [`crate::proxy::handler::admission`].
//!
//! # Example Usage
//!
//! ```
//! use front_proxy_lib::auth::Identity;
//! use front_proxy_lib::security::rate_limit::IdentityLimiterRegistry;
//!
//! let registry = IdentityLimiterRegistry::new(1.0, 3, 10_000, 16);
//! let Some(alice) = Identity::new("alice") else { return };
//!
//! let admitted: Vec<bool> = (0..4).map(|_| registry.get_or_create(&alice).try_acquire()).collect();
//! assert_eq!(admitted, [true, true, true, false]);
//! ```
//!
//! # Configuration
//!
//! ```toml
//! [security.rate_limit]
//! rate = 1.0
//! burst = 3
//! retry_after_secs = 1
//! max_idle_secs = 600
//! max_entries = 100000
//! ```

mod limiter;
mod registry;
mod sweeper;

pub use limiter::TokenBucketLimiter;
pub use registry::IdentityLimiterRegistry;
pub use sweeper::spawn_sweeper;
