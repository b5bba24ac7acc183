//! Continuous-refill token bucket.
//!
//! The bucket holds at most `burst` tokens and regains `rate` tokens per
//! second of monotonic time. Each admitted request consumes one token, so a
//! caller can burst up to `burst` requests while the sustained throughput is
//! capped at `rate` requests per second.

use std::sync::{Mutex, PoisonError};
use std::time::Instant;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    fn refill(&mut self, now: Instant, rate: f64, burst: f64) {
        // saturating: an `Instant` older than `last_refill` counts as no time passed
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * rate).min(burst);
            self.last_refill = now;
        }
    }
}

/// A per-identity token bucket.
///
/// The read-refill-decrement sequence runs under an internal mutex, so
/// concurrent calls on the same instance are linearizable.
///
/// # Example
/// ```
/// use front_proxy_lib::security::rate_limit::TokenBucketLimiter;
///
/// let limiter = TokenBucketLimiter::new(1.0, 3);
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// assert!(limiter.try_acquire());
/// assert!(!limiter.try_acquire());
/// ```
#[derive(Debug)]
pub struct TokenBucketLimiter {
    rate: f64,
    burst: u32,
    state: Mutex<BucketState>,
}

impl TokenBucketLimiter {
    /// Create a full bucket refilling at `rate` tokens per second.
    ///
    /// # Parameters
    /// - `rate`: tokens added per second, expected to be positive and finite
    /// - `burst`: maximum number of stored tokens
    pub fn new(rate: f64, burst: u32) -> Self {
        Self::new_at(rate, burst, Instant::now())
    }

    /// Create a full bucket whose refill clock starts at `now`.
    pub fn new_at(rate: f64, burst: u32, now: Instant) -> Self {
        Self {
            rate,
            burst,
            state: Mutex::new(BucketState { tokens: f64::from(burst), last_refill: now }),
        }
    }

    /// Try to take one token. Returns `true` when the request is admitted.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    /// Same as [`try_acquire`](Self::try_acquire), evaluated at `now`.
    pub fn try_acquire_at(&self, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.refill(now, self.rate, f64::from(self.burst));
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Tokens currently available, after refilling up to now.
    pub fn tokens(&self) -> f64 {
        self.tokens_at(Instant::now())
    }

    pub fn tokens_at(&self, now: Instant) -> f64 {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.refill(now, self.rate, f64::from(self.burst));
        state.tokens
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn burst_then_reject() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(1.0, 3, start);

        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start));
        assert!(!limiter.try_acquire_at(start));
        assert_eq!(limiter.tokens_at(start), 0.0);
    }

    #[test]
    fn rejection_leaves_tokens_untouched() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(1.0, 1, start);
        assert!(limiter.try_acquire_at(start));

        let half = start + Duration::from_millis(500);
        assert!(!limiter.try_acquire_at(half));
        assert!((limiter.tokens_at(half) - 0.5).abs() < 1e-9);

        assert!(limiter.try_acquire_at(start + Duration::from_secs(1)));
    }

    #[test]
    fn refill_is_capped_at_burst() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(1.0, 3, start);
        assert!(limiter.try_acquire_at(start));

        let later = start + Duration::from_secs(3600);
        assert_eq!(limiter.tokens_at(later), 3.0);
        for _ in 0..3 {
            assert!(limiter.try_acquire_at(later));
        }
        assert!(!limiter.try_acquire_at(later));
    }

    #[test]
    fn spaced_requests_always_admitted() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(2.0, 1, start);
        for i in 0..20u64 {
            let at = start + Duration::from_millis(500 * i);
            assert!(limiter.try_acquire_at(at), "request {i} should be admitted");
        }
    }

    #[test]
    fn clock_going_backwards_adds_nothing() {
        let start = Instant::now() + Duration::from_secs(10);
        let limiter = TokenBucketLimiter::new_at(1.0, 2, start);
        assert!(limiter.try_acquire_at(start));
        assert!(limiter.try_acquire_at(start));

        let earlier = start - Duration::from_secs(5);
        assert!(!limiter.try_acquire_at(earlier));
        assert_eq!(limiter.tokens_at(earlier), 0.0);
    }

    #[test]
    fn tokens_stay_within_bounds() {
        let start = Instant::now();
        let limiter = TokenBucketLimiter::new_at(3.0, 4, start);
        for step in 0..200u64 {
            let at = start + Duration::from_millis(step * 37);
            limiter.try_acquire_at(at);
            let tokens = limiter.tokens_at(at);
            assert!((0.0..=4.0).contains(&tokens), "tokens out of range: {tokens}");
        }
    }
}
