use ahash::{AHashMap, RandomState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::TokenBucketLimiter;
use crate::auth::Identity;
use crate::config::RateLimitConfig;

/// Share of `max_entries` freed by one LRU eviction pass
const EVICTION_BATCH_DIVISOR: usize = 64;

struct Entry {
    limiter: Arc<TokenBucketLimiter>,
    last_access: Instant,
}

type Shard = Mutex<AHashMap<Identity, Entry>>;

/// Registry owning one [`TokenBucketLimiter`] per identity.
///
/// The map is split into independently locked shards selected by hashing the
/// identity, so callers with different identities rarely contend. Lookup and
/// insertion happen under the same shard lock, which guarantees that at most
/// one limiter is ever created per identity.
///
/// Growth is bounded two ways:
/// - [`evict_stale`](Self::evict_stale) drops identities idle for longer than a TTL
/// - the registry as a whole never holds more than `max_entries` identities;
///   inserting into a full registry first evicts the least recently used
///   identities across all shards, a small batch at a time
///
/// Nothing is evicted by the cap while fewer than `max_entries` identities
/// are tracked, whatever shard they hash to.
///
/// Eviction only affects future lookups. A caller already holding the `Arc`
/// of an evicted limiter finishes its check against that instance.
pub struct IdentityLimiterRegistry {
    shards: Box<[Shard]>,
    hasher: RandomState,
    rate: f64,
    burst: u32,
    max_entries: usize,
    eviction_batch: usize,
    /// Tracked identities; a slot is reserved before every insert
    len: AtomicUsize,
    /// Serializes LRU passes; never taken while a shard lock is held
    trim: Mutex<()>,
}

impl IdentityLimiterRegistry {
    /// Create an empty registry.
    ///
    /// # Parameters
    /// - `rate`: refill rate (tokens per second) of every created limiter
    /// - `burst`: bucket size of every created limiter
    /// - `max_entries`: upper bound on tracked identities (values below 1 are treated as 1)
    /// - `shards`: number of lock shards, clamped to `1..=max_entries`
    pub fn new(rate: f64, burst: u32, max_entries: usize, shards: usize) -> Self {
        let max_entries = max_entries.max(1);
        let shard_count = shards.clamp(1, max_entries);

        Self {
            shards: (0..shard_count)
                .map(|_| Mutex::new(AHashMap::new()))
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            hasher: RandomState::new(),
            rate,
            burst,
            max_entries,
            eviction_batch: (max_entries / EVICTION_BATCH_DIVISOR).max(1),
            len: AtomicUsize::new(0),
            trim: Mutex::new(()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.rate, config.burst, config.max_entries, config.shards)
    }

    /// Return the limiter for `identity`, creating it on first use.
    pub fn get_or_create(&self, identity: &Identity) -> Arc<TokenBucketLimiter> {
        self.get_or_create_at(identity, Instant::now())
    }

    /// Same as [`get_or_create`](Self::get_or_create), with `now` as the access time.
    pub fn get_or_create_at(&self, identity: &Identity, now: Instant) -> Arc<TokenBucketLimiter> {
        loop {
            {
                let mut map = self.lock_shard(identity);

                if let Some(entry) = map.get_mut(identity) {
                    entry.last_access = entry.last_access.max(now);
                    return Arc::clone(&entry.limiter);
                }

                if self.reserve_slot() {
                    let limiter = Arc::new(TokenBucketLimiter::new_at(self.rate, self.burst, now));
                    map.insert(
                        identity.clone(),
                        Entry { limiter: Arc::clone(&limiter), last_access: now },
                    );
                    return limiter;
                }
            }

            // full: make room with no shard lock held, then look again since
            // another caller may have inserted this identity meanwhile
            self.evict_least_recently_used();
        }
    }

    /// Remove identities not seen for longer than `max_idle`.
    ///
    /// Returns the number of removed entries.
    pub fn evict_stale(&self, max_idle: Duration) -> usize {
        self.evict_stale_at(max_idle, Instant::now())
    }

    pub fn evict_stale_at(&self, max_idle: Duration, now: Instant) -> usize {
        self.shards.iter().fold(0usize, |removed, shard| {
            let mut map = lock(shard);
            let before = map.len();
            map.retain(|_, entry| now.saturating_duration_since(entry.last_access) <= max_idle);
            let dropped = before.saturating_sub(map.len());
            self.release_slots(dropped);
            removed.saturating_add(dropped)
        })
    }

    /// Number of tracked identities.
    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.lock_shard(identity).contains_key(identity)
    }

    /// Drop every tracked identity.
    pub fn clear(&self) {
        self.shards.iter().for_each(|shard| {
            let mut map = lock(shard);
            self.release_slots(map.len());
            map.clear();
        });
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn lock_shard(&self, identity: &Identity) -> MutexGuard<'_, AHashMap<Identity, Entry>> {
        let hash = self.hasher.hash_one(identity.as_str()) as usize;
        // shards is never empty, see `new`
        let index = hash.checked_rem(self.shards.len()).unwrap_or_default();
        lock(&self.shards[index])
    }

    /// Claim room for one more identity, failing when the registry is full.
    fn reserve_slot(&self) -> bool {
        self.len
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_entries).then_some(n.saturating_add(1))
            })
            .is_ok()
    }

    fn release_slots(&self, n: usize) {
        if n > 0 {
            self.len.fetch_sub(n, Ordering::AcqRel);
        }
    }

    /// Evict up to `eviction_batch` of the least recently used identities
    /// registry-wide.
    ///
    /// One pass reads every entry once, so the scan cost is spread over the
    /// batch of inserts it makes room for.
    fn evict_least_recently_used(&self) {
        let _trim = self.trim.lock().unwrap_or_else(PoisonError::into_inner);
        // a concurrent pass may already have made room
        if self.len() < self.max_entries {
            return;
        }

        let mut accesses: Vec<Instant> = self
            .shards
            .iter()
            .flat_map(|shard| lock(shard).values().map(|e| e.last_access).collect::<Vec<_>>())
            .collect();
        if accesses.is_empty() {
            return;
        }
        let nth = self.eviction_batch.min(accesses.len()).saturating_sub(1);
        let (_, cutoff, _) = accesses.select_nth_unstable(nth);
        let cutoff = *cutoff;

        let mut budget = self.eviction_batch;
        for shard in self.shards.iter() {
            if budget == 0 {
                break;
            }
            let mut map = lock(shard);
            let before = map.len();
            map.retain(|_, entry| {
                if budget > 0 && entry.last_access <= cutoff {
                    budget -= 1;
                    false
                } else {
                    true
                }
            });
            self.release_slots(before.saturating_sub(map.len()));
        }

        tracing::debug!(
            evicted = self.eviction_batch.saturating_sub(budget),
            max_entries = self.max_entries,
            "Evicted least recently used rate limiters"
        );
    }
}

// Critical sections never panic midway through a mutation, so a poisoned
// shard still holds a consistent map.
fn lock(shard: &Shard) -> MutexGuard<'_, AHashMap<Identity, Entry>> {
    shard.lock().unwrap_or_else(PoisonError::into_inner)
}
