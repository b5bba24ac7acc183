use serde::Deserialize;

/// Security configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct SecurityConfig {
    /// Per-identity rate limiting configuration
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Per-identity rate limiting configuration
///
/// Every authenticated caller gets an independent token bucket that refills at
/// `rate` tokens per second and holds at most `burst` tokens.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Enable per-identity rate limiting
    /// Default: true
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Sustained rate in tokens (requests) per second
    /// Default: 1.0
    #[serde(default = "default_rate")]
    pub rate: f64,
    /// Maximum number of tokens a bucket can hold (burst size)
    /// Default: 3
    #[serde(default = "default_burst")]
    pub burst: u32,
    /// Value sent in the `Retry-After` header of 429 responses, in seconds
    /// Default: 1
    #[serde(default = "default_retry_after_secs")]
    pub retry_after_secs: u64,
    /// Identities idle for longer than this are evicted by the sweeper
    /// Default: 600 (10 minutes)
    #[serde(default = "default_max_idle_secs")]
    pub max_idle_secs: u64,
    /// Hard cap on tracked identities; least recently used entries are evicted first
    /// Default: 100000
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// How often the sweeper looks for idle identities, in seconds
    /// Default: 60
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Number of independently locked registry shards
    /// Default: 16
    #[serde(default = "default_shards")]
    pub shards: usize,
    /// Which attribute of the authenticated user partitions rate-limit state
    /// Default: "name"
    #[serde(default)]
    pub identity_key: IdentityKey,
    /// What to do with requests that carry no resolvable identity
    /// Default: "reject"
    #[serde(default)]
    pub unresolved_policy: UnresolvedPolicy,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate: default_rate(),
            burst: default_burst(),
            retry_after_secs: default_retry_after_secs(),
            max_idle_secs: default_max_idle_secs(),
            max_entries: default_max_entries(),
            sweep_interval_secs: default_sweep_interval_secs(),
            shards: default_shards(),
            identity_key: IdentityKey::default(),
            unresolved_policy: UnresolvedPolicy::default(),
        }
    }
}

/// Attribute of the authenticated user used as the rate-limit key
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKey {
    /// User name as reported by the authenticator.
    /// Stable for humans and service accounts, but two principals sharing a
    /// display name share a bucket.
    #[default]
    Name,
    /// Unique user ID. Requests from users without a UID are treated as unresolved.
    Uid,
}

/// Policy for requests without a resolvable identity
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Fail closed: answer 401 Unauthorized and stop the chain
    #[default]
    Reject,
    /// Fail open: forward the request without rate limiting it
    Allow,
}

fn default_true() -> bool {
    true
}

fn default_rate() -> f64 {
    1.0
}

fn default_burst() -> u32 {
    3
}

fn default_retry_after_secs() -> u64 {
    1
}

fn default_max_idle_secs() -> u64 {
    600
}

fn default_max_entries() -> usize {
    100_000
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_shards() -> usize {
    16
}
