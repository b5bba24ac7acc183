use serde::Deserialize;

/// Connection timing
///
/// Every field is optional; missing ones take the values from `Default`.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connect timeout, milliseconds
    pub connect_ms: u64,
    /// How long in-flight connections may take to finish after SIGTERM/SIGINT, seconds
    pub shutdown_secs: u64,
    pub keep_alive: KeepAliveConfig,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { connect_ms: 5_000, shutdown_secs: 30, keep_alive: KeepAliveConfig::default() }
    }
}

/// Keep-alive on both legs of the proxy
///
/// `enabled` toggles HTTP/1.1 keep-alive towards clients and TCP keep-alive
/// towards backends; `timeout_secs` is the TCP keep-alive interval.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct KeepAliveConfig {
    pub enabled: bool,
    pub timeout_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self { enabled: true, timeout_secs: 60 }
    }
}
