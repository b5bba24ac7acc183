use serde::Deserialize;
use std::net::SocketAddr;

use super::auth::AuthConfig;
use super::backend::{Backend, BackendPoolConfig, Route};
use super::security::SecurityConfig;
use super::telemetry::{LoggingConfig, TelemetryConfig};
use super::timeout::TimeoutConfig;

/// Front proxy configuration, deserialized from TOML
///
/// Only `listen` and `backends` are required:
///
/// ```toml
/// listen = "0.0.0.0:7000"
/// backends = [ { address = "10.0.0.5:8080" } ]
/// ```
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Client-facing listen address
    pub listen: SocketAddr,
    /// Upstream servers; requests matching no route are spread round-robin across them
    pub backends: Vec<Backend>,
    /// Prefix routes, first match wins
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub backend_pool: BackendPoolConfig,
    /// Where the caller identity is read from
    #[serde(default)]
    pub auth: AuthConfig,
    /// Per-identity admission control
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub timeout: TimeoutConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
