use serde::Deserialize;

/// Backend API server
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Backend {
    /// Backend server address (host:port format)
    /// Example: "shard-1:6443" or "192.168.1.10:8080"
    pub address: String,
}

/// Route configuration for path-based routing
#[derive(Debug, Deserialize, Clone)]
pub struct Route {
    /// URL path prefix to match (e.g., "/clusters/root", "/services")
    /// Routes are matched in order, first match wins
    pub prefix: String,
    /// Backend address to route matching requests to
    /// Must match one of the backend addresses defined in `backends`
    pub backend: String,
}

/// Backend connection pool configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BackendPoolConfig {
    /// Idle timeout in seconds for pooled connections
    /// Default: 90 seconds
    #[serde(default = "default_backend_pool_idle_timeout")]
    pub idle_timeout: u64,

    /// Maximum number of idle connections to maintain per host
    /// 0 = unlimited (hyper default)
    #[serde(default)]
    pub pool_max_idle_per_host: usize,
}

impl Default for BackendPoolConfig {
    fn default() -> Self {
        Self { idle_timeout: default_backend_pool_idle_timeout(), pool_max_idle_per_host: 0 }
    }
}

fn default_backend_pool_idle_timeout() -> u64 {
    90
}
