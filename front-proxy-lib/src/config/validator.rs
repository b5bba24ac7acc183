use std::collections::HashSet;

use http::HeaderName;

use crate::config::Config;
use crate::error::{ProxyError, Result};

pub fn validate(config: &Config) -> Result<()> {
    if config.backends.is_empty() {
        return Err(ProxyError::NoBackends);
    }
    if config.backends.iter().any(|b| b.address.trim().is_empty()) {
        return Err(ProxyError::Config("backend address cannot be empty".into()));
    }

    let backend_addresses: HashSet<_> = config.backends.iter().map(|b| b.address.as_str()).collect();
    for route in &config.routes {
        if !backend_addresses.contains(route.backend.as_str()) {
            return Err(ProxyError::Config(format!(
                "Route references unknown backend: {}",
                route.backend
            )));
        }
    }

    for header in [&config.auth.user_header, &config.auth.uid_header, &config.auth.group_header] {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            return Err(ProxyError::Config(format!("Invalid auth header name: {header}")));
        }
    }

    let rl = &config.security.rate_limit;
    if !(rl.rate.is_finite() && rl.rate > 0.0) {
        return Err(ProxyError::Config("rate_limit.rate must be a positive number".into()));
    }
    if rl.burst == 0 {
        return Err(ProxyError::Config("rate_limit.burst must be >= 1".into()));
    }
    if rl.retry_after_secs == 0 {
        return Err(ProxyError::Config("rate_limit.retry_after_secs must be >= 1".into()));
    }
    if rl.max_idle_secs == 0 {
        return Err(ProxyError::Config("rate_limit.max_idle_secs must be >= 1".into()));
    }
    if rl.max_entries == 0 {
        return Err(ProxyError::Config("rate_limit.max_entries must be >= 1".into()));
    }
    if rl.sweep_interval_secs == 0 {
        return Err(ProxyError::Config("rate_limit.sweep_interval_secs must be >= 1".into()));
    }
    if rl.shards == 0 {
        return Err(ProxyError::Config("rate_limit.shards must be >= 1".into()));
    }

    if config.timeout.connect_ms == 0 {
        return Err(ProxyError::Config("timeout.connect_ms must be > 0".into()));
    }

    Ok(())
}
