use std::fs;
use std::path::Path;

use crate::config::{validate, Config};
use crate::error::{ProxyError, Result};

/// Read, parse and validate a TOML configuration file
pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let txt = fs::read_to_string(p)
        .map_err(|e| ProxyError::Config(format!("Failed to read config file: {e}")))?;
    load_from_str(&txt)
}

/// Parse and validate configuration from a TOML string
pub fn load_from_str(txt: &str) -> Result<Config> {
    let cfg: Config = toml::from_str(txt)
        .map_err(|e| ProxyError::Config(format!("Failed to parse config: {e}")))?;

    validate(&cfg)?;

    Ok(cfg)
}
