use thiserror::Error;

/// Errors that can occur in the front proxy
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Telemetry error: {0}")]
    Telemetry(String),

    #[error("No backends configured")]
    NoBackends,
}

pub type Result<T> = std::result::Result<T, ProxyError>;
