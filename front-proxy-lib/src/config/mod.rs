mod auth;
mod backend;
mod loader;
mod root;
mod security;
mod telemetry;
mod timeout;
mod validator;

pub use auth::AuthConfig;
pub use backend::{Backend, BackendPoolConfig, Route};
pub use loader::{load_from_path, load_from_str};
pub use root::Config;
pub use security::{IdentityKey, RateLimitConfig, SecurityConfig, UnresolvedPolicy};
pub use telemetry::{LoggingConfig, TelemetryConfig};
pub use timeout::{KeepAliveConfig, TimeoutConfig};
pub use validator::validate;
