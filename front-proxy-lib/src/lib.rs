#![forbid(unsafe_code)]

pub mod auth;
pub mod config;
pub mod error;
pub mod load_balancing;
pub mod proxy;
pub mod security;
pub mod telemetry;

pub use auth::{AuthenticatedUser, HeaderAuthenticator, Identity};
pub use config::{load_from_path, Backend, Config, RateLimitConfig, Route};
pub use error::{ProxyError, Result};
pub use load_balancing::RoundRobin;
pub use proxy::handler::{Admission, AdmissionControl, AdmissionMiddleware};
pub use proxy::{build_pipeline, run, serve};
pub use security::{IdentityLimiterRegistry, TokenBucketLimiter};
