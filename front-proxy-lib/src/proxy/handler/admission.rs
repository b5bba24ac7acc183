//! Per-identity admission control.
//!
//! [`AdmissionControl`] decides whether a request may proceed;
//! [`AdmissionMiddleware`] wraps a downstream service and either forwards the
//! request untouched or answers it directly.
//!
//! Per request:
//! - identity resolved and a token available: forwarded
//! - identity resolved, bucket empty: `429 Too Many Requests` with `Retry-After`
//! - no identity, policy `reject`: `401 Unauthorized`
//! - no identity, policy `allow`: forwarded without rate limiting

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::header::{HeaderValue, RETRY_AFTER};
use http::{Request, Response, StatusCode};
use hyper::service::Service;
use tracing::{debug, info, warn};

use crate::auth::{AuthenticatedUser, Identity};
use crate::config::{IdentityKey, RateLimitConfig, UnresolvedPolicy};
use crate::proxy::synthetic_response::{synthetic_error_response, RespBody};
use crate::security::IdentityLimiterRegistry;
use crate::telemetry::metrics::values;
use crate::telemetry::Metrics;

pub const RATE_LIMITED_BODY: &str = "Too many requests, please try again later.";
pub const UNAUTHORIZED_BODY: &str = "Unauthorized";

/// Outcome of an admission check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Identity resolved and a token was consumed
    Admitted(Identity),
    /// Identity resolved but its bucket is empty
    RateLimited(Identity),
    /// No identity; forwarded without rate limiting
    UnresolvedAllowed,
    /// No identity; answered with 401
    UnresolvedRejected,
    /// Rate limiting is switched off
    Disabled,
}

impl Admission {
    /// Whether the request continues down the chain
    pub fn is_forwarded(&self) -> bool {
        matches!(
            self,
            Admission::Admitted(_) | Admission::UnresolvedAllowed | Admission::Disabled
        )
    }
}

/// Admission decision shared by all connections
pub struct AdmissionControl {
    registry: Arc<IdentityLimiterRegistry>,
    enabled: bool,
    identity_key: IdentityKey,
    unresolved_policy: UnresolvedPolicy,
    retry_after: HeaderValue,
    metrics: Option<Arc<Metrics>>,
}

impl AdmissionControl {
    pub fn new(
        registry: Arc<IdentityLimiterRegistry>,
        config: &RateLimitConfig,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            registry,
            enabled: config.enabled,
            identity_key: config.identity_key,
            unresolved_policy: config.unresolved_policy,
            retry_after: HeaderValue::from(config.retry_after_secs),
            metrics,
        }
    }

    pub fn registry(&self) -> &Arc<IdentityLimiterRegistry> {
        &self.registry
    }

    /// Decide the fate of `req`, consuming a token when it is admitted.
    pub fn check<B>(&self, req: &Request<B>) -> Admission {
        let admission = self.decide(req);
        self.record(&admission);
        admission
    }

    fn decide<B>(&self, req: &Request<B>) -> Admission {
        if !self.enabled {
            return Admission::Disabled;
        }

        let user = req.extensions().get::<AuthenticatedUser>();
        let Some(identity) = user.and_then(|u| u.identity(self.identity_key)) else {
            warn!(
                method = %req.method(),
                path = req.uri().path(),
                key = ?self.identity_key,
                authenticated = user.is_some(),
                "Cannot resolve caller identity for rate limiting"
            );
            return match self.unresolved_policy {
                UnresolvedPolicy::Reject => Admission::UnresolvedRejected,
                UnresolvedPolicy::Allow => Admission::UnresolvedAllowed,
            };
        };

        // the Arc is dropped at the end of this check; eviction can't invalidate it
        let limiter = self.registry.get_or_create(&identity);
        if limiter.try_acquire() {
            debug!(identity = %identity, "Rate limit check passed");
            Admission::Admitted(identity)
        } else {
            info!(
                identity = %identity,
                groups = ?user.map(|u| u.groups.as_slice()).unwrap_or_default(),
                path = req.uri().path(),
                "Rate limiting request"
            );
            Admission::RateLimited(identity)
        }
    }

    fn record(&self, admission: &Admission) {
        let Some(ref m) = self.metrics else { return };
        let outcome = match admission {
            Admission::Admitted(_) => values::OUTCOME_ADMITTED,
            Admission::RateLimited(_) => values::OUTCOME_RATE_LIMITED,
            Admission::UnresolvedAllowed => values::OUTCOME_UNRESOLVED_ALLOWED,
            Admission::UnresolvedRejected => values::OUTCOME_UNRESOLVED_REJECTED,
            Admission::Disabled => values::OUTCOME_BYPASSED,
        };
        m.record_admission(outcome);
    }

    /// Terminal response for a request that is not forwarded
    pub fn rejection_response(&self, admission: &Admission) -> Option<Response<RespBody>> {
        match admission {
            Admission::RateLimited(_) => Some(self.too_many_requests()),
            Admission::UnresolvedRejected => {
                Some(synthetic_error_response(StatusCode::UNAUTHORIZED, UNAUTHORIZED_BODY))
            }
            Admission::Admitted(_) | Admission::UnresolvedAllowed | Admission::Disabled => None,
        }
    }

    pub fn too_many_requests(&self) -> Response<RespBody> {
        let mut resp = synthetic_error_response(StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED_BODY);
        resp.headers_mut().insert(RETRY_AFTER, self.retry_after.clone());
        resp
    }
}

/// Service wrapper applying [`AdmissionControl`] before the inner service
pub struct AdmissionMiddleware<S> {
    control: Arc<AdmissionControl>,
    inner: S,
}

impl<S> AdmissionMiddleware<S> {
    pub fn new(control: Arc<AdmissionControl>, inner: S) -> Self {
        Self { control, inner }
    }

    pub fn control(&self) -> &Arc<AdmissionControl> {
        &self.control
    }
}

impl<S: Clone> Clone for AdmissionMiddleware<S> {
    fn clone(&self) -> Self {
        Self { control: Arc::clone(&self.control), inner: self.inner.clone() }
    }
}

impl<S, B> Service<Request<B>> for AdmissionMiddleware<S>
where
    S: Service<Request<B>, Response = Response<RespBody>>,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response<RespBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<B>) -> Self::Future {
        let admission = self.control.check(&req);
        match self.control.rejection_response(&admission) {
            Some(resp) => Box::pin(async move { Ok(resp) }),
            None => Box::pin(self.inner.call(req)),
        }
    }
}
