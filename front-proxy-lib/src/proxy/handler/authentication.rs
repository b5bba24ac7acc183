use std::sync::Arc;

use http::Request;
use hyper::service::Service;

use crate::auth::HeaderAuthenticator;

/// Service wrapper that attaches the authenticated user before calling `inner`
///
/// Never rejects: callers without an identity continue with no
/// [`AuthenticatedUser`](crate::auth::AuthenticatedUser) extension and are
/// handled by admission control.
pub struct Authenticated<S> {
    authenticator: Arc<HeaderAuthenticator>,
    inner: S,
}

impl<S> Authenticated<S> {
    pub fn new(authenticator: Arc<HeaderAuthenticator>, inner: S) -> Self {
        Self { authenticator, inner }
    }
}

impl<S: Clone> Clone for Authenticated<S> {
    fn clone(&self) -> Self {
        Self { authenticator: Arc::clone(&self.authenticator), inner: self.inner.clone() }
    }
}

impl<S, B> Service<Request<B>> for Authenticated<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn call(&self, mut req: Request<B>) -> Self::Future {
        self.authenticator.authenticate(&mut req);
        self.inner.call(req)
    }
}
