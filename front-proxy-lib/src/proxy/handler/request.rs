use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::{Request, Response, StatusCode};
use hyper::body::Incoming;
use hyper::service::Service;
use tokio::time::Instant;
use tracing::{debug, error};

use crate::config::{Backend, Route};
use crate::load_balancing::RoundRobin;
use crate::proxy::client_pool::ClientPool;
use crate::proxy::forwarding::{forward, select_backend};
use crate::proxy::handler::headers::{add_forwarded_headers, ClientAddr};
use crate::proxy::http_result::{HttpError, HttpResult};
use crate::proxy::synthetic_response::{synthetic_error_response, RespBody};
use crate::telemetry::Metrics;

struct ForwardState {
    routes: Vec<Route>,
    backends: Arc<Vec<Backend>>,
    round_robin: RoundRobin,
    client_pool: ClientPool,
    metrics: Option<Arc<Metrics>>,
}

/// Innermost service: routes the request and relays the backend response
#[derive(Clone)]
pub struct ForwardHandler {
    state: Arc<ForwardState>,
}

impl ForwardHandler {
    pub fn new(
        routes: Vec<Route>,
        backends: Arc<Vec<Backend>>,
        client_pool: ClientPool,
        metrics: Option<Arc<Metrics>>,
    ) -> Self {
        Self {
            state: Arc::new(ForwardState {
                routes,
                backends,
                round_robin: RoundRobin::new(),
                client_pool,
                metrics,
            }),
        }
    }
}

impl Service<Request<Incoming>> for ForwardHandler {
    type Response = Response<RespBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let state = Arc::clone(&self.state);
        Box::pin(async move { Ok(handle_proxy_request(req, &state).await) })
    }
}

async fn handle_proxy_request(mut req: Request<Incoming>, state: &ForwardState) -> Response<RespBody> {
    let start = Instant::now();
    let method = req.method().to_string();
    let protocol = format!("{:?}", req.version());

    if let Some(ClientAddr(peer)) = req.extensions().get::<ClientAddr>().copied() {
        add_forwarded_headers(&mut req, peer);
    }

    let result = route_and_forward(req, state).await;

    let response = match result {
        Ok(resp) => resp,
        Err((backend, e)) => {
            error!(backend = backend.as_deref().unwrap_or("-"), error = %e, "Request failed");
            if let (Some(m), Some(b)) = (&state.metrics, backend.as_deref()) {
                m.record_backend_error(b, e.error_type());
            }
            synthetic_error_response(StatusCode::from(&e), e.message())
        }
    };

    if let Some(ref m) = state.metrics {
        m.record_request(
            &method,
            response.status().as_u16(),
            &protocol,
            start.elapsed().as_secs_f64(),
        );
    }

    response
}

type RouteResult = std::result::Result<Response<RespBody>, (Option<String>, HttpError)>;

async fn route_and_forward(req: Request<Incoming>, state: &ForwardState) -> RouteResult {
    let backend = select_backend(
        req.uri().path(),
        &state.routes,
        &state.backends,
        &state.round_robin,
    )
    .map_err(|e| (None, e))?
    .to_string();

    debug!(backend = %backend, path = req.uri().path(), "Forwarding request");

    let result: HttpResult<_> = forward(req, &backend, &state.client_pool).await;
    result.map_err(|e| (Some(backend), e))
}
