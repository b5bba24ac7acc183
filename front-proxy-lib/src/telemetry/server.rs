use crate::config::Backend;
use crate::error::Result;
use crate::proxy::synthetic_response::{synthetic_error_response, RespBody};
use crate::telemetry::metrics_handler::ScrapeState;
use crate::telemetry::{
    handle_metrics, health_check_response, live_check_response, ready_check_response,
};
use hyper::body::Incoming;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use prometheus::Registry;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Serve `/metrics`, `/health`, `/ready` and `/live` on `port` until `shutdown` fires.
///
/// When `scrape` is set, the tracked-identities gauge is refreshed on every
/// `/metrics` request.
pub async fn start_observability_server(
    port: u16,
    registry: Registry,
    backends: Arc<Vec<Backend>>,
    scrape: Option<ScrapeState>,
    shutdown: CancellationToken,
) -> Result<()> {
    let registry = Arc::new(registry);
    let scrape = Arc::new(scrape);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;

    info!(?addr, "Observability endpoints listening");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Observability server: shutting down");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "Observability server: accept error");
                        continue;
                    }
                };

                let registry = registry.clone();
                let backends = backends.clone();
                let scrape = scrape.clone();
                tokio::spawn(async move {
                    let svc = hyper::service::service_fn(move |req: Request<Incoming>| {
                        let resp = route(req.uri().path(), &registry, &backends, (*scrape).as_ref());
                        async move { Ok::<_, Infallible>(resp) }
                    });

                    let builder = ConnBuilder::new(TokioExecutor::new());
                    if let Err(e) = builder.serve_connection(TokioIo::new(stream), svc).await {
                        warn!(?peer, error = %e, "Observability server: serve_connection error");
                    }
                });
            }
        }
    }

    info!("Observability server stopped");
    Ok(())
}

fn route(
    path: &str,
    registry: &Registry,
    backends: &[Backend],
    scrape: Option<&ScrapeState>,
) -> Response<RespBody> {
    let result = match path {
        "/health" => health_check_response(),
        "/ready" => ready_check_response(backends),
        "/live" => live_check_response(),
        "/metrics" => handle_metrics(registry, scrape),
        _ => return synthetic_error_response(StatusCode::NOT_FOUND, "Not Found"),
    };

    result.unwrap_or_else(|e| {
        warn!(error = %e, path, "Observability server: handler failed");
        synthetic_error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    })
}
