use std::sync::Arc;
use std::time::Duration;

use hyper::body::Incoming;
use hyper::service::Service;
use hyper::Request;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::auth::HeaderAuthenticator;
use crate::config::{Config, TimeoutConfig};
use crate::error::{ProxyError, Result};
use crate::proxy::client_pool::ClientPool;
use crate::proxy::connection::ConnectionTracker;
use crate::proxy::handler::{
    AdmissionControl, AdmissionMiddleware, Authenticated, ClientAddr, ForwardHandler,
};
use crate::security::rate_limit::spawn_sweeper;
use crate::security::IdentityLimiterRegistry;
use crate::telemetry::metrics_handler::ScrapeState;
use crate::telemetry::{init_metrics, start_observability_server, Metrics};

/// Request chain served on every connection: authentication, admission, forwarding
pub type Pipeline = Authenticated<AdmissionMiddleware<ForwardHandler>>;

/// Assemble the request chain for `config` around a shared limiter registry.
pub fn build_pipeline(
    config: &Config,
    registry: Arc<IdentityLimiterRegistry>,
    metrics: Option<Arc<Metrics>>,
) -> Result<Pipeline> {
    let client_pool = ClientPool::new(
        &config.timeout.keep_alive,
        &config.backend_pool,
        config.timeout.connect_ms,
    );
    let forward = ForwardHandler::new(
        config.routes.clone(),
        Arc::new(config.backends.clone()),
        client_pool,
        metrics.clone(),
    );
    let admission = Arc::new(AdmissionControl::new(
        registry,
        &config.security.rate_limit,
        metrics,
    ));
    let authenticator = Arc::new(HeaderAuthenticator::new(&config.auth)?);

    Ok(Authenticated::new(
        authenticator,
        AdmissionMiddleware::new(admission, forward),
    ))
}

/// Accept connections on `listener` until `shutdown` fires, then drain.
///
/// In-flight connections are asked to finish gracefully and are given
/// `timeout.shutdown_secs` to close.
pub async fn serve(
    listener: TcpListener,
    pipeline: Pipeline,
    timeout: &TimeoutConfig,
    metrics: Option<Arc<Metrics>>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut builder = ConnBuilder::new(TokioExecutor::new());
    builder.http1().keep_alive(timeout.keep_alive.enabled);

    let tracker = ConnectionTracker::new();

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            result = listener.accept() => {
                let (stream, peer) = match result {
                    Ok((stream, peer)) => (stream, peer),
                    Err(e) => {
                        warn!(error = %e, "accept error");
                        continue;
                    }
                };

                let guard = tracker.track(metrics.clone());
                let builder = builder.clone();
                let pipeline = pipeline.clone();
                let shutdown = shutdown.clone();

                tokio::spawn(async move {
                    let _guard = guard;
                    let svc = hyper::service::service_fn(move |mut req: Request<Incoming>| {
                        req.extensions_mut().insert(ClientAddr(peer));
                        pipeline.call(req)
                    });

                    let conn = builder.serve_connection(TokioIo::new(stream), svc);
                    tokio::pin!(conn);

                    let result = tokio::select! {
                        res = conn.as_mut() => res,
                        _ = shutdown.cancelled() => {
                            debug!(?peer, "Closing connection for shutdown");
                            conn.as_mut().graceful_shutdown();
                            conn.as_mut().await
                        }
                    };
                    if let Err(e) = result {
                        warn!(?peer, error = %e, "serve_connection error");
                    }
                });
            }
        }
    }

    drain(&tracker, Duration::from_secs(timeout.shutdown_secs)).await;
    Ok(())
}

async fn drain(tracker: &ConnectionTracker, shutdown_timeout: Duration) {
    let active = tracker.active();
    if active == 0 {
        info!("No active connections, shutdown complete");
        return;
    }

    info!(
        active_connections = active,
        "Waiting for active connections to finish (timeout: {}s)",
        shutdown_timeout.as_secs()
    );
    match tokio::time::timeout(shutdown_timeout, tracker.wait_idle()).await {
        Ok(()) => info!("All connections closed, shutdown complete"),
        Err(_) => {
            let active = tracker.active();
            warn!(
                active_connections = active,
                "Shutdown timeout reached, {} connections still active", active
            );
        }
    }
}

/// Run the proxy described by `config` until SIGTERM or SIGINT.
pub async fn run(config: Arc<Config>) -> Result<()> {
    let shutdown = CancellationToken::new();

    let rate_limit = &config.security.rate_limit;
    let registry = Arc::new(IdentityLimiterRegistry::from_config(rate_limit));

    let metrics = match config.telemetry.metrics_port {
        Some(port) => {
            let (metrics, prom_registry) = init_metrics()?;
            let backends = Arc::new(config.backends.clone());
            let scrape = ScrapeState { metrics: Arc::clone(&metrics), limiters: Arc::clone(&registry) };
            let token = shutdown.clone();
            tokio::spawn(async move {
                if let Err(e) =
                    start_observability_server(port, prom_registry, backends, Some(scrape), token).await
                {
                    error!(error = %e, "Observability server failed");
                }
            });
            Some(metrics)
        }
        None => None,
    };
    let sweeper = rate_limit.enabled.then(|| {
        spawn_sweeper(
            Arc::clone(&registry),
            Duration::from_secs(rate_limit.sweep_interval_secs),
            Duration::from_secs(rate_limit.max_idle_secs),
            metrics.clone(),
            shutdown.clone(),
        )
    });

    let pipeline = build_pipeline(&config, registry, metrics.clone())?;

    let listener = TcpListener::bind(config.listen).await?;
    info!(
        addr = ?config.listen,
        rate = rate_limit.rate,
        burst = rate_limit.burst,
        enabled = rate_limit.enabled,
        "Starting front proxy (h1/h2)"
    );

    spawn_signal_handler(shutdown.clone())?;

    let result = serve(listener, pipeline, &config.timeout, metrics, shutdown.clone()).await;

    shutdown.cancel();
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            warn!(error = %e, "Rate limit sweeper task failed");
        }
    }

    info!("Proxy server stopped");
    result
}

fn spawn_signal_handler(shutdown: CancellationToken) -> Result<()> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(|e| {
        ProxyError::Io(std::io::Error::other(format!("Failed to setup SIGTERM handler: {e}")))
    })?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt()).map_err(|e| {
        ProxyError::Io(std::io::Error::other(format!("Failed to setup SIGINT handler: {e}")))
    })?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, initiating graceful shutdown"),
            _ = sigint.recv() => info!("Received SIGINT, initiating graceful shutdown"),
            _ = shutdown.cancelled() => return,
        }
        shutdown.cancel();
    });
    Ok(())
}
