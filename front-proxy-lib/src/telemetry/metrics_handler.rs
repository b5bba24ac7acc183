use std::sync::Arc;

use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use prometheus::{Encoder, TextEncoder};

use crate::error::{ProxyError, Result};
use crate::proxy::synthetic_response::{full_body, RespBody};
use crate::security::IdentityLimiterRegistry;
use crate::telemetry::Metrics;

/// Source for gauges sampled at scrape time rather than on every request
pub struct ScrapeState {
    pub metrics: Arc<Metrics>,
    pub limiters: Arc<IdentityLimiterRegistry>,
}

/// Render the Prometheus text exposition of `registry`.
pub fn handle_metrics(
    registry: &prometheus::Registry,
    scrape: Option<&ScrapeState>,
) -> Result<Response<RespBody>> {
    if let Some(s) = scrape {
        s.metrics.record_tracked_identities(s.limiters.len() as u64);
    }

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&registry.gather(), &mut buffer)
        .map_err(|e| ProxyError::Http(format!("Failed to encode metrics: {e}")))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, encoder.format_type())
        .body(full_body(buffer))
        .map_err(|e| ProxyError::Http(format!("Failed to build metrics response: {e}")))
}
