use hyper::header::CONTENT_TYPE;
use hyper::{Response, StatusCode};
use serde_json::{json, Value};

use crate::config::Backend;
use crate::error::{ProxyError, Result};
use crate::proxy::synthetic_response::{full_body, RespBody};

/// Health check response - always returns 200 if process is running
pub fn health_check_response() -> Result<Response<RespBody>> {
    json_response(StatusCode::OK, json!({"status": "healthy"}))
}

/// Readiness check - 200 if at least one backend is configured, 503 otherwise
pub fn ready_check_response(backends: &[Backend]) -> Result<Response<RespBody>> {
    if backends.is_empty() {
        json_response(
            StatusCode::SERVICE_UNAVAILABLE,
            json!({"status": "not_ready", "reason": "no_backends_configured"}),
        )
    } else {
        json_response(StatusCode::OK, json!({"status": "ready"}))
    }
}

/// Liveness check - always returns 200 if process is running
pub fn live_check_response() -> Result<Response<RespBody>> {
    json_response(StatusCode::OK, json!({"status": "alive"}))
}

fn json_response(status: StatusCode, body: Value) -> Result<Response<RespBody>> {
    let body_bytes = serde_json::to_vec(&body)
        .map_err(|e| ProxyError::Http(format!("Failed to serialize health response: {e}")))?;

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(full_body(body_bytes))
        .map_err(|e| ProxyError::Http(format!("Failed to build health response: {e}")))
}
