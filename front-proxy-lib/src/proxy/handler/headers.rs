use http::header::{HeaderName, HeaderValue, HOST};
use http::Request;
use std::net::SocketAddr;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Client socket address, stored in request extensions by the connection task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientAddr(pub SocketAddr);

/// Add X-Forwarded-* headers to the request
///
/// 1. Appends the client IP to X-Forwarded-For (or creates it if missing)
/// 2. Sets X-Forwarded-Host from the request's Host header
/// 3. Sets X-Forwarded-Proto to "http"
pub fn add_forwarded_headers<B>(req: &mut Request<B>, peer: SocketAddr) {
    let client_ip = peer.ip().to_string();
    let forwarded_for = match req.headers().get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(existing) => format!("{existing}, {client_ip}"),
        None => client_ip,
    };
    if let Ok(header_value) = HeaderValue::from_str(&forwarded_for) {
        req.headers_mut().insert(X_FORWARDED_FOR, header_value);
    }

    if let Some(host) = req.headers().get(HOST).cloned() {
        req.headers_mut().insert(X_FORWARDED_HOST, host);
    }

    req.headers_mut()
        .insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));
}
