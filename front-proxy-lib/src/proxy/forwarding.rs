use crate::config::{Backend, Route};
use crate::load_balancing::RoundRobin;
use crate::proxy::client_pool::ClientPool;
use crate::proxy::http_result::{HttpError, HttpResult};
use crate::proxy::synthetic_response::RespBody;
use http::{header, Request, Response, Version};
use http_body_util::BodyExt;
use hyper::body::Incoming;

/// Send `req` to `backend` and relay its response
pub async fn forward(
    req: Request<Incoming>,
    backend: &str,
    client_pool: &ClientPool,
) -> HttpResult<Response<RespBody>> {
    let pq = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let uri = format!("http://{backend}{pq}")
        .parse::<http::Uri>()
        .map_err(|e| HttpError::InvalidUri(e.to_string()))?;

    let (mut parts, body) = req.into_parts();
    parts.uri = uri;
    // backends are spoken to over HTTP/1.1 regardless of the client's version
    parts.version = Version::HTTP_11;
    // let the client derive Host from the backend URI
    parts.headers.remove(header::HOST);

    let out_req = Request::from_parts(parts, body);

    match client_pool.client().request(out_req).await {
        Ok(resp) => Ok(resp.map(|b| b.boxed())),
        Err(e) => Err(HttpError::FailedToGetResponseFromBackend(e.to_string())),
    }
}

/// First route whose prefix matches `path`
pub fn pick_route<'a>(path: &str, routes: &'a [Route]) -> Option<&'a str> {
    routes
        .iter()
        .find(|r| path.starts_with(&r.prefix))
        .map(|r| r.backend.as_str())
}

/// Routed backend for `path`, falling back to round-robin across all backends
pub fn select_backend<'a>(
    path: &str,
    routes: &'a [Route],
    backends: &'a [Backend],
    round_robin: &RoundRobin,
) -> HttpResult<&'a str> {
    if let Some(backend) = pick_route(path, routes) {
        return Ok(backend);
    }
    if backends.is_empty() {
        return Err(HttpError::NoMatchingBackend);
    }
    let idx = round_robin.next(backends.len());
    backends
        .get(idx)
        .map(|b| b.address.as_str())
        .ok_or(HttpError::NoMatchingBackend)
}
