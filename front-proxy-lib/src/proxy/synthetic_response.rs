use http::header::{HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::body::Bytes;
use hyper::Response;

pub type RespBody = BoxBody<Bytes, hyper::Error>;

/// Build a plain-text 4xx/5xx response generated by the proxy itself
pub fn synthetic_error_response(status_code: StatusCode, message: &'static str) -> Response<RespBody> {
    let mut resp = Response::new(full_body(message));
    *resp.status_mut() = status_code;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    resp
}

pub fn full_body(content: impl Into<Bytes>) -> RespBody {
    Full::new(content.into())
        .map_err(|never| match never {})
        .boxed()
}
