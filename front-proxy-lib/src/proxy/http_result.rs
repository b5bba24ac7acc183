use http::StatusCode;
use thiserror::Error;

/// HTTP result type, T is typically a hyper::Response
/// HttpError is used to generate a synthetic error response
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// Describes things that can go wrong in the forwarder
#[derive(Debug, Error, Clone)]
pub enum HttpError {
    #[error("No backend available")]
    NoMatchingBackend,

    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    #[error("Failed to get response from backend: {0}")]
    FailedToGetResponseFromBackend(String),
}

impl HttpError {
    /// Label used for the `error_type` metric attribute
    pub fn error_type(&self) -> &'static str {
        match self {
            HttpError::NoMatchingBackend => "no_matching_backend",
            HttpError::InvalidUri(_) => "invalid_uri",
            HttpError::FailedToGetResponseFromBackend(_) => "backend_unreachable",
        }
    }

    /// Body of the synthetic response sent to the client
    pub fn message(&self) -> &'static str {
        match self {
            HttpError::NoMatchingBackend => "Service Unavailable",
            HttpError::InvalidUri(_) => "Bad Request",
            HttpError::FailedToGetResponseFromBackend(_) => "Bad Gateway",
        }
    }
}

impl From<&HttpError> for StatusCode {
    fn from(e: &HttpError) -> StatusCode {
        match e {
            HttpError::NoMatchingBackend => StatusCode::SERVICE_UNAVAILABLE,
            HttpError::InvalidUri(_) => StatusCode::BAD_REQUEST,
            HttpError::FailedToGetResponseFromBackend(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
