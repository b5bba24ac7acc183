pub mod admission;
pub mod authentication;
pub mod headers;
pub mod request;

pub use admission::{Admission, AdmissionControl, AdmissionMiddleware};
pub use authentication::Authenticated;
pub use headers::{add_forwarded_headers, ClientAddr};
pub use request::ForwardHandler;
