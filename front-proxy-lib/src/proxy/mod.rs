pub mod client_pool;
pub mod connection;
pub mod forwarding;
pub mod handler;
pub mod http_result;
pub mod server;
pub mod synthetic_response;

pub use client_pool::ClientPool;
pub use forwarding::{pick_route, select_backend};
pub use http_result::HttpError;
pub use server::{build_pipeline, run, serve, Pipeline};
