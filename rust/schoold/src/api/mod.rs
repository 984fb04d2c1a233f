//! Backend REST boundary: endpoint paths, typed request/response shapes and
//! the async HTTP client.

pub mod client;
pub mod error;
pub mod paths;
pub mod types;

pub use client::ApiClient;
pub use error::{ApiError, GENERIC_FAILURE};
