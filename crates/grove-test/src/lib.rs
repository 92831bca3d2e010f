//! # Grove Test
//!
//! In-memory testing for Grove routers: requests go through
//! [`Router::handle`](grove_server::Router::handle) directly, so no port is
//! bound and the whole pipeline (lookup, middleware, decoding, error
//! normalization, encoding) runs.
//!
//! - [`TestClient`] starts requests per verb
//! - [`TestRequestBuilder`] sets headers, query parameters and bodies
//! - [`TestResponse`] holds the status, headers and body with JSON helpers

#![doc(html_root_url = "https://docs.rs/grove-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod request;
mod response;

pub use client::{TestClient, TestClientRequest};
pub use error::TestError;
pub use request::TestRequestBuilder;
pub use response::TestResponse;
