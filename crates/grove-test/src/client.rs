//! In-memory client over a [`Router`].

use std::sync::Arc;

use bytes::Bytes;
use grove_server::Router;
use http::Method;
use serde::Serialize;

use crate::error::TestError;
use crate::request::TestRequestBuilder;
use crate::response::TestResponse;

/// Sends requests straight into [`Router::handle`], without a socket.
///
/// The full pipeline runs: lookup, middleware, decoding, error
/// normalization and encoding.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
///
/// use grove_core::Raw;
/// use grove_server::{Context, Router};
/// use grove_test::TestClient;
///
/// # tokio_test::block_on(async {
/// let mut router = Router::new();
/// router.get("/ping", |_ctx: Context<'_, Raw>| {
///     Box::pin(async move { Ok("pong".to_string()) })
/// });
///
/// let client = TestClient::new(Arc::new(router));
/// let response = client.get("/ping").send().await;
/// assert_eq!(response.json::<String>().unwrap(), "pong");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct TestClient {
    router: Arc<Router>,
    default_headers: Vec<(String, String)>,
}

impl TestClient {
    /// Creates a client for `router`.
    #[must_use]
    pub fn new(router: Arc<Router>) -> Self {
        Self {
            router,
            default_headers: Vec::new(),
        }
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn with_default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// The router under test.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Starts a GET request.
    pub fn get(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::GET, path)
    }

    /// Starts a HEAD request.
    pub fn head(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::HEAD, path)
    }

    /// Starts a POST request.
    pub fn post(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::POST, path)
    }

    /// Starts a PUT request.
    pub fn put(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PUT, path)
    }

    /// Starts a PATCH request.
    pub fn patch(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::PATCH, path)
    }

    /// Starts a DELETE request.
    pub fn delete(&self, path: impl AsRef<str>) -> TestClientRequest<'_> {
        self.request(Method::DELETE, path)
    }

    /// Starts a request with any verb.
    pub fn request(&self, method: Method, path: impl AsRef<str>) -> TestClientRequest<'_> {
        let builder = self
            .default_headers
            .iter()
            .fold(TestRequestBuilder::new(method, path), |builder, (name, value)| {
                builder.header(name, value)
            });
        TestClientRequest {
            client: self,
            builder,
        }
    }
}

/// A request bound to a [`TestClient`].
#[must_use]
#[derive(Debug)]
pub struct TestClientRequest<'a> {
    client: &'a TestClient,
    builder: TestRequestBuilder,
}

impl TestClientRequest<'_> {
    /// Sets a header.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(mut self, content_type: impl AsRef<str>) -> Self {
        self.builder = self.builder.content_type(content_type);
        self
    }

    /// Sets a bearer token.
    pub fn bearer_token(mut self, token: impl AsRef<str>) -> Self {
        self.builder = self.builder.bearer_token(token);
        self
    }

    /// Appends a query parameter.
    pub fn query(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.builder = self.builder.query(name, value);
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.builder = self.builder.body(body);
        self
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        self.builder = self.builder.json(value);
        self
    }

    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be built or the body cannot
    /// be read. Error statuses are responses, not errors.
    pub async fn try_send(self) -> Result<TestResponse, TestError> {
        let request = self.builder.build()?;
        let response = self.client.router.handle(request).await;
        TestResponse::from_http(response).await
    }

    /// Sends the request.
    ///
    /// # Panics
    ///
    /// Panics where [`try_send`](Self::try_send) would return an error.
    pub async fn send(self) -> TestResponse {
        match self.try_send().await {
            Ok(response) => response,
            Err(err) => panic!("test request failed: {err}"),
        }
    }
}
