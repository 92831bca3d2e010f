//! The HTTP serving loop.
//!
//! Built on hyper's HTTP/1 connection driver and Tokio:
//!
//! - one task per accepted connection, counted by a [`ConnectionTracker`]
//! - each request body collected, given a [`Deadline`], and handed to
//!   [`Router::handle`] under the request timeout
//! - on shutdown, the listener stops and open connections get
//!   `shutdown_timeout_secs` to finish
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use grove_config::ServerConfig;
//! use grove_core::Raw;
//! use grove_server::{Context, Router, Server};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), grove_server::ServerError> {
//!     let mut router = Router::new();
//!     router.get("/health", |_ctx: Context<'_, Raw>| {
//!         Box::pin(async move { Ok("ok".to_string()) })
//!     });
//!
//!     Server::new(Arc::new(router), ServerConfig::default()).run().await
//! }
//! ```

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use grove_config::ServerConfig;
use grove_core::HttpError;
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::context::Deadline;
use crate::error::ServerError;
use crate::response::HttpResponse;
use crate::router::Router;
use crate::shutdown::{ConnectionTracker, ShutdownSignal};

/// Serves a frozen [`Router`] over HTTP/1.
#[derive(Debug)]
pub struct Server {
    router: Arc<Router>,
    config: ServerConfig,
}

impl Server {
    /// Creates a server for `router`.
    #[must_use]
    pub fn new(router: Arc<Router>, config: ServerConfig) -> Self {
        Self { router, config }
    }

    /// The served router.
    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// The server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Binds the configured address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address is malformed or taken.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        let addr: SocketAddr = self.config.http_addr.parse().map_err(|e: std::net::AddrParseError| {
            ServerError::Bind {
                addr: self.config.http_addr.clone(),
                reason: e.to_string(),
            }
        })?;
        TcpListener::bind(addr).await.map_err(|e| ServerError::Bind {
            addr: addr.to_string(),
            reason: e.to_string(),
        })
    }

    /// Serves until SIGINT or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the listener cannot be bound.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(ShutdownSignal::with_os_signals()).await
    }

    /// Serves until `shutdown` is triggered.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the listener cannot be bound.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown).await
    }

    /// Serves connections accepted on `listener` until `shutdown` is
    /// triggered, then drains open connections.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Io`] if the listener address cannot be read.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        self.router.freeze();
        info!(addr = %local_addr, routes = self.router.routes().len(), "server listening");

        let request_timeout = self.config.request_timeout();
        let tracker = ConnectionTracker::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote_addr)) => {
                        let router = Arc::clone(&self.router);
                        let guard = tracker.acquire();
                        let shutdown = shutdown.clone();
                        tokio::spawn(async move {
                            if let Err(err) =
                                serve_connection(router, stream, request_timeout, shutdown).await
                            {
                                debug!(remote = %remote_addr, error = %err, "connection error");
                            }
                            drop(guard);
                        });
                    }
                    Err(err) => {
                        error!(error = %err, "failed to accept connection");
                    }
                },
                () = shutdown.recv() => {
                    info!("shutdown signal received, no longer accepting connections");
                    break;
                }
            }
        }

        let shutdown_timeout = self.config.shutdown_timeout();
        info!(
            active = tracker.active_connections(),
            timeout_secs = shutdown_timeout.as_secs(),
            "draining connections"
        );
        tokio::select! {
            () = tracker.wait_idle() => info!("all connections closed"),
            () = tokio::time::sleep(shutdown_timeout) => warn!(
                active = tracker.active_connections(),
                "shutdown timeout reached with connections still open"
            ),
        }

        info!("server stopped");
        Ok(())
    }
}

async fn serve_connection(
    router: Arc<Router>,
    stream: TcpStream,
    request_timeout: Duration,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let service = service_fn(move |request: Request<Incoming>| {
        let router = Arc::clone(&router);
        async move { Ok::<_, Infallible>(handle_request(&router, request, request_timeout).await) }
    });

    let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(connection);

    tokio::select! {
        result = connection.as_mut() => result,
        () = shutdown.recv() => {
            connection.as_mut().graceful_shutdown();
            connection.await
        }
    }
}

async fn handle_request(
    router: &Router,
    request: Request<Incoming>,
    request_timeout: Duration,
) -> HttpResponse {
    let (mut parts, body) = request.into_parts();
    parts.extensions.insert(Deadline(Instant::now() + request_timeout));

    let work = async {
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(err) => {
                warn!(error = %err, "failed to read request body");
                return router.error_response(HttpError::bad_request("could not read request body"));
            }
        };
        router.handle(Request::from_parts(parts, body)).await
    };

    match tokio::time::timeout(request_timeout, work).await {
        Ok(response) => response,
        Err(_) => {
            warn!(
                timeout_ms = u64::try_from(request_timeout.as_millis()).unwrap_or(u64::MAX),
                "request timed out"
            );
            router.error_response(
                HttpError::with_status(StatusCode::GATEWAY_TIMEOUT).with_detail("request timed out"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use grove_core::Raw;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn config(addr: &str, request_timeout_ms: u64) -> ServerConfig {
        ServerConfig {
            http_addr: addr.to_string(),
            shutdown_timeout_secs: 1,
            request_timeout_ms,
        }
    }

    fn router() -> Arc<Router> {
        let mut router = Router::new();
        router.get("/hello", |ctx: Context<'_, Raw>| {
            Box::pin(async move {
                assert!(ctx.deadline().is_some());
                Ok("hi".to_string())
            })
        });
        router.get("/slow", |_ctx: Context<'_, Raw>| {
            Box::pin(async move {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("late".to_string())
            })
        });
        Arc::new(router)
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn test_invalid_address_is_bind_error() {
        let server = Server::new(router(), config("not an address", 1000));
        let err = server.run_with_shutdown(ShutdownSignal::new()).await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }));
    }

    #[tokio::test]
    async fn test_serves_until_shutdown() {
        let server = Server::new(router(), config("127.0.0.1:0", 1000));
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();
        let running = tokio::spawn(server.serve(listener, shutdown.clone()));

        let response = raw_get(addr, "/hello").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("\"hi\""));

        let response = raw_get(addr, "/nope").await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"));

        shutdown.trigger();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_request_timeout_is_504() {
        let server = Server::new(router(), config("127.0.0.1:0", 50));
        let listener = server.bind().await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = ShutdownSignal::new();
        let running = tokio::spawn(server.serve(listener, shutdown.clone()));

        let response = raw_get(addr, "/slow").await;
        assert!(response.starts_with("HTTP/1.1 504 Gateway Timeout"));
        assert!(response.contains("request timed out"));

        shutdown.trigger();
        running.await.unwrap().unwrap();
    }
}
