//! # Grove Server
//!
//! Typed routes on top of hyper:
//!
//! - [`Router`] registers handlers per verb and pattern, freezes into a path
//!   table, and assembles the OpenAPI document for every route
//! - [`Route::dispatch`] runs middleware and the handler, and turns every
//!   error or panic into exactly one structured error response
//! - [`Context`] gives handlers their decoded input; [`RawContext`] is what
//!   middleware see
//! - [`Server`] is the HTTP/1 serving loop with request deadlines and
//!   graceful shutdown
//!
//! ## Example
//!
//! ```rust
//! use grove_core::{HttpError, Raw};
//! use grove_server::{from_fn, Context, RawContext, Router};
//!
//! let mut router = Router::new();
//! router.use_middleware(from_fn(|ctx: &mut RawContext| {
//!     Box::pin(async move {
//!         if ctx.header("authorization").is_none() {
//!             return Err(HttpError::unauthorized("missing credentials").into());
//!         }
//!         ctx.next()
//!     })
//! }));
//! router.get("/items/{id}", |ctx: Context<'_, Raw>| {
//!     Box::pin(async move {
//!         let id = ctx.path_param("id").unwrap_or_default().to_string();
//!         Ok(id)
//!     })
//! });
//!
//! let doc = router.schema();
//! assert!(doc.operation(&http::Method::GET, "/items/{id}").is_some());
//! ```

#![doc(html_root_url = "https://docs.rs/grove-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod middleware;
mod response;
mod route;
mod router;
mod server;
mod shutdown;

pub use context::{Context, Deadline, RawContext};
pub use error::ServerError;
pub use middleware::{from_fn, FnMiddleware, Middleware};
pub use response::{HttpResponse, ResponseBody};
pub use route::{endpoint, Endpoint, Route};
pub use router::{normalize_pattern, RouteHandle, Router, RouterOptions};
pub use server::Server;
pub use shutdown::{ConnectionGuard, ConnectionTracker, ShutdownSignal};

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
