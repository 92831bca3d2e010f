//! Route middleware.
//!
//! A middleware runs before the handler with the [`RawContext`]. It continues
//! the chain by calling [`RawContext::next`] and stops it by returning an
//! error or by returning without calling `next`, optionally after writing its
//! own response with [`RawContext::write`].
//!
//! # Example
//!
//! ```rust
//! use grove_server::{from_fn, RawContext};
//! use grove_core::HttpError;
//!
//! let require_key = from_fn(|ctx: &mut RawContext| {
//!     Box::pin(async move {
//!         if ctx.header("x-api-key").is_none() {
//!             return Err(HttpError::unauthorized("missing api key").into());
//!         }
//!         ctx.next()
//!     })
//! })
//! .named("require-key");
//! ```

use grove_core::BoxFuture;

use crate::context::RawContext;

/// A step that runs before the handler.
pub trait Middleware: Send + Sync + 'static {
    /// Name used in logs when this middleware fails or stops the chain.
    fn name(&self) -> &'static str {
        "anonymous"
    }

    /// Runs the middleware.
    fn handle<'a>(&'a self, ctx: &'a mut RawContext) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Wraps a closure as a [`Middleware`].
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RawContext) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync + 'static,
{
    FnMiddleware {
        name: "anonymous",
        f,
    }
}

/// A closure middleware, built with [`from_fn`].
pub struct FnMiddleware<F> {
    name: &'static str,
    f: F,
}

impl<F> FnMiddleware<F> {
    /// Names the middleware for logs.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut RawContext) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync + 'static,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn handle<'a>(&'a self, ctx: &'a mut RawContext) -> BoxFuture<'a, anyhow::Result<()>> {
        (self.f)(ctx)
    }
}
