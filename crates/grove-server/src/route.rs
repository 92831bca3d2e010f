//! Routes and the per-request dispatch pipeline.
//!
//! A [`Route`] is built once at registration from a typed handler. The
//! handler's input and output types are erased behind an [`Endpoint`]
//! closure, so dispatch itself is not generic: middleware run in order, then
//! the endpoint, and every failure (returned error, short circuit, panic)
//! converges on the route's error processor.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures_util::FutureExt;
use grove_core::{
    recover_panic, BoxFuture, ChainStopped, Codec, CodecRegistry, ErrorProcessor, Shape,
    TypeDescriptor,
};
use grove_docs::{synthesize_operation, Components, Operation, OperationSpec};
use grove_telemetry::{record_panic, record_request};
use http::{HeaderMap, Method, StatusCode};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::context::{Context, RawContext, Written};
use crate::middleware::Middleware;
use crate::response::{self, HttpResponse};

/// A handler with its input and output types erased.
pub type Endpoint = Arc<
    dyn for<'a> Fn(&'a mut RawContext) -> BoxFuture<'a, anyhow::Result<serde_json::Value>>
        + Send
        + Sync,
>;

fn erase<F>(f: F) -> Endpoint
where
    F: for<'a> Fn(&'a mut RawContext) -> BoxFuture<'a, anyhow::Result<serde_json::Value>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(f)
}

/// Wraps a typed handler into an [`Endpoint`] that serializes its output.
pub fn endpoint<I, O, F>(handler: F) -> Endpoint
where
    I: Send + 'static,
    O: Serialize + Send + 'static,
    F: for<'a> Fn(Context<'a, I>) -> BoxFuture<'a, anyhow::Result<O>> + Send + Sync + 'static,
{
    erase(move |raw| {
        let pending = handler(Context::new(raw));
        Box::pin(async move {
            let output = pending.await?;
            Ok(serde_json::to_value(output)?)
        })
    })
}

enum Reply {
    Written(Written),
    Output(serde_json::Value),
}

/// One registered operation.
pub struct Route {
    method: Option<Method>,
    pattern: String,
    middlewares: Vec<Arc<dyn Middleware>>,
    endpoint: Endpoint,
    codec: Arc<dyn Codec>,
    error_processor: ErrorProcessor,
    status: StatusCode,
    input: fn() -> TypeDescriptor,
    output: fn() -> TypeDescriptor,
    empty_output: bool,
    operation_id: String,
}

impl Route {
    /// Builds a route for a typed handler.
    ///
    /// The codec is the one registered for `O::content_type()`, falling back
    /// to the registry default.
    pub fn new<I, O, F>(
        method: Option<Method>,
        pattern: String,
        handler: F,
        codecs: &CodecRegistry,
        error_processor: ErrorProcessor,
        status: StatusCode,
    ) -> Self
    where
        I: Shape + Send + 'static,
        O: Shape + Serialize + Send + 'static,
        F: for<'a> Fn(Context<'a, I>) -> BoxFuture<'a, anyhow::Result<O>> + Send + Sync + 'static,
    {
        let operation_id = grove_docs::operation_id(method.as_ref(), &pattern);
        Self {
            method,
            pattern,
            middlewares: Vec::new(),
            endpoint: endpoint(handler),
            codec: codecs.resolve(O::content_type()),
            error_processor,
            status,
            input: I::describe,
            output: O::describe,
            empty_output: matches!(O::describe(), TypeDescriptor::Unit),
            operation_id,
        }
    }

    /// Appends middleware to this route only.
    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) {
        self.middlewares.push(middleware);
    }

    pub(crate) fn extend_middleware(&mut self, middlewares: &[Arc<dyn Middleware>]) {
        self.middlewares.extend(middlewares.iter().cloned());
    }

    pub(crate) fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// The verb, `None` for any verb.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The normalized pattern.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// `"<METHOD> <pattern>"`, or the bare pattern for any-verb routes.
    pub fn mux_pattern(&self) -> String {
        match &self.method {
            Some(method) => format!("{method} {}", self.pattern),
            None => self.pattern.clone(),
        }
    }

    /// Stable identifier derived from the verb and pattern.
    pub fn operation_id(&self) -> &str {
        &self.operation_id
    }

    /// Human-readable summary, the operation id spelled out in words.
    pub fn summary(&self) -> String {
        self.operation_id.replace('-', " ")
    }

    /// The success status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The codec bodies are encoded and decoded with.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    /// Number of middleware that run before the handler.
    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// What this route contributes to the schema document.
    pub fn operation_spec(&self) -> OperationSpec {
        OperationSpec {
            method: self.method.clone(),
            pattern: self.pattern.clone(),
            status: self.status,
            content_type: self.codec.content_type().to_string(),
            input: (self.input)(),
            output: (self.output)(),
        }
    }

    /// Synthesizes this route's operation, registering shared records in
    /// `components`.
    pub fn operation(&self, components: &mut Components) -> Operation {
        synthesize_operation(&self.operation_spec(), components)
    }

    /// Runs middleware and handler for one request and builds its response.
    ///
    /// Never fails and never unwinds: errors and panics become a structured
    /// error response.
    pub async fn dispatch(&self, mut ctx: RawContext) -> HttpResponse {
        let started = Instant::now();
        debug!(
            http.method = %ctx.method(),
            pattern = %self.pattern,
            operation_id = %self.operation_id,
            "dispatching request"
        );

        let outcome = match AssertUnwindSafe(self.run(&mut ctx)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => {
                let err = recover_panic(payload);
                record_panic(&self.operation_id);
                error!(
                    operation_id = %self.operation_id,
                    error = %err,
                    "recovered panic during dispatch"
                );
                Err(err)
            }
        };

        let headers = ctx.take_response_headers();
        let response = match outcome {
            Ok(Reply::Written(written)) => {
                response::build(ctx.status(), &written.content_type, written.body, headers)
            }
            Ok(Reply::Output(value)) => self.encode_output(ctx.status(), &value, headers),
            Err(err) => self.fail(err, headers),
        };

        record_request(
            &self.operation_id,
            response.status().as_u16(),
            started.elapsed(),
        );
        response
    }

    async fn run(&self, ctx: &mut RawContext) -> anyhow::Result<Reply> {
        for middleware in &self.middlewares {
            ctx.reset_next();
            if let Err(err) = middleware.handle(ctx).await {
                debug!(middleware = middleware.name(), "middleware returned an error");
                return Err(err);
            }
            if !ctx.next_called() {
                return match ctx.take_written() {
                    Some(written) => Ok(Reply::Written(written)),
                    None => Err(ChainStopped {
                        middleware: middleware.name().to_string(),
                    }
                    .into()),
                };
            }
        }

        let output = (self.endpoint)(ctx).await?;
        Ok(Reply::Output(output))
    }

    fn encode_output(
        &self,
        status: StatusCode,
        value: &serde_json::Value,
        headers: HeaderMap,
    ) -> HttpResponse {
        if self.empty_output {
            return response::build(status, self.codec.content_type(), Bytes::new(), headers);
        }
        match self.codec.encode(value) {
            Ok(body) => response::build(status, self.codec.content_type(), body, headers),
            Err(err) => self.fail(err.into(), headers),
        }
    }

    fn fail(&self, err: anyhow::Error, headers: HeaderMap) -> HttpResponse {
        let error = (self.error_processor)(err);
        warn!(
            operation_id = %self.operation_id,
            http.status = error.status().as_u16(),
            error = %error,
            cause = ?error.cause(),
            "request failed"
        );
        response::error_response(self.codec.as_ref(), &error, headers)
    }
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("middlewares", &self.middlewares.len())
            .field("status", &self.status)
            .field("codec", &self.codec.content_type())
            .field("operation_id", &self.operation_id)
            .finish_non_exhaustive()
    }
}
