//! Per-request contexts.
//!
//! [`RawContext`] owns everything one request needs: the request parts and
//! body, the captured path variables, the response headers and status, and
//! the middleware chain flag. Middleware receive it directly.
//!
//! Handlers receive a [`Context<'_, I>`], a view over the same `RawContext`
//! that decodes the body into `I` at most once. Decoding methods exist only
//! when `I: DeserializeOwned + Default`; with `I = Raw` the context is the
//! raw-stream variant and the body is read with [`RawContext::body_raw`].

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use grove_core::{Codec, DecodeError, JsonCodec};
use grove_router::Params;
use http::header::{HeaderName, HeaderValue};
use http::request::Parts;
use http::uri::PathAndQuery;
use http::{Extensions, HeaderMap, Method, Request, StatusCode, Uri, Version};
use serde::de::DeserializeOwned;

/// The instant by which a request must be answered.
///
/// The serving loop inserts it into the request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(pub Instant);

/// An explicit response written by middleware.
#[derive(Debug, Clone)]
pub(crate) struct Written {
    pub content_type: String,
    pub body: Bytes,
}

/// The untyped per-request context.
pub struct RawContext {
    parts: Parts,
    body: Bytes,
    params: Params,
    response_headers: HeaderMap,
    status: StatusCode,
    next_called: bool,
    written: Option<Written>,
    codec: Arc<dyn Codec>,
}

impl RawContext {
    /// Wraps a request with no path variables, the JSON codec and a 200 status.
    #[must_use]
    pub fn new(request: Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        Self {
            parts,
            body,
            params: Params::new(),
            response_headers: HeaderMap::new(),
            status: StatusCode::OK,
            next_called: true,
            written: None,
            codec: Arc::new(JsonCodec),
        }
    }

    /// Replaces the captured path variables.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Replaces the codec used for body decoding.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replaces the initial response status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Reads a request header. Values that are not visible ASCII read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// All request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// Sets a response header, replacing previous values.
    ///
    /// # Errors
    ///
    /// Fails if the name or value is not a valid header.
    pub fn set_header(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let (name, value) = header_pair(name, value)?;
        self.response_headers.insert(name, value);
        Ok(())
    }

    /// Appends a response header value.
    ///
    /// # Errors
    ///
    /// Fails if the name or value is not a valid header.
    pub fn add_header(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let (name, value) = header_pair(name, value)?;
        self.response_headers.append(name, value);
        Ok(())
    }

    /// Reads a response header set so far.
    pub fn response_header(&self, name: &str) -> Option<&str> {
        self.response_headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Reads a captured path variable.
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Sets a path variable, inserting or replacing.
    pub fn set_path_param(&mut self, name: &str, value: &str) {
        self.params.set(name, value);
    }

    /// All captured path variables.
    pub fn path_params(&self) -> &Params {
        &self.params
    }

    /// Reads the first value of a query parameter, decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        self.query_pairs()
            .into_iter()
            .find_map(|(key, value)| (key == name).then_some(value))
    }

    /// Sets a query parameter, replacing every previous value, and rewrites
    /// the request URI with the query re-encoded in key order.
    ///
    /// # Errors
    ///
    /// Fails if the rebuilt URI is invalid.
    pub fn set_query_param(&mut self, name: &str, value: &str) -> anyhow::Result<()> {
        let mut pairs = self.query_pairs();
        pairs.retain(|(key, _)| key != name);
        pairs.push((name.to_string(), value.to_string()));
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let query = serde_urlencoded::to_string(&pairs)?;
        let path_and_query: PathAndQuery = format!("{}?{query}", self.parts.uri.path()).parse()?;

        let mut uri_parts = self.parts.uri.clone().into_parts();
        uri_parts.path_and_query = Some(path_and_query);
        self.parts.uri = Uri::from_parts(uri_parts)?;
        Ok(())
    }

    fn query_pairs(&self) -> Vec<(String, String)> {
        self.parts
            .uri
            .query()
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default()
    }

    /// The response status.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Overrides the response status.
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Passes control to the next middleware or the handler.
    ///
    /// A middleware that returns without calling this stops the chain.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` lets middleware end with `ctx.next()`.
    pub fn next(&mut self) -> anyhow::Result<()> {
        self.next_called = true;
        Ok(())
    }

    /// Writes the response directly, with the current status and headers.
    ///
    /// Used by middleware that stop the chain with their own answer.
    pub fn write(&mut self, content_type: &str, body: impl Into<Bytes>) {
        self.written = Some(Written {
            content_type: content_type.to_string(),
            body: body.into(),
        });
    }

    /// The undecoded request payload.
    pub fn body_raw(&self) -> &Bytes {
        &self.body
    }

    /// The request method.
    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    /// The request URI, reflecting any [`set_query_param`](Self::set_query_param).
    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    /// The HTTP version.
    pub fn version(&self) -> Version {
        self.parts.version
    }

    /// Request extensions.
    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    /// Mutable request extensions, for passing values down the chain.
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.parts.extensions
    }

    /// The request deadline, if the serving loop set one.
    pub fn deadline(&self) -> Option<Instant> {
        self.parts.extensions.get::<Deadline>().map(|d| d.0)
    }

    /// Whether the deadline has passed.
    pub fn is_expired(&self) -> bool {
        self.deadline().is_some_and(|d| Instant::now() >= d)
    }

    /// The codec of the matched route.
    pub fn codec(&self) -> &Arc<dyn Codec> {
        &self.codec
    }

    pub(crate) fn reset_next(&mut self) {
        self.next_called = false;
    }

    pub(crate) fn next_called(&self) -> bool {
        self.next_called
    }

    pub(crate) fn take_written(&mut self) -> Option<Written> {
        self.written.take()
    }

    pub(crate) fn take_response_headers(&mut self) -> HeaderMap {
        std::mem::take(&mut self.response_headers)
    }
}

impl std::fmt::Debug for RawContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawContext")
            .field("method", &self.parts.method)
            .field("uri", &self.parts.uri)
            .field("params", &self.params)
            .field("status", &self.status)
            .field("codec", &self.codec.content_type())
            .finish_non_exhaustive()
    }
}

fn header_pair(name: &str, value: &str) -> anyhow::Result<(HeaderName, HeaderValue)> {
    Ok((
        HeaderName::from_bytes(name.as_bytes())?,
        HeaderValue::from_str(value)?,
    ))
}

/// A handler's view of the request, with the body typed as `I`.
///
/// Dereferences to [`RawContext`] for headers, parameters and status.
pub struct Context<'a, I> {
    raw: &'a mut RawContext,
    body: Option<I>,
}

impl<'a, I> Context<'a, I> {
    /// Wraps a raw context. Nothing is decoded yet.
    pub fn new(raw: &'a mut RawContext) -> Self {
        Self { raw, body: None }
    }
}

impl<I> Deref for Context<'_, I> {
    type Target = RawContext;

    fn deref(&self) -> &RawContext {
        self.raw
    }
}

impl<I> DerefMut for Context<'_, I> {
    fn deref_mut(&mut self) -> &mut RawContext {
        self.raw
    }
}

impl<I: DeserializeOwned + Default> Context<'_, I> {
    /// Decodes the body on the first call and returns the cached value after.
    ///
    /// An empty payload yields `I::default()`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if a non-empty payload does not decode into `I`.
    pub fn get_body(&mut self) -> Result<&I, DecodeError> {
        let body = match self.body.take() {
            Some(body) => body,
            None => decode(self.raw.codec.as_ref(), &self.raw.body)?,
        };
        Ok(self.body.insert(body))
    }

    /// Like [`get_body`](Self::get_body), but a decode failure panics with
    /// the [`DecodeError`] as payload. Dispatch turns that into a 400.
    pub fn body(&mut self) -> &I {
        match self.get_body() {
            Ok(body) => body,
            Err(err) => std::panic::panic_any(err),
        }
    }

    /// Decodes (or takes the cached) body by value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if a non-empty payload does not decode into `I`.
    pub fn into_body(mut self) -> Result<I, DecodeError> {
        match self.body.take() {
            Some(body) => Ok(body),
            None => decode(self.raw.codec.as_ref(), &self.raw.body),
        }
    }
}

fn decode<I: DeserializeOwned + Default>(codec: &dyn Codec, payload: &[u8]) -> Result<I, DecodeError> {
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Ok(I::default());
    }
    let value = codec.decode(payload).map_err(DecodeError::new)?;
    serde_json::from_value(value).map_err(DecodeError::new)
}
