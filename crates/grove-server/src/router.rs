//! Route registration, lookup and schema assembly.
//!
//! A [`Router`] has two phases. While building, routes and router-level
//! middleware are added through `&mut self`, and each pattern enters the
//! path table as it is registered, so a conflicting pattern panics right
//! there. The first call to [`Router::freeze`], [`Router::handle`] or
//! [`Router::schema`] closes registration; from then on the router is
//! immutable and can be shared behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use grove_core::Raw;
//! use grove_server::{Context, Router};
//!
//! let mut router = Router::new();
//! router.get("/health", |_ctx: Context<'_, Raw>| {
//!     Box::pin(async move { Ok("ok".to_string()) })
//! });
//!
//! router.freeze();
//! assert!(router.is_frozen());
//! assert_eq!(router.routes()[0].mux_pattern(), "GET /health");
//! ```

use std::borrow::Cow;
use std::sync::{Arc, OnceLock};

use bytes::Bytes;
use grove_config::RouterConfig;
use grove_core::{
    default_status, normalize_error, BoxFuture, Codec, CodecRegistry, ErrorProcessor, HttpError,
    Shape, StatusFn, YamlCodec,
};
use grove_docs::{OpenApi, PathItem};
use grove_router::{Lookup, Params, PathTable};
use http::header::{HeaderValue, ALLOW};
use http::{HeaderMap, Method, Request, StatusCode};
use serde::Serialize;
use tracing::{debug, info};

use crate::context::{Context, RawContext};
use crate::middleware::Middleware;
use crate::response::{self, HttpResponse};
use crate::route::Route;

/// Router-wide settings, fixed at construction.
#[derive(Clone)]
pub struct RouterOptions {
    prefix: String,
    codecs: CodecRegistry,
    error_processor: ErrorProcessor,
    status_fn: StatusFn,
    trailing_slash: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            codecs: CodecRegistry::new().with_codec(YamlCodec),
            error_processor: Arc::new(normalize_error),
            status_fn: Arc::new(default_status),
            trailing_slash: false,
        }
    }
}

impl RouterOptions {
    /// JSON by default, YAML available, no prefix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds options from the `[router]` configuration section.
    #[must_use]
    pub fn from_config(config: &RouterConfig) -> Self {
        Self::new()
            .prefix(config.prefix.clone())
            .content_type(config.content_type.clone())
            .trailing_slash(config.trailing_slash)
    }

    /// Mount prefix prepended to every pattern.
    #[must_use]
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Content type used when a shape does not ask for its own.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.codecs = self.codecs.with_default(content_type);
        self
    }

    /// Registers an additional codec.
    #[must_use]
    pub fn codec(mut self, codec: impl Codec) -> Self {
        self.codecs = self.codecs.with_codec(codec);
        self
    }

    /// Replaces the error processor applied to every failure.
    #[must_use]
    pub fn error_processor<F>(mut self, processor: F) -> Self
    where
        F: Fn(anyhow::Error) -> HttpError + Send + Sync + 'static,
    {
        self.error_processor = Arc::new(processor);
        self
    }

    /// Replaces the verb to default status mapping.
    #[must_use]
    pub fn status_fn<F>(mut self, status_fn: F) -> Self
    where
        F: Fn(Option<&Method>) -> StatusCode + Send + Sync + 'static,
    {
        self.status_fn = Arc::new(status_fn);
        self
    }

    /// Makes every pattern end with `/`.
    #[must_use]
    pub fn trailing_slash(mut self, enabled: bool) -> Self {
        self.trailing_slash = enabled;
        self
    }

    /// The registered codecs.
    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }
}

impl std::fmt::Debug for RouterOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterOptions")
            .field("prefix", &self.prefix)
            .field("codecs", &self.codecs)
            .field("trailing_slash", &self.trailing_slash)
            .finish_non_exhaustive()
    }
}

/// Joins the mount prefix and a pattern, then applies the slash rules.
///
/// A pattern of exactly `/` maps to the bare prefix.
///
/// ```
/// use grove_server::normalize_pattern;
///
/// assert_eq!(normalize_pattern("/api", "/items", false), "/api/items");
/// assert_eq!(normalize_pattern("/api", "/", false), "/api");
/// assert_eq!(normalize_pattern("", "items", true), "/items/");
/// ```
#[must_use]
pub fn normalize_pattern(prefix: &str, pattern: &str, trailing_slash: bool) -> String {
    let mut full = if prefix.is_empty() {
        pattern.to_string()
    } else if pattern == "/" {
        prefix.to_string()
    } else {
        format!("{prefix}{pattern}")
    };
    if !full.starts_with('/') {
        full.insert(0, '/');
    }
    if trailing_slash && !full.ends_with('/') {
        full.push('/');
    }
    full
}

/// The route list and its path table.
pub struct Router {
    options: RouterOptions,
    middlewares: Vec<Arc<dyn Middleware>>,
    routes: Vec<Route>,
    table: PathTable,
    frozen: OnceLock<()>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! verb_methods {
    ($($(#[$doc:meta])* $name:ident => $method:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            ///
            /// # Panics
            ///
            /// Panics if the router is frozen, or if the pattern is malformed
            /// or already registered for this verb.
            pub fn $name<I, O, F>(&mut self, pattern: &str, handler: F) -> RouteHandle<'_>
            where
                I: Shape + Send + 'static,
                O: Shape + Serialize + Send + 'static,
                F: for<'a> Fn(Context<'a, I>) -> BoxFuture<'a, anyhow::Result<O>>
                    + Send
                    + Sync
                    + 'static,
            {
                self.route(Some(Method::$method), pattern, handler)
            }
        )*
    };
}

impl Router {
    /// Creates a router with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RouterOptions::default())
    }

    /// Creates a router with the given options.
    #[must_use]
    pub fn with_options(options: RouterOptions) -> Self {
        Self {
            options,
            middlewares: Vec::new(),
            routes: Vec::new(),
            table: PathTable::new(),
            frozen: OnceLock::new(),
        }
    }

    /// The router options.
    pub fn options(&self) -> &RouterOptions {
        &self.options
    }

    /// Adds router-level middleware.
    ///
    /// Only routes registered afterwards run it.
    pub fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    verb_methods! {
        /// Registers a GET route.
        get => GET,
        /// Registers a HEAD route.
        head => HEAD,
        /// Registers a POST route.
        post => POST,
        /// Registers a PUT route.
        put => PUT,
        /// Registers a PATCH route.
        patch => PATCH,
        /// Registers a DELETE route.
        delete => DELETE,
    }

    /// Registers a route for every verb. It is served but not published in
    /// the schema.
    ///
    /// # Panics
    ///
    /// Panics if the router is frozen.
    pub fn any<I, O, F>(&mut self, pattern: &str, handler: F) -> RouteHandle<'_>
    where
        I: Shape + Send + 'static,
        O: Shape + Serialize + Send + 'static,
        F: for<'a> Fn(Context<'a, I>) -> BoxFuture<'a, anyhow::Result<O>> + Send + Sync + 'static,
    {
        self.route(None, pattern, handler)
    }

    /// Registers a route for `method`, or every verb when `None`.
    ///
    /// The route captures the router-level middleware registered so far and
    /// the default status for its verb.
    ///
    /// # Panics
    ///
    /// Panics if the router is frozen. Routes must all be registered before
    /// the first request or schema pull.
    ///
    /// Also panics if the pattern is malformed, or if an equivalent pattern
    /// is already registered for the same verb.
    pub fn route<I, O, F>(&mut self, method: Option<Method>, pattern: &str, handler: F) -> RouteHandle<'_>
    where
        I: Shape + Send + 'static,
        O: Shape + Serialize + Send + 'static,
        F: for<'a> Fn(Context<'a, I>) -> BoxFuture<'a, anyhow::Result<O>> + Send + Sync + 'static,
    {
        let pattern = normalize_pattern(&self.options.prefix, pattern, self.options.trailing_slash);
        assert!(
            !self.is_frozen(),
            "route {pattern} registered after the router was frozen; register every route before serving"
        );

        let index = self.routes.len();
        if let Err(err) = self.table.insert(method.as_ref(), &pattern, index) {
            panic!("cannot register route: {err}");
        }

        let status = (self.options.status_fn)(method.as_ref());
        let mut route = Route::new(
            method,
            pattern,
            handler,
            &self.options.codecs,
            Arc::clone(&self.options.error_processor),
            status,
        );
        route.extend_middleware(&self.middlewares);
        debug!(route = %route.mux_pattern(), "route registered");

        self.routes.push(route);
        RouteHandle {
            route: &mut self.routes[index],
        }
    }

    /// The registered routes, in registration order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Whether the path table has been built.
    pub fn is_frozen(&self) -> bool {
        self.frozen.get().is_some()
    }

    /// Closes registration. Later registrations panic.
    ///
    /// Serving and schema assembly freeze the router on first use; calling
    /// this up front makes the transition explicit.
    pub fn freeze(&self) {
        self.frozen.get_or_init(|| {
            info!(routes = self.table.len(), "router frozen");
        });
    }

    /// Serves one request.
    ///
    /// Unknown paths get a 404 and known paths with another verb a 405 with
    /// an `Allow` header, both encoded with the default codec.
    pub async fn handle(&self, request: Request<Bytes>) -> HttpResponse {
        let path = request.uri().path().to_string();
        let not_found = || self.error_response(HttpError::not_found(format!("no route matches {path}")));

        self.freeze();
        let lookup = self.table.lookup(request.method(), &path);
        match lookup {
            Lookup::Matched(matched) => {
                let Some(route) = self.routes.get(matched.route) else {
                    return not_found();
                };
                let ctx = RawContext::new(request)
                    .with_params(decode_params(&matched.params))
                    .with_codec(Arc::clone(route.codec()))
                    .with_status(route.status());
                route.dispatch(ctx).await
            }
            Lookup::MethodNotAllowed(allowed) => {
                let mut response = self.error_response(HttpError::method_not_allowed(format!(
                    "{} is not served at {path}",
                    request.method()
                )));
                let allow = allowed
                    .iter()
                    .map(Method::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if let Ok(value) = HeaderValue::from_str(&allow) {
                    response.headers_mut().insert(ALLOW, value);
                }
                response
            }
            Lookup::NotFound => not_found(),
        }
    }

    /// Encodes an error outside any route, through the error processor and
    /// the default codec.
    pub fn error_response(&self, error: HttpError) -> HttpResponse {
        let error = (self.options.error_processor)(anyhow::Error::new(error));
        let codec = self.options.codecs.resolve(None);
        response::error_response(codec.as_ref(), &error, HeaderMap::new())
    }

    /// Assembles the schema document for every published route.
    pub fn schema(&self) -> OpenApi {
        self.schema_with(OpenApi::default())
    }

    /// Adds every published route to `doc`.
    ///
    /// Any-verb routes have no slot in a path item and are skipped.
    pub fn schema_with(&self, mut doc: OpenApi) -> OpenApi {
        self.freeze();
        for route in &self.routes {
            let Some(method) = route.method().filter(|m| PathItem::has_slot(m)) else {
                debug!(route = %route.mux_pattern(), "route not published");
                continue;
            };
            let operation = route.operation(&mut doc.components);
            doc.add_operation(Some(method), route.pattern(), operation);
        }
        doc
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("options", &self.options)
            .field("middlewares", &self.middlewares.len())
            .field("routes", &self.routes)
            .field("frozen", &self.is_frozen())
            .finish()
    }
}

fn decode_params(params: &Params) -> Params {
    params
        .iter()
        .map(|(name, value)| {
            let value = urlencoding::decode(value).map_or_else(|_| value.to_string(), Cow::into_owned);
            (name.to_string(), value)
        })
        .collect()
}

/// A just-registered route, for chaining route-level settings.
pub struct RouteHandle<'r> {
    route: &'r mut Route,
}

impl RouteHandle<'_> {
    /// Appends middleware that runs after the router-level middleware.
    pub fn use_middleware(self, middleware: impl Middleware) -> Self {
        self.route.use_middleware(Arc::new(middleware));
        self
    }

    /// Overrides the success status.
    pub fn with_status(self, status: StatusCode) -> Self {
        self.route.set_status(status);
        self
    }

    /// The route being configured.
    pub fn route(&self) -> &Route {
        &*self.route
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::from_fn;
    use grove_core::Raw;
    use http_body_util::BodyExt;
    use proptest::prelude::*;

    fn text(router: &mut Router, method: Method, pattern: &str, reply: &'static str) {
        router.route(Some(method), pattern, move |_ctx: Context<'_, Raw>| {
            Box::pin(async move { Ok(reply.to_string()) })
        });
    }

    fn get(uri: &str) -> Request<Bytes> {
        Request::get(uri).body(Bytes::new()).unwrap()
    }

    async fn json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_normalize_pattern() {
        assert_eq!(normalize_pattern("", "/items", false), "/items");
        assert_eq!(normalize_pattern("", "", false), "/");
        assert_eq!(normalize_pattern("/v1", "/", false), "/v1");
        assert_eq!(normalize_pattern("/v1", "/", true), "/v1/");
        assert_eq!(normalize_pattern("/v1", "/items/", true), "/v1/items/");
        assert_eq!(normalize_pattern("v1", "/items", false), "/v1/items");
    }

    #[test]
    fn test_default_statuses_and_override() {
        let mut router = Router::new();
        text(&mut router, Method::POST, "/a", "");
        text(&mut router, Method::PATCH, "/a", "");
        router
            .delete("/a", |_ctx: Context<'_, Raw>| Box::pin(async move { Ok(()) }))
            .with_status(StatusCode::NO_CONTENT);

        let statuses: Vec<_> = router.routes().iter().map(Route::status).collect();
        assert_eq!(
            statuses,
            vec![StatusCode::CREATED, StatusCode::ACCEPTED, StatusCode::NO_CONTENT]
        );
    }

    #[test]
    #[should_panic(expected = "GET /items/{key} conflicts with an existing registration")]
    fn test_conflicting_pattern_panics_at_registration() {
        let mut router = Router::new();
        text(&mut router, Method::GET, "/items/{id}", "a");
        text(&mut router, Method::GET, "/items/{key}", "b");
    }

    #[test]
    #[should_panic(expected = "wildcard must be the last segment")]
    fn test_malformed_pattern_panics_at_registration() {
        let mut router = Router::new();
        text(&mut router, Method::GET, "/files/{rest...}/meta", "a");
    }

    #[test]
    fn test_same_pattern_for_other_verb_is_accepted() {
        let mut router = Router::new();
        text(&mut router, Method::GET, "/items/{id}", "a");
        text(&mut router, Method::PUT, "/items/{key}", "b");
        router.freeze();
        assert!(router.is_frozen());
        assert_eq!(router.routes().len(), 2);
    }

    #[tokio::test]
    async fn test_param_route_serves_verb_missing_on_static_sibling() {
        let mut router = Router::new();
        text(&mut router, Method::GET, "/items/{id}", "by-id");
        text(&mut router, Method::POST, "/items/new", "create");

        let response = router.handle(get("/items/new")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!("by-id"));

        let request = Request::delete("/items/new").body(Bytes::new()).unwrap();
        let response = router.handle(request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
    }

    #[test]
    #[should_panic(expected = "registered after the router was frozen")]
    fn test_register_after_freeze_panics() {
        let mut router = Router::new();
        text(&mut router, Method::GET, "/a", "a");
        router.freeze();
        text(&mut router, Method::GET, "/b", "b");
    }

    #[tokio::test]
    async fn test_handle_decodes_path_params() {
        let mut router = Router::new();
        router.get("/files/{name}", |ctx: Context<'_, Raw>| {
            Box::pin(async move { Ok(ctx.path_param("name").unwrap_or_default().to_string()) })
        });

        let response = router.handle(get("/files/annual%20report")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await, serde_json::json!("annual report"));
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let mut router = Router::new();
        text(&mut router, Method::GET, "/items", "list");
        text(&mut router, Method::POST, "/items", "create");

        let response = router.handle(get("/missing")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(response).await["title"], "Not Found");

        let request = Request::delete("/items").body(Bytes::new()).unwrap();
        let response = router.handle(request).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let allow = response.headers()[ALLOW].to_str().unwrap().to_string();
        assert!(allow.contains("GET"));
        assert!(allow.contains("POST"));
    }

    #[tokio::test]
    async fn test_router_middleware_captured_at_registration() {
        let mut router = Router::new();
        text(&mut router, Method::GET, "/before", "before");
        router.use_middleware(from_fn(|ctx: &mut RawContext| {
            Box::pin(async move {
                ctx.set_header("x-guard", "on")?;
                ctx.next()
            })
        }));
        text(&mut router, Method::GET, "/after", "after");

        assert_eq!(router.routes()[0].middleware_count(), 0);
        assert_eq!(router.routes()[1].middleware_count(), 1);

        let response = router.handle(get("/before")).await;
        assert!(response.headers().get("x-guard").is_none());
        let response = router.handle(get("/after")).await;
        assert_eq!(response.headers()["x-guard"], "on");
    }

    #[tokio::test]
    async fn test_prefix_and_trailing_slash() {
        let mut router = Router::with_options(RouterOptions::new().prefix("/api").trailing_slash(true));
        text(&mut router, Method::GET, "/items", "list");
        assert_eq!(router.routes()[0].pattern(), "/api/items/");

        let response = router.handle(get("/api/items/")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_schema_skips_any_verb_routes() {
        let mut router = Router::new();
        text(&mut router, Method::GET, "/items", "list");
        router.any("/proxy/{rest...}", |_ctx: Context<'_, Raw>| {
            Box::pin(async move { Ok(()) })
        });

        let doc = router.schema();
        assert_eq!(doc.paths.len(), 1);
        assert!(doc.operation(&Method::GET, "/items").is_some());
    }

    #[test]
    fn test_options_from_config() {
        let config = RouterConfig {
            prefix: "/v2".to_string(),
            content_type: "application/yaml".to_string(),
            trailing_slash: false,
        };
        let options = RouterOptions::from_config(&config);
        assert_eq!(options.codecs().default_content_type(), "application/yaml");
        assert!(options.codecs().contains("application/json"));

        let mut router = Router::with_options(options);
        text(&mut router, Method::GET, "/", "root");
        assert_eq!(router.routes()[0].pattern(), "/v2");
        assert_eq!(
            router.routes()[0].codec().content_type(),
            "application/yaml"
        );
    }

    proptest! {
        #[test]
        fn prop_patterns_are_rooted(
            prefix in "(/[a-z]{1,6}){0,2}",
            pattern in "/?([a-z{}]{1,6}/?){0,3}",
            trailing in any::<bool>(),
        ) {
            let full = normalize_pattern(&prefix, &pattern, trailing);
            prop_assert!(full.starts_with('/'));
            if trailing {
                prop_assert!(full.ends_with('/'));
            }
        }
    }
}
