//! # Grove
//!
//! Typed HTTP routing where every route carries enough type information to
//! describe itself:
//!
//! - handlers receive a [`Context`](server::Context) with their input
//!   decoded on demand and return a typed output
//! - middleware run in registration order and can stop the chain
//! - every error or panic becomes one structured error response
//! - the router assembles an OpenAPI 3.1 document from the registered
//!   input and output shapes
//!
//! ## Quick Start
//!
//! ```rust
//! use grove::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Default, Deserialize, Shape)]
//! struct GetItem {
//!     #[shape(path = "id")]
//!     #[serde(skip)]
//!     id: String,
//! }
//!
//! #[derive(Serialize, Shape)]
//! struct Item {
//!     name: String,
//! }
//!
//! let mut router = Router::new();
//! router.get("/items/{id}", |ctx: Context<'_, GetItem>| {
//!     Box::pin(async move {
//!         let id = ctx.path_param("id").unwrap_or_default();
//!         if id == "0" {
//!             return Err(HttpError::not_found("no item 0").into());
//!         }
//!         Ok(Item { name: format!("item {id}") })
//!     })
//! });
//!
//! let doc = router.schema();
//! assert!(doc.components.schemas.contains_key("Item"));
//! ```
//!
//! ## Crates
//!
//! | Module        | Crate             | Contents                                   |
//! |---------------|-------------------|--------------------------------------------|
//! | [`core`]      | `grove-core`      | errors, codecs, shape descriptors          |
//! | [`router`]    | `grove-router`    | radix path matcher                         |
//! | [`docs`]      | `grove-docs`      | OpenAPI model and schema synthesis         |
//! | [`server`]    | `grove-server`    | routes, dispatch, router, serving loop     |
//! | [`telemetry`] | `grove-telemetry` | logging and metrics setup                  |
//! | [`config`]    | `grove-config`    | layered configuration                      |

#![doc(html_root_url = "https://docs.rs/grove/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use grove_config as config;
pub use grove_core as core;
pub use grove_docs as docs;
pub use grove_router as router;
pub use grove_server as server;
pub use grove_telemetry as telemetry;

pub use grove_core::Shape;
pub use grove_macros::Shape;

/// Common imports for applications.
///
/// ```rust
/// use grove::prelude::*;
/// ```
pub mod prelude {
    pub use grove_config::{ConfigLoader, GroveConfig};
    pub use grove_core::{BoxFuture, ErrorItem, ErrorKind, HttpError, Raw, Shape};
    pub use grove_docs::OpenApi;
    pub use grove_macros::Shape;
    pub use grove_server::{
        from_fn, Context, Middleware, RawContext, RouteHandle, Router, RouterOptions, Server,
        ShutdownSignal,
    };
}
