//! Radix tree path matcher for Grove.
//!
//! The matcher maps a verb and a path pattern to the index of a registered
//! route and hands back the captured path variables. It knows nothing about
//! handlers; the routing layer owns the route list and uses the index.
//!
//! # Pattern syntax
//!
//! - static segments: `/items`
//! - single-segment captures: `/items/{id}`
//! - trailing captures of the remaining path: `/files/{path...}` or `/files/*path`
//!
//! Empty segments are ignored, so `/items` and `/items/` address the same node.
//!
//! # Example
//!
//! ```rust
//! use grove_router::{Lookup, PathTable};
//! use http::Method;
//!
//! let mut table = PathTable::new();
//! table.insert(Some(&Method::GET), "/orgs/{org}/files/{path...}", 0).unwrap();
//!
//! let Lookup::Matched(m) = table.lookup(&Method::GET, "/orgs/acme/files/a/b.txt") else {
//!     unreachable!();
//! };
//! assert_eq!(m.params.get("org"), Some("acme"));
//! assert_eq!(m.params.get("path"), Some("a/b.txt"));
//! ```

mod method_table;
mod node;
mod params;
mod table;

use http::Method;
use thiserror::Error;

pub use method_table::{MethodTable, Slot};
pub use node::{Node, NodeMatch, Segment, SegmentKind};
pub use params::Params;
pub use table::PathTable;

/// A successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMatch {
    /// Index of the matched route.
    pub route: usize,
    /// Captured path variables.
    pub params: Params,
}

/// Outcome of [`PathTable::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A route serves this verb and path.
    Matched(PathMatch),
    /// The path exists but not for this verb; carries the verbs that are served.
    MethodNotAllowed(Vec<Method>),
    /// No pattern matches the path.
    NotFound,
}

/// Errors raised while registering patterns.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// The verb is already registered at an equivalent pattern.
    #[error("{method} {pattern} conflicts with an existing registration")]
    Conflict {
        /// The verb, `*` for any-verb registrations.
        method: String,
        /// The rejected pattern.
        pattern: String,
    },

    /// A trailing capture appears before the final segment.
    #[error("wildcard must be the last segment in {pattern}")]
    WildcardNotLast {
        /// The rejected pattern.
        pattern: String,
    },

    /// A capture has no name.
    #[error("capture without a name in {pattern}")]
    UnnamedCapture {
        /// The rejected pattern.
        pattern: String,
    },
}
