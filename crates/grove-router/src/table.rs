//! The verb + pattern lookup table.

use http::Method;

use crate::method_table::Slot;
use crate::node::{Node, NodeMatch, SegmentKind};
use crate::params::Params;
use crate::{Lookup, PathMatch, PatternError};

/// A radix tree of registered patterns, each resolving to a route index.
///
/// # Example
///
/// ```rust
/// use grove_router::{Lookup, PathTable};
/// use http::Method;
///
/// let mut table = PathTable::new();
/// table.insert(Some(&Method::GET), "/items/{id}", 0).unwrap();
/// table.insert(None, "/health", 1).unwrap();
///
/// match table.lookup(&Method::GET, "/items/7") {
///     Lookup::Matched(m) => {
///         assert_eq!(m.route, 0);
///         assert_eq!(m.params.get("id"), Some("7"));
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// assert!(matches!(table.lookup(&Method::DELETE, "/items/7"), Lookup::MethodNotAllowed(_)));
/// assert!(matches!(table.lookup(&Method::GET, "/nope"), Lookup::NotFound));
/// ```
///
/// # Route Priority
///
/// 1. **Static segments** (`/users/me`)
/// 2. **Parameter segments** (`/users/{id}`)
/// 3. **Wildcard segments** (`/files/{path...}`)
#[derive(Debug, Clone)]
pub struct PathTable {
    root: Node,
    len: usize,
}

impl Default for PathTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PathTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: Node::root(),
            len: 0,
        }
    }

    /// Registers `route` for `method` (or every verb when `None`) at `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::Conflict`] when the verb is already registered
    /// at an equivalent pattern, or a syntax error for malformed captures.
    pub fn insert(
        &mut self,
        method: Option<&Method>,
        pattern: &str,
        route: usize,
    ) -> Result<(), PatternError> {
        let segments = Node::parse_pattern(pattern)?;
        let names = segments
            .iter()
            .filter(|s| s.kind != SegmentKind::Static)
            .map(|s| s.text.clone())
            .collect();

        self.root
            .insert(&segments, method, Slot { route, names })
            .map_err(|_| PatternError::Conflict {
                method: method.map_or_else(|| "*".to_string(), ToString::to_string),
                pattern: pattern.to_string(),
            })?;
        self.len += 1;
        Ok(())
    }

    /// Resolves a request verb and path.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> Lookup {
        match self.root.lookup(method, path) {
            NodeMatch::Found(slot, values) => {
                let params: Params = slot.names.iter().cloned().zip(values).collect();
                Lookup::Matched(PathMatch {
                    route: slot.route,
                    params,
                })
            }
            NodeMatch::WrongMethod(methods) => {
                let allowed = methods.allowed_methods();
                if allowed.is_empty() {
                    Lookup::NotFound
                } else {
                    Lookup::MethodNotAllowed(allowed)
                }
            }
            NodeMatch::Missing => Lookup::NotFound,
        }
    }

    /// Returns the number of registrations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
