//! Radix tree nodes.
//!
//! Each node owns one path segment. Matching prefers static children, then
//! the parameter child, then the trailing wildcard, and backtracks when a
//! preferred branch dead-ends deeper in the tree or does not serve the
//! request verb.

use http::Method;

use crate::method_table::{MethodTable, Slot};
use crate::PatternError;

/// Kind of path segment in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentKind {
    /// Literal segment such as `items`.
    Static,
    /// Single-segment capture such as `{id}`.
    Param,
    /// Capture of every remaining segment, `{rest...}` or `*rest`.
    Wildcard,
}

/// A parsed pattern segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Literal text for static segments, capture name otherwise.
    pub text: String,
    /// What the segment matches.
    pub kind: SegmentKind,
}

/// Outcome of [`Node::lookup`].
#[derive(Debug)]
pub enum NodeMatch<'a> {
    /// A registration serves the verb; carries the captured values.
    Found(&'a Slot, Vec<String>),
    /// The path exists, but only for other verbs. The table is the most
    /// specific one reached.
    WrongMethod(&'a MethodTable),
    /// No pattern matches the path.
    Missing,
}

fn serve<'a>(
    table: &'a MethodTable,
    method: &Method,
    nearest: &mut Option<&'a MethodTable>,
) -> Option<&'a Slot> {
    let slot = table.resolve(method);
    if slot.is_none() && nearest.is_none() {
        *nearest = Some(table);
    }
    slot
}

/// A node in the radix tree.
#[derive(Debug, Clone)]
pub struct Node {
    segment: String,
    kind: SegmentKind,
    methods: Option<MethodTable>,
    static_children: Vec<Node>,
    param_child: Option<Box<Node>>,
    wildcard_child: Option<Box<Node>>,
}

impl Node {
    fn new(segment: impl Into<String>, kind: SegmentKind) -> Self {
        Self {
            segment: segment.into(),
            kind,
            methods: None,
            static_children: Vec::new(),
            param_child: None,
            wildcard_child: None,
        }
    }

    /// Creates the root node.
    #[must_use]
    pub fn root() -> Self {
        Self::new("", SegmentKind::Static)
    }

    /// Splits a pattern into typed segments.
    ///
    /// Empty segments are dropped, so a trailing slash does not create a node.
    pub fn parse_pattern(pattern: &str) -> Result<Vec<Segment>, PatternError> {
        let raw: Vec<&str> = pattern.split('/').filter(|s| !s.is_empty()).collect();
        let mut segments = Vec::with_capacity(raw.len());

        for (index, part) in raw.iter().enumerate() {
            let segment = if let Some(inner) = part.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                match inner.strip_suffix("...") {
                    Some(name) => Segment {
                        text: name.to_string(),
                        kind: SegmentKind::Wildcard,
                    },
                    None => Segment {
                        text: inner.to_string(),
                        kind: SegmentKind::Param,
                    },
                }
            } else if let Some(name) = part.strip_prefix('*') {
                Segment {
                    text: name.to_string(),
                    kind: SegmentKind::Wildcard,
                }
            } else {
                Segment {
                    text: (*part).to_string(),
                    kind: SegmentKind::Static,
                }
            };

            if segment.kind != SegmentKind::Static && segment.text.is_empty() {
                return Err(PatternError::UnnamedCapture {
                    pattern: pattern.to_string(),
                });
            }
            if segment.kind == SegmentKind::Wildcard && index + 1 != raw.len() {
                return Err(PatternError::WildcardNotLast {
                    pattern: pattern.to_string(),
                });
            }
            segments.push(segment);
        }

        Ok(segments)
    }

    /// Inserts `slot` at the node addressed by `segments`.
    ///
    /// Returns the rejected slot when the verb is already registered there.
    pub fn insert(
        &mut self,
        segments: &[Segment],
        method: Option<&Method>,
        slot: Slot,
    ) -> Result<(), Slot> {
        let Some((head, rest)) = segments.split_first() else {
            return self
                .methods
                .get_or_insert_with(MethodTable::new)
                .insert(method, slot);
        };

        let child = match head.kind {
            SegmentKind::Static => {
                match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(&head.text))
                {
                    Ok(i) => &mut self.static_children[i],
                    Err(i) => {
                        self.static_children
                            .insert(i, Node::new(head.text.clone(), SegmentKind::Static));
                        &mut self.static_children[i]
                    }
                }
            }
            SegmentKind::Param => &mut **self
                .param_child
                .get_or_insert_with(|| Box::new(Node::new("{}", SegmentKind::Param))),
            SegmentKind::Wildcard => &mut **self
                .wildcard_child
                .get_or_insert_with(|| Box::new(Node::new("*", SegmentKind::Wildcard))),
        };
        child.insert(rest, method, slot)
    }

    /// Finds the slot serving `method` at `path`, with the captured values in
    /// order.
    ///
    /// A branch whose node exists but does not serve `method` is skipped so a
    /// less specific branch can still serve it. When none does, the first
    /// such node reached is reported as [`NodeMatch::WrongMethod`].
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> NodeMatch<'_> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut values = Vec::new();
        let mut nearest = None;
        match self.match_segments(method, &segments, &mut values, &mut nearest) {
            Some(slot) => NodeMatch::Found(slot, values),
            None => nearest.map_or(NodeMatch::Missing, NodeMatch::WrongMethod),
        }
    }

    fn match_segments<'a>(
        &'a self,
        method: &Method,
        segments: &[&str],
        values: &mut Vec<String>,
        nearest: &mut Option<&'a MethodTable>,
    ) -> Option<&'a Slot> {
        let Some((head, rest)) = segments.split_first() else {
            return self
                .methods
                .as_ref()
                .and_then(|table| serve(table, method, nearest));
        };

        if let Ok(i) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(head))
        {
            let child = &self.static_children[i];
            if let Some(found) = child.match_segments(method, rest, values, nearest) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            values.push((*head).to_string());
            if let Some(found) = child.match_segments(method, rest, values, nearest) {
                return Some(found);
            }
            values.pop();
        }

        if let Some(table) = self.wildcard_child.as_ref().and_then(|c| c.methods.as_ref()) {
            if let Some(found) = serve(table, method, nearest) {
                values.push(segments.join("/"));
                return Some(found);
            }
        }

        None
    }

    /// Returns the kind of this node's segment.
    #[must_use]
    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }
}
