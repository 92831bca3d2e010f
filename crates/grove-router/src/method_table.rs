//! Per-path verb slots.
//!
//! A [`MethodTable`] sits on every node that terminates at least one
//! registered pattern and maps each verb to the route registered for it.
//! The extra `any` slot holds routes registered without a verb.

use http::Method;

/// A registered route as seen by the matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Index of the route in the caller's route list.
    pub route: usize,
    /// Parameter names of the registered pattern, in segment order.
    pub names: Vec<String>,
}

/// Maps HTTP verbs to routes for a single path.
///
/// # Example
///
/// ```rust
/// use grove_router::{MethodTable, Slot};
/// use http::Method;
///
/// let mut table = MethodTable::new();
/// table.insert(Some(&Method::GET), Slot { route: 0, names: vec![] }).unwrap();
/// table.insert(None, Slot { route: 1, names: vec![] }).unwrap();
///
/// assert_eq!(table.resolve(&Method::GET).map(|s| s.route), Some(0));
/// assert_eq!(table.resolve(&Method::PUT).map(|s| s.route), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodTable {
    get: Option<Slot>,
    head: Option<Slot>,
    post: Option<Slot>,
    put: Option<Slot>,
    delete: Option<Slot>,
    patch: Option<Slot>,
    options: Option<Slot>,
    trace: Option<Slot>,
    connect: Option<Slot>,
    extensions: Vec<(Method, Slot)>,
    any: Option<Slot>,
}

impl MethodTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `slot` under `method`, or under the any-verb slot for `None`.
    ///
    /// Returns the rejected slot when the verb is already taken.
    pub fn insert(&mut self, method: Option<&Method>, slot: Slot) -> Result<(), Slot> {
        let Some(method) = method else {
            return fill(&mut self.any, slot);
        };
        match self.standard_mut(method) {
            Some(entry) => fill(entry, slot),
            None => {
                if self.extensions.iter().any(|(m, _)| m == method) {
                    return Err(slot);
                }
                self.extensions.push((method.clone(), slot));
                Ok(())
            }
        }
    }

    /// Finds the route serving `method`.
    ///
    /// Resolution order is the exact verb, then GET for a HEAD request,
    /// then the any-verb slot.
    #[must_use]
    pub fn resolve(&self, method: &Method) -> Option<&Slot> {
        self.exact(method)
            .or_else(|| {
                if *method == Method::HEAD {
                    self.get.as_ref()
                } else {
                    None
                }
            })
            .or(self.any.as_ref())
    }

    /// Returns the verbs with an explicit registration on this path.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        let standard = [
            (Method::GET, &self.get),
            (Method::HEAD, &self.head),
            (Method::POST, &self.post),
            (Method::PUT, &self.put),
            (Method::DELETE, &self.delete),
            (Method::PATCH, &self.patch),
            (Method::OPTIONS, &self.options),
            (Method::TRACE, &self.trace),
            (Method::CONNECT, &self.connect),
        ];
        let mut allowed: Vec<Method> = standard
            .into_iter()
            .filter(|(_, slot)| slot.is_some())
            .map(|(m, _)| m)
            .collect();
        if self.get.is_some() && self.head.is_none() {
            allowed.insert(1, Method::HEAD);
        }
        allowed.extend(self.extensions.iter().map(|(m, _)| m.clone()));
        allowed
    }

    /// Returns true when no verb, including the any slot, is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.any.is_none() && self.extensions.is_empty() && self.allowed_methods().is_empty()
    }

    fn exact(&self, method: &Method) -> Option<&Slot> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            Method::TRACE => self.trace.as_ref(),
            Method::CONNECT => self.connect.as_ref(),
            _ => self
                .extensions
                .iter()
                .find(|(m, _)| m == method)
                .map(|(_, slot)| slot),
        }
    }

    fn standard_mut(&mut self, method: &Method) -> Option<&mut Option<Slot>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::HEAD => Some(&mut self.head),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::DELETE => Some(&mut self.delete),
            Method::PATCH => Some(&mut self.patch),
            Method::OPTIONS => Some(&mut self.options),
            Method::TRACE => Some(&mut self.trace),
            Method::CONNECT => Some(&mut self.connect),
            _ => None,
        }
    }
}

fn fill(entry: &mut Option<Slot>, slot: Slot) -> Result<(), Slot> {
    if entry.is_some() {
        return Err(slot);
    }
    *entry = Some(slot);
    Ok(())
}
