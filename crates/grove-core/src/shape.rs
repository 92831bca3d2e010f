//! Declarative shape descriptors.
//!
//! A [`Shape`] describes the structure of a Rust type as a
//! [`TypeDescriptor`]. The schema walker turns descriptors into schema nodes,
//! and the field list of a [`RecordDescriptor`] tells it which fields are
//! body properties and which are header, path or query parameters.
//!
//! Records are normally described with `#[derive(Shape)]`; the builder API
//! below covers manual declarations.
//!
//! ```
//! use grove_core::shape::{FieldDescriptor, RecordDescriptor, Shape, TypeDescriptor};
//!
//! struct GetItem {
//!     id: String,
//!     verbose: bool,
//! }
//!
//! impl Shape for GetItem {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::Record(
//!             RecordDescriptor::new("GetItem")
//!                 .field(FieldDescriptor::new("id", String::describe).path("id"))
//!                 .field(FieldDescriptor::new("verbose", bool::describe).query("verbose")),
//!         )
//!     }
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

/// A type with a static structural description.
pub trait Shape {
    /// Describes the type.
    fn describe() -> TypeDescriptor;

    /// Content type this shape wants to be encoded with, when it differs
    /// from the router default.
    fn content_type() -> Option<&'static str> {
        None
    }
}

/// A structural description of a type.
///
/// Nested shapes are referenced through `fn` thunks so recursive records can
/// be described without building an infinite value.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// No value; produces no schema.
    Unit,
    /// `true` / `false`.
    Bool,
    /// Text.
    String,
    /// Whole numbers. Unsigned integers are constrained to a minimum of 0.
    Integer {
        /// Width hint such as `int32`; `None` for the platform default.
        format: Option<&'static str>,
        /// Whether negative values are excluded.
        unsigned: bool,
    },
    /// Floating point numbers.
    Number {
        /// `float` or `double`.
        format: &'static str,
    },
    /// Sequences.
    Array {
        /// Element shape.
        items: fn() -> TypeDescriptor,
        /// Fixed length, for arrays.
        len: Option<usize>,
    },
    /// String-keyed maps.
    Map {
        /// Value shape.
        values: fn() -> TypeDescriptor,
    },
    /// Any value.
    Dynamic,
    /// A named record with fields.
    Record(RecordDescriptor),
}

impl TypeDescriptor {
    /// Describes `T`.
    #[must_use]
    pub fn of<T: Shape + ?Sized>() -> Self {
        T::describe()
    }
}

/// A named record and its fields.
#[derive(Debug, Clone)]
pub struct RecordDescriptor {
    /// Canonical name, used as the component key.
    pub name: String,
    /// Full Rust type path, telling apart records that share a name.
    pub type_path: Option<String>,
    /// Fields in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    /// Creates a record with no fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_path: None,
            fields: Vec::new(),
        }
    }

    /// Creates a record named after `type_name`, see [`canonical_name`].
    #[must_use]
    pub fn named_after(type_name: &str) -> Self {
        Self::new(canonical_name(type_name)).with_type_path(type_name)
    }

    /// Sets the full type path.
    #[must_use]
    pub fn with_type_path(mut self, type_path: impl Into<String>) -> Self {
        self.type_path = Some(type_path.into());
        self
    }

    /// Appends a field.
    #[must_use]
    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

/// Where a parameter field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// A request header.
    Header(&'static str),
    /// A path variable.
    Path(&'static str),
    /// A query-string key.
    Query(&'static str),
}

impl ParamLocation {
    /// The external name of the parameter.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Header(name) | Self::Path(name) | Self::Query(name) => name,
        }
    }
}

/// One field of a record.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// The Rust field name.
    pub ident: &'static str,
    /// Serialized name override; `"-"` omits the field.
    pub rename: Option<&'static str>,
    /// Omitted from the schema and from decoding.
    pub skip: bool,
    /// Parameter location, `None` for body properties.
    pub location: Option<ParamLocation>,
    /// Field shape.
    pub shape: fn() -> TypeDescriptor,
}

impl FieldDescriptor {
    /// Creates a body field.
    #[must_use]
    pub fn new(ident: &'static str, shape: fn() -> TypeDescriptor) -> Self {
        Self {
            ident,
            rename: None,
            skip: false,
            location: None,
            shape,
        }
    }

    /// Sets the serialized name.
    #[must_use]
    pub fn rename(mut self, name: &'static str) -> Self {
        self.rename = Some(name);
        self
    }

    /// Omits the field.
    #[must_use]
    pub fn skip(mut self) -> Self {
        self.skip = true;
        self
    }

    /// Reads the field from a request header.
    #[must_use]
    pub fn header(mut self, name: &'static str) -> Self {
        self.location = Some(ParamLocation::Header(name));
        self
    }

    /// Reads the field from a path variable.
    #[must_use]
    pub fn path(mut self, name: &'static str) -> Self {
        self.location = Some(ParamLocation::Path(name));
        self
    }

    /// Reads the field from the query string.
    #[must_use]
    pub fn query(mut self, name: &'static str) -> Self {
        self.location = Some(ParamLocation::Query(name));
        self
    }

    /// Name of the emitted body property, or `None` when the field is omitted.
    #[must_use]
    pub fn property_name(&self) -> Option<&'static str> {
        if self.skip {
            return None;
        }
        match self.rename {
            Some("-") => None,
            Some(name) => Some(name),
            None => Some(self.ident),
        }
    }
}

/// Reduces a `std::any::type_name` string to a component-safe name.
///
/// Module paths are dropped and generic arguments are joined with `_`, so
/// `app::api::Page<app::model::Item>` becomes `Page_Item`.
#[must_use]
pub fn canonical_name(type_name: &str) -> String {
    let mut out = String::with_capacity(type_name.len());
    let mut segment_start = 0;
    let mut chars = type_name.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                out.truncate(segment_start);
            }
            '<' | ',' => {
                out.push('_');
                segment_start = out.len();
            }
            c if c.is_alphanumeric() || c == '_' => out.push(c),
            _ => segment_start = out.len(),
        }
    }

    out
}

/// Marker input for routes that read the raw request body.
///
/// Registering a handler with `Raw` input selects the raw-stream context,
/// which has no decoding accessors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Raw;

impl Shape for Raw {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Dynamic
    }
}

impl Shape for () {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Unit
    }
}

impl Shape for bool {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Bool
    }
}

macro_rules! string_shapes {
    ($($ty:ty),*) => {
        $(impl Shape for $ty {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::String
            }
        })*
    };
}

string_shapes!(String, str, char);

macro_rules! integer_shapes {
    ($($ty:ty => $format:expr, $unsigned:expr;)*) => {
        $(impl Shape for $ty {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::Integer {
                    format: $format,
                    unsigned: $unsigned,
                }
            }
        })*
    };
}

integer_shapes! {
    i8 => Some("int8"), false;
    i16 => Some("int16"), false;
    i32 => Some("int32"), false;
    i64 => Some("int64"), false;
    i128 => None, false;
    isize => None, false;
    u8 => Some("uint8"), true;
    u16 => Some("uint16"), true;
    u32 => Some("uint32"), true;
    u64 => Some("uint64"), true;
    u128 => None, true;
    usize => Some("uint"), true;
}

impl Shape for f32 {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Number { format: "float" }
    }
}

impl Shape for f64 {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Number { format: "double" }
    }
}

impl Shape for serde_json::Value {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Dynamic
    }
}

impl<T: Shape, const N: usize> Shape for [T; N] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Array {
            items: T::describe,
            len: Some(N),
        }
    }
}

macro_rules! sequence_shapes {
    ($($ty:ident),*) => {
        $(impl<T: Shape> Shape for $ty<T> {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::Array {
                    items: T::describe,
                    len: None,
                }
            }
        })*
    };
}

sequence_shapes!(Vec, VecDeque, HashSet, BTreeSet);

impl<T: Shape> Shape for [T] {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Array {
            items: T::describe,
            len: None,
        }
    }
}

macro_rules! map_shapes {
    ($($ty:ident),*) => {
        $(impl<K, V: Shape> Shape for $ty<K, V> {
            fn describe() -> TypeDescriptor {
                TypeDescriptor::Map { values: V::describe }
            }
        })*
    };
}

map_shapes!(HashMap, BTreeMap, IndexMap);

macro_rules! transparent_shapes {
    ($($ty:ident),*) => {
        $(impl<T: Shape + ?Sized> Shape for $ty<T> {
            fn describe() -> TypeDescriptor {
                T::describe()
            }

            fn content_type() -> Option<&'static str> {
                T::content_type()
            }
        })*
    };
}

transparent_shapes!(Box, Arc, Rc);

impl<T: Shape> Shape for Option<T> {
    fn describe() -> TypeDescriptor {
        T::describe()
    }

    fn content_type() -> Option<&'static str> {
        T::content_type()
    }
}

impl<T: Shape + ?Sized> Shape for &T {
    fn describe() -> TypeDescriptor {
        T::describe()
    }
}
