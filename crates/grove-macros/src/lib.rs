//! Derive macro for Grove shape descriptors.
//!
//! `#[derive(Shape)]` builds the field-descriptor list of a struct once, at
//! compile time. The schema walker reads that list to decide which fields are
//! body properties and which are header, path or query parameters.
//!
//! # Example
//!
//! ```rust,ignore
//! use grove::Shape;
//! use serde::Deserialize;
//!
//! #[derive(Default, Deserialize, Shape)]
//! #[serde(rename_all = "camelCase")]
//! struct UpdateItem {
//!     #[shape(path = "id")]
//!     #[serde(skip)]
//!     id: String,
//!     display_name: String,
//!     #[shape(query = "dryRun")]
//!     #[serde(skip)]
//!     dry_run: bool,
//! }
//! ```
//!
//! # Attributes
//!
//! Field attributes:
//! - `#[shape(path = "..")]`, `#[shape(query = "..")]`, `#[shape(header = "..")]`.
//!   Parameters are not read from the body, so the field must also be
//!   `#[serde(skip)]` or `#[serde(default)]` (or the container `#[serde(default)]`);
//!   the derive rejects it otherwise
//! - `#[shape(rename = "..")]` or `#[serde(rename = "..")]`; `"-"` omits the field
//! - `#[shape(skip)]` or `#[serde(skip)]`
//!
//! Container attributes:
//! - `#[shape(name = "..")]` sets the component name
//! - `#[shape(content_type = "..")]` picks the codec for this shape
//! - `#[shape(rename_all = "..")]` or `#[serde(rename_all = "..")]`
//! - `#[shape(crate = "..")]` sets the path to the core types, `::grove::core` by default

mod derive;
mod parse;

use proc_macro::TokenStream;

/// Derives `Shape` for a struct with named fields.
///
/// Enums, unions and tuple structs are rejected. Generic parameters gain a
/// `Shape` bound.
#[proc_macro_derive(Shape, attributes(shape))]
pub fn derive_shape(input: TokenStream) -> TokenStream {
    derive::expand_shape(input.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
