//! # Grove Docs
//!
//! OpenAPI 3.1 generation for Grove routes.
//!
//! - [`OpenApi`] and friends model the document.
//! - [`SchemaWalker`] turns shape descriptors into schema nodes and fills
//!   the shared component table.
//! - [`synthesize_operation`] builds one route's operation: parameters from
//!   tagged input fields, request body, success and default responses.
//!
//! ## Example
//!
//! ```rust
//! use grove_core::{FieldDescriptor, RecordDescriptor, Shape, TypeDescriptor};
//! use grove_docs::{synthesize_operation, OpenApi, OperationSpec};
//! use http::{Method, StatusCode};
//!
//! struct Greeting;
//!
//! impl Shape for Greeting {
//!     fn describe() -> TypeDescriptor {
//!         TypeDescriptor::Record(
//!             RecordDescriptor::new("Greeting")
//!                 .field(FieldDescriptor::new("message", String::describe)),
//!         )
//!     }
//! }
//!
//! let mut doc = OpenApi::default();
//! let spec = OperationSpec {
//!     method: Some(Method::GET),
//!     pattern: "/hello".to_string(),
//!     status: StatusCode::OK,
//!     content_type: "application/json".to_string(),
//!     input: <()>::describe(),
//!     output: Greeting::describe(),
//! };
//! let operation = synthesize_operation(&spec, &mut doc.components);
//! doc.add_operation(spec.method.as_ref(), &spec.pattern, operation);
//!
//! assert!(doc.to_json().unwrap().contains("get-hello"));
//! ```

mod error;
mod openapi;
mod operation;
mod walker;

pub use error::{DocsError, DocsResult};
pub use openapi::{
    AdditionalProperties, Components, Info, MediaType, OpenApi, OpenApiBuilder, Operation,
    Parameter, ParameterIn, PathItem, RequestBody, Response, Schema, SchemaType, Server, Tag,
    COMPONENT_REF_PREFIX,
};
pub use operation::{operation_id, synthesize_operation, OperationSpec};
pub use walker::SchemaWalker;
