//! # Grove Core
//!
//! Building blocks shared by every Grove crate:
//!
//! - [`HttpError`] and [`ErrorKind`] - the structured error payload and its named kinds
//! - [`normalize_error`] - the default error pipeline
//! - [`Codec`] and [`CodecRegistry`] - pluggable wire encodings
//! - [`Shape`] and [`TypeDescriptor`] - declarative descriptions of input and output types
//! - [`default_status`] - the verb-derived success status

#![doc(html_root_url = "https://docs.rs/grove-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod codec;
mod error;
pub mod shape;
mod status;

use std::future::Future;
use std::pin::Pin;

pub use codec::{
    Codec, CodecError, CodecRegistry, JsonCodec, YamlCodec, JSON_CONTENT_TYPE, YAML_CONTENT_TYPE,
};
pub use error::{
    normalize_error, recover_panic, ChainStopped, DecodeError, ErrorBody, ErrorItem, ErrorKind,
    ErrorProcessor, HttpError, PanicRecovered, UNEXPECTED_ERROR_DETAIL,
};
pub use shape::{
    canonical_name, FieldDescriptor, ParamLocation, Raw, RecordDescriptor, Shape, TypeDescriptor,
};
pub use status::{default_status, StatusFn};

/// A boxed, sendable future borrowing from `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
