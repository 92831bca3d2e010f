//! Pluggable wire encodings.
//!
//! A [`Codec`] converts between bytes and a [`serde_json::Value`]. Routes
//! compose it with `serde_json::{from_value, to_value}` to read and write
//! their typed inputs and outputs, which keeps the trait object-safe.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

/// Content type of [`JsonCodec`].
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Content type of [`YamlCodec`].
pub const YAML_CONTENT_TYPE: &str = "application/yaml";

/// Errors raised by codecs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A value could not be written.
    #[error("encode failed: {0}")]
    Encode(String),

    /// Bytes could not be read.
    #[error("decode failed: {0}")]
    Decode(String),
}

/// A wire encoding for request and response bodies.
pub trait Codec: Send + Sync + 'static {
    /// The content type written to responses.
    fn content_type(&self) -> &str;

    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when the value cannot be represented.
    fn encode(&self, value: &Value) -> Result<Bytes, CodecError>;

    /// Decodes bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] when the bytes are malformed.
    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError>;
}

/// JSON via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &str {
        JSON_CONTENT_TYPE
    }

    fn encode(&self, value: &Value) -> Result<Bytes, CodecError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// YAML via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn content_type(&self) -> &str {
        YAML_CONTENT_TYPE
    }

    fn encode(&self, value: &Value) -> Result<Bytes, CodecError> {
        serde_yaml::to_string(value)
            .map(Bytes::from)
            .map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, CodecError> {
        serde_yaml::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
    }
}

/// Codecs keyed by content type, with a default.
///
/// # Example
///
/// ```
/// use grove_core::{CodecRegistry, YamlCodec};
///
/// let registry = CodecRegistry::new().with_codec(YamlCodec);
///
/// assert_eq!(registry.resolve(Some("application/yaml")).content_type(), "application/yaml");
/// assert_eq!(registry.resolve(Some("text/csv")).content_type(), "application/json");
/// assert_eq!(registry.resolve(None).content_type(), "application/json");
/// ```
#[derive(Clone)]
pub struct CodecRegistry {
    codecs: IndexMap<String, Arc<dyn Codec>>,
    default_content_type: String,
}

impl CodecRegistry {
    /// Creates a registry holding only [`JsonCodec`], which is the default.
    #[must_use]
    pub fn new() -> Self {
        let mut codecs: IndexMap<String, Arc<dyn Codec>> = IndexMap::new();
        codecs.insert(JSON_CONTENT_TYPE.to_string(), Arc::new(JsonCodec));
        Self {
            codecs,
            default_content_type: JSON_CONTENT_TYPE.to_string(),
        }
    }

    /// Registers a codec under its own content type, replacing any previous one.
    #[must_use]
    pub fn with_codec(mut self, codec: impl Codec) -> Self {
        self.register(Arc::new(codec));
        self
    }

    /// Registers a shared codec.
    pub fn register(&mut self, codec: Arc<dyn Codec>) {
        self.codecs.insert(codec.content_type().to_string(), codec);
    }

    /// Sets the content type used when no preference matches.
    #[must_use]
    pub fn with_default(mut self, content_type: impl Into<String>) -> Self {
        self.default_content_type = content_type.into();
        self
    }

    /// The default content type.
    #[must_use]
    pub fn default_content_type(&self) -> &str {
        &self.default_content_type
    }

    /// Whether a codec is registered for `content_type`.
    #[must_use]
    pub fn contains(&self, content_type: &str) -> bool {
        self.codecs.contains_key(content_type)
    }

    /// Picks the preferred codec, then the default one, then JSON.
    #[must_use]
    pub fn resolve(&self, preferred: Option<&str>) -> Arc<dyn Codec> {
        preferred
            .and_then(|ct| self.codecs.get(ct))
            .or_else(|| self.codecs.get(&self.default_content_type))
            .map_or_else(|| Arc::new(JsonCodec) as Arc<dyn Codec>, Arc::clone)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("content_types", &self.codecs.keys().collect::<Vec<_>>())
            .field("default_content_type", &self.default_content_type)
            .finish()
    }
}
