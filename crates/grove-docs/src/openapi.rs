//! OpenAPI document types.
//!
//! The types follow the OpenAPI 3.1 specification:
//! <https://spec.openapis.org/oas/v3.1.0>
//!
//! Only the parts Grove produces are modelled. Every optional member is
//! skipped when empty, so serialized documents stay minimal.

use std::collections::HashMap;

use http::Method;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DocsResult;

/// Prefix of component references.
pub const COMPONENT_REF_PREFIX: &str = "#/components/schemas/";

/// OpenAPI document root object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenApi {
    /// OpenAPI version, `"3.1.0"`.
    pub openapi: String,
    /// API metadata.
    pub info: Info,
    /// Available servers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Path items keyed by route pattern.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,
    /// Reusable components.
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
    /// Tags for grouping operations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
}

impl Default for OpenApi {
    fn default() -> Self {
        Self {
            openapi: "3.1.0".to_string(),
            info: Info {
                title: "Openapi Schema".to_string(),
                version: "0.1.0".to_string(),
                description: None,
            },
            servers: Vec::new(),
            paths: IndexMap::new(),
            components: Components::default(),
            tags: Vec::new(),
        }
    }
}

impl OpenApi {
    /// Starts a builder from the default document.
    #[must_use]
    pub fn builder() -> OpenApiBuilder {
        OpenApiBuilder::default()
    }

    /// Puts `operation` into the slot for `method` under `pattern`.
    ///
    /// Returns `false`, leaving the document untouched, for verbs without a
    /// slot (including the any-verb `None`).
    pub fn add_operation(
        &mut self,
        method: Option<&Method>,
        pattern: &str,
        operation: Operation,
    ) -> bool {
        let Some(method) = method.filter(|m| PathItem::has_slot(m)) else {
            return false;
        };
        self.paths
            .entry(pattern.to_string())
            .or_default()
            .set_operation(method, operation)
    }

    /// Looks up the operation for `method` under `pattern`.
    #[must_use]
    pub fn operation(&self, method: &Method, pattern: &str) -> Option<&Operation> {
        self.paths.get(pattern)?.operation(method)
    }

    /// Serializes to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> DocsResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes to indented JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> DocsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serializes to YAML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> DocsResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Builder for the document metadata.
#[derive(Debug, Clone, Default)]
pub struct OpenApiBuilder {
    doc: OpenApi,
}

impl OpenApiBuilder {
    /// Sets the API title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.doc.info.title = title.into();
        self
    }

    /// Sets the API version.
    #[must_use]
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.doc.info.version = version.into();
        self
    }

    /// Sets the API description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.doc.info.description = Some(description.into());
        self
    }

    /// Adds a server.
    #[must_use]
    pub fn server(mut self, url: impl Into<String>, description: Option<String>) -> Self {
        self.doc.servers.push(Server {
            url: url.into(),
            description,
        });
        self
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, name: impl Into<String>, description: Option<String>) -> Self {
        self.doc.tags.push(Tag {
            name: name.into(),
            description,
        });
        self
    }

    /// Returns the document.
    #[must_use]
    pub fn build(self) -> OpenApi {
        self.doc
    }
}

/// API metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    pub title: String,
    /// API version.
    pub version: String,
    /// API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Server information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Server URL.
    pub url: String,
    /// Server description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// API tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name.
    pub name: String,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Operations available on one path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathItem {
    /// GET operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    /// PUT operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    /// POST operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    /// DELETE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    /// OPTIONS operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    /// HEAD operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    /// PATCH operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    /// TRACE operation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// Whether routes of this verb are published. OPTIONS and TRACE slots
    /// exist in the model but routes never fill them.
    #[must_use]
    pub fn has_slot(method: &Method) -> bool {
        [
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ]
        .contains(method)
    }

    fn slot_mut(&mut self, method: &Method) -> Option<&mut Option<Operation>> {
        match *method {
            Method::GET => Some(&mut self.get),
            Method::HEAD => Some(&mut self.head),
            Method::POST => Some(&mut self.post),
            Method::PUT => Some(&mut self.put),
            Method::PATCH => Some(&mut self.patch),
            Method::DELETE => Some(&mut self.delete),
            _ => None,
        }
    }

    /// Sets the operation for `method`. Returns `false` for unpublished verbs.
    pub fn set_operation(&mut self, method: &Method, operation: Operation) -> bool {
        match self.slot_mut(method) {
            Some(slot) => {
                *slot = Some(operation);
                true
            }
            None => false,
        }
    }

    /// Returns the operation for `method`.
    #[must_use]
    pub fn operation(&self, method: &Method) -> Option<&Operation> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::HEAD => self.head.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::PATCH => self.patch.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            Method::OPTIONS => self.options.as_ref(),
            Method::TRACE => self.trace.as_ref(),
            _ => None,
        }
    }
}

/// An API operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Unique operation identifier.
    #[serde(rename = "operationId")]
    pub operation_id: String,
    /// Short summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Full description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Tags for grouping.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Parameters.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "requestBody")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code or `"default"`.
    pub responses: IndexMap<String, Response>,
}

/// Parameter location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterIn {
    /// Query string parameter.
    Query,
    /// URL path parameter.
    Path,
    /// HTTP header.
    Header,
}

/// An operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    #[serde(rename = "in")]
    pub location: ParameterIn,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether required.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    /// Whether an empty value is accepted.
    #[serde(default, rename = "allowEmptyValue", skip_serializing_if = "std::ops::Not::not")]
    pub allow_empty_value: bool,
    /// Parameter schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether required.
    #[serde(default)]
    pub required: bool,
    /// Content by media type.
    pub content: IndexMap<String, MediaType>,
}

/// Media type content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Response definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Description (required by OpenAPI).
    pub description: String,
    /// Response content by media type.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub content: IndexMap<String, MediaType>,
}

/// Reusable components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    /// Named schemas, the deduplication table of the walker.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, Schema>,
    /// Type path owning each schema key.
    #[serde(skip)]
    pub(crate) origins: HashMap<String, String>,
}

impl PartialEq for Components {
    fn eq(&self, other: &Self) -> bool {
        self.schemas == other.schemas
    }
}

impl Components {
    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// JSON Schema type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// String type.
    String,
    /// Number type.
    Number,
    /// Integer type.
    Integer,
    /// Boolean type.
    Boolean,
    /// Array type.
    Array,
    /// Object type.
    Object,
}

/// The `additionalProperties` member: a flag or a value schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` accepts any value.
    Any(bool),
    /// Values must match the schema.
    Schema(Box<Schema>),
}

/// JSON Schema definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// Schema type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,
    /// Format hint (e.g. `int32`, `double`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Reference to a component.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "$ref")]
    pub reference: Option<String>,
    /// Object properties.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Map value schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "additionalProperties")]
    pub additional_properties: Option<AdditionalProperties>,
    /// Array item schema.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Minimum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "minItems")]
    pub min_items: Option<u64>,
    /// Maximum array length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "maxItems")]
    pub max_items: Option<u64>,
    /// Minimum value (for numbers).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
}

impl Schema {
    /// Create a string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::typed(SchemaType::String)
    }

    /// Create an integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::typed(SchemaType::Integer)
    }

    /// Create a number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::typed(SchemaType::Number)
    }

    /// Create a boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::typed(SchemaType::Boolean)
    }

    /// Create an array schema with the given item schema.
    #[must_use]
    pub fn array(items: Schema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::typed(SchemaType::Array)
        }
    }

    /// Create an object schema.
    #[must_use]
    pub fn object() -> Self {
        Self::typed(SchemaType::Object)
    }

    /// Create a map schema whose values match `values`.
    #[must_use]
    pub fn map(values: Schema) -> Self {
        Self {
            additional_properties: Some(AdditionalProperties::Schema(Box::new(values))),
            ..Self::object()
        }
    }

    /// Create an object schema accepting any members.
    #[must_use]
    pub fn any_object() -> Self {
        Self {
            additional_properties: Some(AdditionalProperties::Any(true)),
            ..Self::object()
        }
    }

    /// Create a reference to the component `name`.
    #[must_use]
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{COMPONENT_REF_PREFIX}{name}")),
            ..Default::default()
        }
    }

    /// The component name this schema refers to, if it is a reference.
    #[must_use]
    pub fn component_name(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.strip_prefix(COMPONENT_REF_PREFIX))
    }

    /// Set the format hint.
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Add a description.
    #[must_use]
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Add a property to an object schema.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        self.properties.insert(name.into(), schema);
        self
    }

    fn typed(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Default::default()
        }
    }
}
