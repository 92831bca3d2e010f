//! Operation synthesis for a single route.

use grove_core::{HttpError, Shape, TypeDescriptor};
use heck::ToKebabCase;
use http::{Method, StatusCode};
use indexmap::IndexMap;

use crate::openapi::{Components, MediaType, Operation, RequestBody, Response, Schema};
use crate::walker::SchemaWalker;

/// Everything a route contributes to its operation.
#[derive(Debug, Clone)]
pub struct OperationSpec {
    /// Route verb, `None` for any verb.
    pub method: Option<Method>,
    /// Normalized route pattern.
    pub pattern: String,
    /// Success status.
    pub status: StatusCode,
    /// Content type of request and response bodies.
    pub content_type: String,
    /// Input shape.
    pub input: TypeDescriptor,
    /// Output shape.
    pub output: TypeDescriptor,
}

/// Derives the operation id from the verb and pattern.
///
/// Separators and capture braces become words, then the result is
/// kebab-cased.
///
/// ```
/// use grove_docs::operation_id;
/// use http::Method;
///
/// assert_eq!(operation_id(Some(&Method::GET), "/items/{id}"), "get-items-by-id");
/// assert_eq!(operation_id(Some(&Method::DELETE), "/files/{path...}"), "delete-files-by-path");
/// assert_eq!(operation_id(None, "/health"), "health");
/// ```
#[must_use]
pub fn operation_id(method: Option<&Method>, pattern: &str) -> String {
    let key = match method {
        Some(method) => format!("{method} {pattern}"),
        None => pattern.to_string(),
    };
    key.replace('/', " ")
        .replace('{', " by ")
        .replace('}', " ")
        .replace("...", "")
        .replace('*', "")
        .to_kebab_case()
        .to_lowercase()
}

/// Builds the operation for one route, registering walked records in
/// `components`.
///
/// - Location-tagged input fields become parameters.
/// - The request body is present only when the input has body properties.
/// - The success response is keyed by the route status; a `default`
///   response carries the [`HttpError`] shape.
pub fn synthesize_operation(spec: &OperationSpec, components: &mut Components) -> Operation {
    let id = operation_id(spec.method.as_ref(), &spec.pattern);
    let summary = id.replace('-', " ");
    let status_text = spec.status.canonical_reason().unwrap_or_default().to_string();

    let mut walker = SchemaWalker::new(components);
    let mut parameters = Vec::new();
    let input = walker.walk(&spec.input, &mut parameters);
    let output = walker.walk(&spec.output, &mut Vec::new());
    let error = walker.walk(&HttpError::describe(), &mut Vec::new());

    let request_body = input.map(|schema| RequestBody {
        description: Some(status_text.clone()),
        required: true,
        content: content(&spec.content_type, Some(schema)),
    });

    let mut responses = IndexMap::new();
    responses.insert(
        spec.status.as_u16().to_string(),
        Response {
            description: status_text,
            content: content(&spec.content_type, output),
        },
    );
    responses.insert(
        "default".to_string(),
        Response {
            description: "Error".to_string(),
            content: content(&spec.content_type, error),
        },
    );

    Operation {
        operation_id: id,
        summary: Some(summary.clone()),
        description: Some(summary),
        tags: Vec::new(),
        parameters,
        request_body,
        responses,
    }
}

fn content(content_type: &str, schema: Option<Schema>) -> IndexMap<String, MediaType> {
    let mut content = IndexMap::new();
    if schema.is_some() {
        content.insert(content_type.to_string(), MediaType { schema });
    }
    content
}
