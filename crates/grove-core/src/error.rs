//! Structured errors and the default error pipeline.
//!
//! Every failure that reaches a client is rendered as an [`HttpError`]:
//! handler errors, middleware errors, body decode failures and recovered
//! panics all pass through one [`ErrorProcessor`], by default
//! [`normalize_error`].
//!
//! Handlers and middleware return `anyhow::Result`, so any error type can be
//! propagated with `?`. The pipeline downcasts to recover the structured
//! kinds, reports body decode failures with the decoder's message, and hides
//! everything else behind [`UNEXPECTED_ERROR_DETAIL`].

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shape::{FieldDescriptor, RecordDescriptor, Shape, TypeDescriptor};

/// Detail sent to clients for failures that are not already structured.
pub const UNEXPECTED_ERROR_DETAIL: &str = "An unexpected error occurred";

/// Converts any failure into the structured payload written to the client.
pub type ErrorProcessor = Arc<dyn Fn(anyhow::Error) -> HttpError + Send + Sync>;

/// Named error kinds, each bound to one fixed status code.
///
/// `Generic` carries an explicit status and falls back to 500 when unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 400
    BadRequest,
    /// 401
    Unauthorized,
    /// 402
    PaymentRequired,
    /// 403
    Forbidden,
    /// 404
    NotFound,
    /// 405
    MethodNotAllowed,
    /// 406
    NotAcceptable,
    /// 407
    ProxyAuthRequired,
    /// 408
    RequestTimeout,
    /// 409
    Conflict,
    /// 410
    Gone,
    /// 411
    LengthRequired,
    /// 412
    PreconditionFailed,
    /// 413
    PayloadTooLarge,
    /// 414
    UriTooLong,
    /// 415
    UnsupportedMediaType,
    /// 416
    RangeNotSatisfiable,
    /// 417
    ExpectationFailed,
    /// 418
    Teapot,
    /// 421
    MisdirectedRequest,
    /// 422
    UnprocessableEntity,
    /// 423
    Locked,
    /// 424
    FailedDependency,
    /// 425
    TooEarly,
    /// 426
    UpgradeRequired,
    /// 428
    PreconditionRequired,
    /// 429
    TooManyRequests,
    /// 431
    RequestHeaderFieldsTooLarge,
    /// 451
    UnavailableForLegalReasons,
    /// Any other status; `None` means 500.
    Generic(Option<StatusCode>),
}

const NAMED_KINDS: [ErrorKind; 29] = [
    ErrorKind::BadRequest,
    ErrorKind::Unauthorized,
    ErrorKind::PaymentRequired,
    ErrorKind::Forbidden,
    ErrorKind::NotFound,
    ErrorKind::MethodNotAllowed,
    ErrorKind::NotAcceptable,
    ErrorKind::ProxyAuthRequired,
    ErrorKind::RequestTimeout,
    ErrorKind::Conflict,
    ErrorKind::Gone,
    ErrorKind::LengthRequired,
    ErrorKind::PreconditionFailed,
    ErrorKind::PayloadTooLarge,
    ErrorKind::UriTooLong,
    ErrorKind::UnsupportedMediaType,
    ErrorKind::RangeNotSatisfiable,
    ErrorKind::ExpectationFailed,
    ErrorKind::Teapot,
    ErrorKind::MisdirectedRequest,
    ErrorKind::UnprocessableEntity,
    ErrorKind::Locked,
    ErrorKind::FailedDependency,
    ErrorKind::TooEarly,
    ErrorKind::UpgradeRequired,
    ErrorKind::PreconditionRequired,
    ErrorKind::TooManyRequests,
    ErrorKind::RequestHeaderFieldsTooLarge,
    ErrorKind::UnavailableForLegalReasons,
];

impl ErrorKind {
    /// Returns the status code bound to this kind.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PaymentRequired => StatusCode::PAYMENT_REQUIRED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            Self::ProxyAuthRequired => StatusCode::PROXY_AUTHENTICATION_REQUIRED,
            Self::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Gone => StatusCode::GONE,
            Self::LengthRequired => StatusCode::LENGTH_REQUIRED,
            Self::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::UriTooLong => StatusCode::URI_TOO_LONG,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::RangeNotSatisfiable => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::ExpectationFailed => StatusCode::EXPECTATION_FAILED,
            Self::Teapot => StatusCode::IM_A_TEAPOT,
            Self::MisdirectedRequest => StatusCode::MISDIRECTED_REQUEST,
            Self::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Locked => StatusCode::LOCKED,
            Self::FailedDependency => StatusCode::FAILED_DEPENDENCY,
            Self::TooEarly => StatusCode::from_u16(425).unwrap_or(StatusCode::BAD_REQUEST),
            Self::UpgradeRequired => StatusCode::UPGRADE_REQUIRED,
            Self::PreconditionRequired => StatusCode::PRECONDITION_REQUIRED,
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            Self::RequestHeaderFieldsTooLarge => StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
            Self::UnavailableForLegalReasons => StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
            Self::Generic(status) => status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        }
    }

    /// Picks the named kind for `status`, or a generic kind carrying it.
    #[must_use]
    pub fn from_status(status: StatusCode) -> Self {
        NAMED_KINDS
            .into_iter()
            .find(|kind| kind.status() == status)
            .unwrap_or(Self::Generic(Some(status)))
    }
}

/// One entry in the `errors` list of an [`HttpError`], usually a field failure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorItem {
    /// What the item refers to, e.g. a field name.
    pub name: String,
    /// Why it failed.
    pub reason: String,
    /// Free-form extra data.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub metadata: IndexMap<String, serde_json::Value>,
}

impl ErrorItem {
    /// Creates an item without metadata.
    #[must_use]
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
            metadata: IndexMap::new(),
        }
    }

    /// Adds a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// The structured error written to clients.
///
/// The wrapped cause is kept for logging and is never serialized.
///
/// # Example
///
/// ```
/// use grove_core::{ErrorItem, HttpError};
/// use http::StatusCode;
///
/// let err = HttpError::conflict("item already exists")
///     .with_item(ErrorItem::new("name", "must be unique"));
///
/// assert_eq!(err.status(), StatusCode::CONFLICT);
/// assert_eq!(err.to_string(), "Conflict (409): item already exists");
/// ```
#[derive(Debug, Error)]
#[error("{}", render_message(.kind, .title, .detail))]
pub struct HttpError {
    kind: ErrorKind,
    title: Option<String>,
    detail: String,
    errors: Vec<ErrorItem>,
    #[source]
    source: Option<anyhow::Error>,
}

fn render_message(kind: &ErrorKind, title: &Option<String>, detail: &str) -> String {
    let status = kind.status();
    let title = title
        .as_deref()
        .or_else(|| status.canonical_reason())
        .unwrap_or("HTTP Error");
    format!("{title} ({}): {detail}", status.as_u16())
}

macro_rules! kind_constructors {
    ($($(#[$doc:meta])* $name:ident => $kind:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[must_use]
            pub fn $name(detail: impl Into<String>) -> Self {
                Self::new(ErrorKind::$kind).with_detail(detail)
            }
        )*
    };
}

impl HttpError {
    /// Creates an error of the given kind with no title or detail.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            title: None,
            detail: String::new(),
            errors: Vec::new(),
            source: None,
        }
    }

    /// Creates an error for an arbitrary status code.
    #[must_use]
    pub fn with_status(status: StatusCode) -> Self {
        Self::new(ErrorKind::from_status(status))
    }

    /// Creates a generic 500 wrapping `source`, with the non-leaking detail.
    pub fn internal(source: impl Into<anyhow::Error>) -> Self {
        Self::new(ErrorKind::Generic(None))
            .with_detail(UNEXPECTED_ERROR_DETAIL)
            .with_source(source)
    }

    kind_constructors! {
        /// 400 Bad Request.
        bad_request => BadRequest,
        /// 401 Unauthorized.
        unauthorized => Unauthorized,
        /// 402 Payment Required.
        payment_required => PaymentRequired,
        /// 403 Forbidden.
        forbidden => Forbidden,
        /// 404 Not Found.
        not_found => NotFound,
        /// 405 Method Not Allowed.
        method_not_allowed => MethodNotAllowed,
        /// 406 Not Acceptable.
        not_acceptable => NotAcceptable,
        /// 407 Proxy Authentication Required.
        proxy_auth_required => ProxyAuthRequired,
        /// 408 Request Timeout.
        request_timeout => RequestTimeout,
        /// 409 Conflict.
        conflict => Conflict,
        /// 410 Gone.
        gone => Gone,
        /// 411 Length Required.
        length_required => LengthRequired,
        /// 412 Precondition Failed.
        precondition_failed => PreconditionFailed,
        /// 413 Payload Too Large.
        payload_too_large => PayloadTooLarge,
        /// 414 URI Too Long.
        uri_too_long => UriTooLong,
        /// 415 Unsupported Media Type.
        unsupported_media_type => UnsupportedMediaType,
        /// 416 Range Not Satisfiable.
        range_not_satisfiable => RangeNotSatisfiable,
        /// 417 Expectation Failed.
        expectation_failed => ExpectationFailed,
        /// 418 I'm a teapot.
        teapot => Teapot,
        /// 421 Misdirected Request.
        misdirected_request => MisdirectedRequest,
        /// 422 Unprocessable Entity.
        unprocessable_entity => UnprocessableEntity,
        /// 423 Locked.
        locked => Locked,
        /// 424 Failed Dependency.
        failed_dependency => FailedDependency,
        /// 425 Too Early.
        too_early => TooEarly,
        /// 426 Upgrade Required.
        upgrade_required => UpgradeRequired,
        /// 428 Precondition Required.
        precondition_required => PreconditionRequired,
        /// 429 Too Many Requests.
        too_many_requests => TooManyRequests,
        /// 431 Request Header Fields Too Large.
        request_header_fields_too_large => RequestHeaderFieldsTooLarge,
        /// 451 Unavailable For Legal Reasons.
        unavailable_for_legal_reasons => UnavailableForLegalReasons,
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the human-readable detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    /// Appends a sub-error.
    #[must_use]
    pub fn with_item(mut self, item: ErrorItem) -> Self {
        self.errors.push(item);
        self
    }

    /// Attaches the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the status code derived from the kind.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Returns the title, if one is set.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Returns the detail.
    #[must_use]
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// Returns the sub-errors.
    #[must_use]
    pub fn errors(&self) -> &[ErrorItem] {
        &self.errors
    }

    /// Returns the wrapped cause.
    #[must_use]
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    /// Returns the serializable payload.
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            title: self.title.clone().unwrap_or_default(),
            status: self.status().as_u16(),
            detail: self.detail.clone(),
            errors: self.errors.clone(),
        }
    }

    fn fill_title(&mut self) {
        if self.title.as_deref().map_or(true, str::is_empty) {
            self.title = self.status().canonical_reason().map(ToString::to_string);
        }
    }
}

impl Serialize for HttpError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_body().serialize(serializer)
    }
}

/// Wire form of an [`HttpError`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Short summary, the standard status text unless overridden.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Numeric status code.
    pub status: u16,
    /// Human-readable explanation.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
    /// Sub-errors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorItem>,
}

impl Shape for ErrorItem {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Record(
            RecordDescriptor::new("ErrorItem")
                .field(FieldDescriptor::new("name", String::describe))
                .field(FieldDescriptor::new("reason", String::describe))
                .field(FieldDescriptor::new(
                    "metadata",
                    IndexMap::<String, serde_json::Value>::describe,
                )),
        )
    }
}

impl Shape for ErrorBody {
    fn describe() -> TypeDescriptor {
        TypeDescriptor::Record(
            RecordDescriptor::new("HttpError")
                .field(FieldDescriptor::new("title", String::describe))
                .field(FieldDescriptor::new("status", u16::describe))
                .field(FieldDescriptor::new("detail", String::describe))
                .field(FieldDescriptor::new("errors", Vec::<ErrorItem>::describe)),
        )
    }
}

impl Shape for HttpError {
    fn describe() -> TypeDescriptor {
        ErrorBody::describe()
    }
}

/// The request payload could not be decoded into the route's input type.
#[derive(Debug, Error)]
#[error("could not read incoming request: {reason}")]
pub struct DecodeError {
    reason: String,
}

impl DecodeError {
    /// Creates a decode error from the codec's explanation.
    #[must_use]
    pub fn new(reason: impl fmt::Display) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }

    /// Always 400.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

/// A panic with a non-error payload, caught at the dispatch boundary.
#[derive(Debug, Error)]
#[error("panic recovered: {message}")]
pub struct PanicRecovered {
    message: String,
}

impl PanicRecovered {
    /// Returns the panic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A middleware returned without error, without calling `next()` and without
/// writing a response.
#[derive(Debug, Error)]
#[error("middleware `{middleware}` stopped the chain without a response")]
pub struct ChainStopped {
    /// Name of the middleware.
    pub middleware: String,
}

/// The default [`ErrorProcessor`].
///
/// - An [`HttpError`] passes through, with a missing title filled from the
///   standard status text.
/// - A [`DecodeError`] becomes a 400 whose detail is the decode message.
/// - [`PanicRecovered`] and [`ChainStopped`] become a generic 500.
/// - Anything else becomes a generic 500.
///
/// Other non-structured errors get [`UNEXPECTED_ERROR_DETAIL`] as detail.
/// Every wrapped error is kept as the cause.
///
/// # Example
///
/// ```
/// use grove_core::{normalize_error, HttpError, UNEXPECTED_ERROR_DETAIL};
/// use http::StatusCode;
///
/// let err = normalize_error(anyhow::anyhow!("db pool exhausted"));
/// assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(err.detail(), UNEXPECTED_ERROR_DETAIL);
/// assert_eq!(err.title(), Some("Internal Server Error"));
///
/// let err = normalize_error(HttpError::not_found("no such item").into());
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// assert_eq!(err.detail(), "no such item");
/// ```
pub fn normalize_error(err: anyhow::Error) -> HttpError {
    let mut normalized = match err.downcast::<HttpError>() {
        Ok(structured) => structured,
        Err(other) => {
            if let Some(decode) = other.downcast_ref::<DecodeError>() {
                let detail = decode.to_string();
                let mut wrapped = HttpError::bad_request(detail).with_source(other);
                wrapped.fill_title();
                return wrapped;
            }
            let status = declared_status(&other);
            let mut wrapped = HttpError::internal(other);
            if let Some(status) = status {
                wrapped.kind = ErrorKind::Generic(Some(status));
            }
            wrapped
        }
    };
    normalized.fill_title();
    normalized
}

fn declared_status(err: &anyhow::Error) -> Option<StatusCode> {
    if err.is::<PanicRecovered>() || err.is::<ChainStopped>() {
        return Some(StatusCode::INTERNAL_SERVER_ERROR);
    }
    None
}

/// Turns a caught panic payload back into an error.
///
/// Payloads raised with [`std::panic::panic_any`] as an [`HttpError`] or a
/// [`DecodeError`] are restored as-is; string payloads become
/// [`PanicRecovered`].
pub fn recover_panic(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let payload = match payload.downcast::<HttpError>() {
        Ok(err) => return anyhow::Error::new(*err),
        Err(payload) => payload,
    };
    let payload = match payload.downcast::<DecodeError>() {
        Ok(err) => return anyhow::Error::new(*err),
        Err(payload) => payload,
    };

    let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<non-string payload>".to_string()
    };
    anyhow::Error::new(PanicRecovered { message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_kinds_have_fixed_statuses() {
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::TooManyRequests.status().as_u16(), 429);
        assert_eq!(ErrorKind::TooEarly.status().as_u16(), 425);
        assert_eq!(ErrorKind::UnavailableForLegalReasons.status().as_u16(), 451);

        for kind in NAMED_KINDS {
            assert!(kind.status().is_client_error(), "{kind:?}");
        }
    }

    #[test]
    fn test_generic_kind_defaults_to_500() {
        assert_eq!(
            ErrorKind::Generic(None).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ErrorKind::Generic(Some(StatusCode::BAD_GATEWAY)).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_from_status_prefers_named_kind() {
        assert_eq!(ErrorKind::from_status(StatusCode::GONE), ErrorKind::Gone);
        assert_eq!(
            ErrorKind::from_status(StatusCode::SERVICE_UNAVAILABLE),
            ErrorKind::Generic(Some(StatusCode::SERVICE_UNAVAILABLE))
        );
    }

    #[test]
    fn test_display_falls_back_to_status_text() {
        let err = HttpError::not_found("missing");
        assert_eq!(err.to_string(), "Not Found (404): missing");

        let err = HttpError::not_found("missing").with_title("Gone Fishing");
        assert_eq!(err.to_string(), "Gone Fishing (404): missing");
    }

    #[test]
    fn test_body_serialization_omits_empty_fields() {
        let json = serde_json::to_value(HttpError::conflict("")).unwrap();
        assert_eq!(json, serde_json::json!({ "status": 409 }));

        let err = HttpError::unprocessable_entity("invalid payload")
            .with_title("Validation Failed")
            .with_item(ErrorItem::new("name", "too short").with_metadata("min", 3));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["title"], "Validation Failed");
        assert_eq!(json["status"], 422);
        assert_eq!(json["errors"][0]["metadata"]["min"], 3);
    }

    #[test]
    fn test_source_is_never_serialized() {
        let err = HttpError::internal(std::io::Error::other("secret path /etc/x"));
        let json = serde_json::to_string(&err).unwrap();
        assert!(!json.contains("secret"));
        assert!(err.cause().is_some());
    }

    #[test]
    fn test_normalize_passes_structured_errors_through() {
        let err = normalize_error(HttpError::conflict("duplicate").into());
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.title(), Some("Conflict"));
        assert_eq!(err.detail(), "duplicate");
    }

    #[test]
    fn test_normalize_hides_foreign_errors() {
        let err = normalize_error(anyhow::anyhow!("connection refused to 10.0.0.3"));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), UNEXPECTED_ERROR_DETAIL);
        assert_eq!(err.title(), Some("Internal Server Error"));
        assert!(err.cause().unwrap().to_string().contains("10.0.0.3"));
    }

    #[test]
    fn test_normalize_adopts_declared_status() {
        let err = normalize_error(DecodeError::new("expected `,` at line 1").into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.title(), Some("Bad Request"));
        assert_eq!(
            err.detail(),
            "could not read incoming request: expected `,` at line 1"
        );
        assert!(err.cause().unwrap().is::<DecodeError>());

        let err = normalize_error(ChainStopped { middleware: "auth".into() }.into());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.detail(), UNEXPECTED_ERROR_DETAIL);
    }

    #[test]
    fn test_every_named_kind_has_a_constructor() {
        let built = [
            HttpError::bad_request(""),
            HttpError::unauthorized(""),
            HttpError::payment_required(""),
            HttpError::forbidden(""),
            HttpError::not_found(""),
            HttpError::method_not_allowed(""),
            HttpError::not_acceptable(""),
            HttpError::proxy_auth_required(""),
            HttpError::request_timeout(""),
            HttpError::conflict(""),
            HttpError::gone(""),
            HttpError::length_required(""),
            HttpError::precondition_failed(""),
            HttpError::payload_too_large(""),
            HttpError::uri_too_long(""),
            HttpError::unsupported_media_type(""),
            HttpError::range_not_satisfiable(""),
            HttpError::expectation_failed(""),
            HttpError::teapot(""),
            HttpError::misdirected_request(""),
            HttpError::unprocessable_entity(""),
            HttpError::locked(""),
            HttpError::failed_dependency(""),
            HttpError::too_early(""),
            HttpError::upgrade_required(""),
            HttpError::precondition_required(""),
            HttpError::too_many_requests(""),
            HttpError::request_header_fields_too_large(""),
            HttpError::unavailable_for_legal_reasons(""),
        ];
        let kinds: Vec<_> = built.iter().map(HttpError::kind).collect();
        assert_eq!(kinds, NAMED_KINDS.to_vec());
    }

    #[test]
    fn test_recover_string_panic() {
        let err = recover_panic(Box::new("boom"));
        assert_eq!(err.to_string(), "panic recovered: boom");

        let err = recover_panic(Box::new(String::from("kaboom")));
        assert_eq!(err.to_string(), "panic recovered: kaboom");

        let err = recover_panic(Box::new(17_u32));
        assert_eq!(err.to_string(), "panic recovered: <non-string payload>");
    }

    #[test]
    fn test_recover_structured_panic() {
        let err = recover_panic(Box::new(HttpError::forbidden("nope")));
        let normalized = normalize_error(err);
        assert_eq!(normalized.status(), StatusCode::FORBIDDEN);

        let err = recover_panic(Box::new(DecodeError::new("bad json")));
        assert_eq!(normalize_error(err).status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_error_body_shape_is_a_record() {
        match HttpError::describe() {
            TypeDescriptor::Record(record) => {
                assert_eq!(record.name, "HttpError");
                let names: Vec<_> = record.fields.iter().map(|f| f.ident).collect();
                assert_eq!(names, vec!["title", "status", "detail", "errors"]);
            }
            other => panic!("unexpected descriptor {other:?}"),
        }
    }
}
