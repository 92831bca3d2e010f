//! Response assembly shared by dispatch, the router and the serving loop.

use bytes::Bytes;
use grove_core::{Codec, HttpError};
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Response, StatusCode};
use http_body_util::Full;

/// Body type of every Grove response.
pub type ResponseBody = Full<Bytes>;

/// A complete Grove response.
pub type HttpResponse = Response<ResponseBody>;

const FALLBACK_ERROR_BODY: &str = r#"{"title":"Internal Server Error","status":500,"detail":"An unexpected error occurred"}"#;

/// Builds a response from its parts. `headers` are applied first, so the
/// content type always reflects `content_type`.
pub(crate) fn build(
    status: StatusCode,
    content_type: &str,
    body: Bytes,
    headers: HeaderMap,
) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    let response_headers = response.headers_mut();
    response_headers.extend(headers);
    match HeaderValue::from_str(content_type) {
        Ok(value) => {
            response_headers.insert(CONTENT_TYPE, value);
        }
        Err(_) => {
            tracing::warn!(content_type, "invalid content type, header omitted");
        }
    }
    response
}

/// Encodes `error` with `codec`.
///
/// If the error body itself cannot be encoded, a fixed JSON 500 is sent.
pub(crate) fn error_response(codec: &dyn Codec, error: &HttpError, headers: HeaderMap) -> HttpResponse {
    let encoded = serde_json::to_value(error.to_body())
        .map_err(|e| e.to_string())
        .and_then(|value| codec.encode(&value).map_err(|e| e.to_string()));

    match encoded {
        Ok(body) => build(error.status(), codec.content_type(), body, headers),
        Err(reason) => {
            tracing::error!(error = %reason, "cannot encode error body");
            build(
                StatusCode::INTERNAL_SERVER_ERROR,
                grove_core::JSON_CONTENT_TYPE,
                Bytes::from_static(FALLBACK_ERROR_BODY.as_bytes()),
                headers,
            )
        }
    }
}
