//! Test response wrapper.

use bytes::Bytes;
use grove_server::HttpResponse;
use http::{header, HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;

use crate::error::TestError;

/// A fully read response.
#[derive(Debug, Clone)]
pub struct TestResponse {
    /// Response status.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Response body.
    pub body: Bytes,
}

impl TestResponse {
    /// Reads a router response to the end.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the body cannot be collected.
    pub async fn from_http(response: HttpResponse) -> Result<Self, TestError> {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();
        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// The status code as a number.
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// 2xx.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// 4xx.
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }

    /// 5xx.
    pub fn is_server_error(&self) -> bool {
        self.status.is_server_error()
    }

    /// Reads a header as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// The body as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::BodyRead`] if the body is not valid UTF-8.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body does not decode into `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decodes the body as an untyped JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`TestError::Json`] if the body is not JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics with the body in the message when the status differs.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {} with body {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts a header value.
    ///
    /// # Panics
    ///
    /// Panics if the header is missing or differs.
    pub fn assert_header(&self, name: &str, expected: &str) -> &Self {
        assert_eq!(self.header(name), Some(expected), "header {name}");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn response(status: StatusCode, body: &'static str) -> HttpResponse {
        let mut response = http::Response::new(Full::new(Bytes::from_static(body.as_bytes())));
        *response.status_mut() = status;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, "application/json".parse().unwrap());
        response
    }

    #[tokio::test]
    async fn test_from_http_and_accessors() {
        let res = TestResponse::from_http(response(StatusCode::CONFLICT, r#"{"status":409}"#))
            .await
            .unwrap();
        assert_eq!(res.status_code(), 409);
        assert!(res.is_client_error());
        assert!(!res.is_success());
        assert_eq!(res.content_type(), Some("application/json"));
        assert_eq!(res.json_value().unwrap()["status"], 409);
        res.assert_status(StatusCode::CONFLICT)
            .assert_header("content-type", "application/json");
    }

    #[tokio::test]
    async fn test_text_and_bad_json() {
        let res = TestResponse::from_http(response(StatusCode::OK, "plain"))
            .await
            .unwrap();
        assert_eq!(res.text().unwrap(), "plain");
        assert!(matches!(res.json_value(), Err(TestError::Json(_))));
    }

    #[tokio::test]
    #[should_panic(expected = "expected status 200 OK")]
    async fn test_assert_status_panics() {
        let res = TestResponse::from_http(response(StatusCode::GONE, "{}"))
            .await
            .unwrap();
        res.assert_status(StatusCode::OK);
    }
}
