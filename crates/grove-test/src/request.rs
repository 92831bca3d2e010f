//! Test request building.

use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method, Request, Uri};
use serde::Serialize;

use crate::error::TestError;

/// Builder for one in-memory request.
///
/// Invalid headers or bodies do not fail immediately; the first problem is
/// kept and reported by [`build`](Self::build).
#[must_use]
#[derive(Debug)]
pub struct TestRequestBuilder {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
    error: Option<TestError>,
}

impl TestRequestBuilder {
    /// Starts a request for `method` and `path`. The path may carry a query.
    pub fn new(method: Method, path: impl AsRef<str>) -> Self {
        Self {
            method,
            path: path.as_ref().to_string(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            error: None,
        }
    }

    fn fail(&mut self, error: TestError) {
        self.error.get_or_insert(error);
    }

    /// Sets a header, replacing previous values.
    pub fn header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        match (
            HeaderName::try_from(name.as_ref()),
            HeaderValue::try_from(value.as_ref()),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => self.fail(TestError::InvalidHeader(name.as_ref().to_string())),
        }
        self
    }

    /// Sets the `Content-Type` header.
    pub fn content_type(self, content_type: impl AsRef<str>) -> Self {
        self.header(header::CONTENT_TYPE.as_str(), content_type)
    }

    /// Sets the `Authorization` header to a bearer token.
    pub fn bearer_token(self, token: impl AsRef<str>) -> Self {
        self.header(
            header::AUTHORIZATION.as_str(),
            format!("Bearer {}", token.as_ref()),
        )
    }

    /// Appends a query parameter, percent-encoded.
    pub fn query(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.query
            .push((name.as_ref().to_string(), value.as_ref().to_string()));
        self
    }

    /// Sets the raw body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Serializes `value` as the JSON body and sets the content type.
    pub fn json<T: Serialize>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(err) => self.fail(TestError::Json(err)),
        }
        self.content_type("application/json")
    }

    fn uri(&self) -> Result<Uri, TestError> {
        let mut uri = self.path.clone();
        if !self.query.is_empty() {
            let query = self
                .query
                .iter()
                .map(|(name, value)| {
                    format!(
                        "{}={}",
                        urlencoding::encode(name),
                        urlencoding::encode(value)
                    )
                })
                .collect::<Vec<_>>()
                .join("&");
            uri.push(if uri.contains('?') { '&' } else { '?' });
            uri.push_str(&query);
        }
        uri.parse()
            .map_err(|e| TestError::RequestBuild(format!("invalid URI {uri}: {e}")))
    }

    /// Builds the request.
    ///
    /// # Errors
    ///
    /// Returns the first invalid header or body recorded, or an invalid URI.
    pub fn build(self) -> Result<Request<Bytes>, TestError> {
        let uri = self.uri()?;
        if let Some(err) = self.error {
            return Err(err);
        }

        let mut request = Request::new(self.body);
        *request.method_mut() = self.method;
        *request.uri_mut() = uri;
        *request.headers_mut() = self.headers;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_is_encoded() {
        let request = TestRequestBuilder::new(Method::GET, "/search")
            .query("q", "red lamp")
            .query("tag", "a&b")
            .build()
            .unwrap();
        assert_eq!(request.uri().query(), Some("q=red%20lamp&tag=a%26b"));
    }

    #[test]
    fn test_query_appends_to_existing() {
        let request = TestRequestBuilder::new(Method::GET, "/search?page=2")
            .query("q", "x")
            .build()
            .unwrap();
        assert_eq!(request.uri().query(), Some("page=2&q=x"));
    }

    #[test]
    fn test_json_sets_content_type() {
        let request = TestRequestBuilder::new(Method::POST, "/items")
            .json(&serde_json::json!({"name": "lamp"}))
            .build()
            .unwrap();
        assert_eq!(request.headers()["content-type"], "application/json");
        assert_eq!(request.body(), &Bytes::from_static(br#"{"name":"lamp"}"#));
    }

    #[test]
    fn test_invalid_header_reported_on_build() {
        let err = TestRequestBuilder::new(Method::GET, "/")
            .header("bad header", "x")
            .build()
            .unwrap_err();
        assert!(matches!(err, TestError::InvalidHeader(_)));
    }

    #[test]
    fn test_invalid_uri() {
        let err = TestRequestBuilder::new(Method::GET, "/a b").build().unwrap_err();
        assert!(matches!(err, TestError::RequestBuild(_)));
    }
}
