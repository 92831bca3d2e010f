use std::sync::Arc;

use http::{Method, StatusCode};

/// Maps a route verb (`None` for any verb) to its success status.
pub type StatusFn = Arc<dyn Fn(Option<&Method>) -> StatusCode + Send + Sync>;

/// The verb-derived success status: POST is 201, PUT, PATCH and DELETE are
/// 202, everything else is 200.
#[must_use]
pub fn default_status(method: Option<&Method>) -> StatusCode {
    match method {
        Some(m) if *m == Method::POST => StatusCode::CREATED,
        Some(m) if *m == Method::PUT || *m == Method::PATCH || *m == Method::DELETE => {
            StatusCode::ACCEPTED
        }
        _ => StatusCode::OK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_by_verb() {
        assert_eq!(default_status(Some(&Method::GET)), StatusCode::OK);
        assert_eq!(default_status(Some(&Method::HEAD)), StatusCode::OK);
        assert_eq!(default_status(Some(&Method::POST)), StatusCode::CREATED);
        assert_eq!(default_status(Some(&Method::PUT)), StatusCode::ACCEPTED);
        assert_eq!(default_status(Some(&Method::PATCH)), StatusCode::ACCEPTED);
        assert_eq!(default_status(Some(&Method::DELETE)), StatusCode::ACCEPTED);
        assert_eq!(default_status(None), StatusCode::OK);
    }
}
