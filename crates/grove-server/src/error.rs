//! Serving loop errors.

use thiserror::Error;

/// Errors that stop [`Server::run`](crate::Server::run).
///
/// Per-request failures never surface here; they become structured error
/// responses.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The configured address is invalid or cannot be bound.
    #[error("failed to bind {addr}: {reason}")]
    Bind {
        /// The configured address.
        addr: String,
        /// Why binding failed.
        reason: String,
    },

    /// The listener failed while running.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_error_display() {
        let err = ServerError::Bind {
            addr: "0.0.0.0:80".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(err.to_string(), "failed to bind 0.0.0.0:80: permission denied");
    }

    #[test]
    fn test_io_error_from() {
        let err: ServerError = std::io::Error::other("listener closed").into();
        assert!(matches!(err, ServerError::Io(_)));
        assert_eq!(err.to_string(), "I/O error: listener closed");
    }
}
