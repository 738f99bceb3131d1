//! Error types for the card server.

use cardsync_protocol::CardId;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the card server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// No route or no card at this path.
    #[error("not found: {0}")]
    NotFound(String),

    /// A card with this ID already exists.
    #[error("duplicate id: {0}")]
    DuplicateId(CardId),

    /// Malformed request body.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The route exists but not for this method.
    #[error("method {method} not allowed on {path}")]
    MethodNotAllowed {
        /// Request method.
        method: String,
        /// Request path.
        path: String,
    },

    /// I/O error on the database file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The database file is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ServerError::NotFound(_) => 404,
            ServerError::DuplicateId(_) => 409,
            ServerError::InvalidRequest(_) => 400,
            ServerError::MethodNotAllowed { .. } => 405,
            ServerError::Io(_) | ServerError::Json(_) => 500,
        }
    }

    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert!(ServerError::InvalidRequest("bad".into()).is_client_error());
        assert!(ServerError::Io(std::io::Error::other("disk")).is_server_error());
        assert!(!ServerError::NotFound("/x".into()).is_server_error());
    }

    #[test]
    fn status_codes() {
        assert_eq!(ServerError::NotFound("/x".into()).status_code(), 404);
        assert_eq!(ServerError::DuplicateId(CardId::new()).status_code(), 409);
        let err = ServerError::MethodNotAllowed {
            method: "POST".into(),
            path: "/flash-cards/1".into(),
        };
        assert_eq!(err.status_code(), 405);
        assert_eq!(err.to_string(), "method POST not allowed on /flash-cards/1");
    }
}
