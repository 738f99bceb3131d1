//! Error types for the card protocol.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur when building or decoding cards.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// The string is not a valid card ID.
    #[error("invalid card id: {0:?}")]
    InvalidId(String),

    /// A required field is empty after trimming.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },

    /// JSON encoding or decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ProtocolError::EmptyField { field: "question" };
        assert_eq!(err.to_string(), "question must not be empty");

        let err = ProtocolError::InvalidId("abc".into());
        assert!(err.to_string().contains("abc"));
    }
}
