//! Error types for the sync engine.

use crate::flight::OperationKind;
use cardsync_protocol::{CardId, ProtocolError};
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
#[derive(Error, Debug)]
pub enum SyncError {
    /// A required field is empty. Rejected before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Network failure, injected fault, non-2xx status or malformed body.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// HTTP status, if the server answered.
        status: Option<u16>,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// A mutating operation is already outstanding for this card.
    #[error("card {id} already has a pending {pending} operation")]
    Conflict {
        /// Card ID.
        id: CardId,
        /// The operation that is still in flight.
        pending: OperationKind,
    },

    /// The card is not in the collection.
    #[error("card not found: {0}")]
    NotFound(CardId),

    /// The interaction state does not allow this action.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state.
        from: String,
        /// Attempted action or target state.
        to: String,
    },

    /// Codec error while building a request body.
    #[error("codec error: {0}")]
    Codec(String),

    /// A background sync task panicked or was aborted.
    #[error("sync task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: None,
            retryable: false,
        }
    }

    /// Creates a transport error for a non-2xx response.
    ///
    /// Server errors (5xx) are retryable, client errors are not.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status: Some(status),
            retryable: status >= 500,
        }
    }

    /// Returns true if this error can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Returns true for transport failures, the only errors that trigger rollback.
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport { .. })
    }

    /// Returns the HTTP status carried by a transport error.
    pub fn status(&self) -> Option<u16> {
        match self {
            SyncError::Transport { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<ProtocolError> for SyncError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::EmptyField { .. } => SyncError::Validation(err.to_string()),
            ProtocolError::InvalidId(_) => SyncError::Validation(err.to_string()),
            ProtocolError::Json(e) => SyncError::Codec(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::transport_retryable("connection lost").is_retryable());
        assert!(!SyncError::transport_fatal("bad json").is_retryable());
        assert!(SyncError::http_status(503, "unavailable").is_retryable());
        assert!(!SyncError::http_status(404, "not found").is_retryable());
        assert!(!SyncError::Validation("empty".into()).is_retryable());
    }

    #[test]
    fn status_is_exposed() {
        assert_eq!(SyncError::http_status(404, "gone").status(), Some(404));
        assert_eq!(SyncError::transport_retryable("x").status(), None);
        assert_eq!(SyncError::NotFound(CardId::new()).status(), None);
    }

    #[test]
    fn protocol_errors_map_to_validation() {
        let err: SyncError = ProtocolError::EmptyField { field: "answer" }.into();
        assert!(matches!(err, SyncError::Validation(ref m) if m.contains("answer")));
        assert!(!err.is_transport());
    }

    #[test]
    fn error_display() {
        let id = CardId::parse("card-0").unwrap();
        let err = SyncError::Conflict {
            id,
            pending: OperationKind::Update,
        };
        assert_eq!(
            err.to_string(),
            "card card-0 already has a pending update operation"
        );
    }
}
