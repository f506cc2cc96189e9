//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync and mutation operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The host bridge is not present. Not retryable.
    #[error("host bridge unavailable")]
    Unavailable,

    /// A remote call exceeded its per-call deadline.
    #[error("operation timed out")]
    Timeout,

    /// The transport failed with a raw error from the host bridge.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered but reported failure (`ok` was false).
    #[error("remote rejected: {0}")]
    Rejected(String),

    /// The reply could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The operation was cancelled by the user. Not retryable, and not
    /// reported as a failure.
    #[error("cancelled")]
    Cancelled,

    /// Local input failed validation. Never retried, never sent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A mutation was issued while a sync session was actively fetching.
    #[error("sync in progress, mutation refused")]
    Busy,
}

impl SyncError {
    /// Creates a rejection from an optional backend message.
    pub fn rejected(message: Option<String>) -> Self {
        Self::Rejected(message.unwrap_or_else(|| "request rejected".into()))
    }

    /// Returns true if this error can be retried.
    ///
    /// `Unavailable` and `Cancelled` re-fail immediately by contract;
    /// `Validation` and `Busy` are local conditions a retry cannot fix.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Timeout
            | SyncError::Transport(_)
            | SyncError::Rejected(_)
            | SyncError::Protocol(_) => true,
            SyncError::Unavailable
            | SyncError::Cancelled
            | SyncError::Validation(_)
            | SyncError::Busy => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(SyncError::Timeout.is_retryable());
        assert!(SyncError::Transport("connection reset".into()).is_retryable());
        assert!(SyncError::Rejected("table locked".into()).is_retryable());
        assert!(!SyncError::Unavailable.is_retryable());
        assert!(!SyncError::Cancelled.is_retryable());
        assert!(!SyncError::Validation("empty trigger".into()).is_retryable());
        assert!(!SyncError::Busy.is_retryable());
    }

    #[test]
    fn rejected_falls_back_to_generic_message() {
        assert_eq!(
            SyncError::rejected(None),
            SyncError::Rejected("request rejected".into())
        );
        assert_eq!(
            SyncError::rejected(Some("nope".into())),
            SyncError::Rejected("nope".into())
        );
    }

    #[test]
    fn error_display() {
        assert_eq!(SyncError::Unavailable.to_string(), "host bridge unavailable");
        assert_eq!(SyncError::Timeout.to_string(), "operation timed out");
        assert!(SyncError::Transport("fetch failed".into())
            .to_string()
            .contains("fetch failed"));
    }
}
