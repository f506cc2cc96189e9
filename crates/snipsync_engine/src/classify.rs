//! Error classification for user-facing display.

use crate::error::SyncError;

/// A raw failure mapped to a fixed taxonomy entry with user-facing text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    /// Short title, suitable for a notification heading.
    pub title: String,
    /// Longer description with remediation hints.
    pub description: String,
}

impl ClassifiedError {
    fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Maps an error to its user-facing classification.
///
/// Pure function. Transport messages are matched by substring against an
/// ordered list; the order matters because raw messages may contain
/// overlapping substrings, and the first match wins.
pub fn classify(error: &SyncError) -> ClassifiedError {
    match error {
        SyncError::Timeout => ClassifiedError::new(
            "Connection Timeout",
            "The backend did not answer in time. Check the connection and retry.",
        ),
        SyncError::Unavailable => ClassifiedError::new(
            "Environment Error",
            "The host bridge is not available. Restart the application.",
        ),
        SyncError::Cancelled => {
            ClassifiedError::new("Cancelled", "The operation was cancelled.")
        }
        SyncError::Transport(message) => classify_transport(message),
        SyncError::Validation(message) => {
            ClassifiedError::new("Invalid Input", message.clone())
        }
        SyncError::Busy => ClassifiedError::new(
            "Sync In Progress",
            "A synchronization run is active. Wait for it to finish and retry.",
        ),
        SyncError::Rejected(message) | SyncError::Protocol(message) => {
            ClassifiedError::new("Sync Error", message.clone())
        }
    }
}

/// Classifies a raw transport message by ordered substring match.
fn classify_transport(message: &str) -> ClassifiedError {
    let lower = message.to_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        return ClassifiedError::new(
            "Connection Timeout",
            "The backend did not answer in time. Check the connection and retry.",
        );
    }
    if lower.contains("network") || lower.contains("fetch") || lower.contains("connection") {
        return ClassifiedError::new(
            "Network Failure",
            "The backend could not be reached. Check the connection and retry.",
        );
    }
    if lower.contains("bridge") || lower.contains("unavailable") {
        return ClassifiedError::new(
            "Environment Error",
            "The host bridge is not available. Restart the application.",
        );
    }
    ClassifiedError::new("Sync Error", message.to_string())
}
