//! Generic retry with exponential backoff.

use crate::config::RetryConfig;
use crate::error::{SyncError, SyncResult};
use std::future::Future;

/// Runs `operation` with sequential retries and exponential backoff.
///
/// The first failure waits `initial_delay`, the next twice that, and so
/// on. Errors for which [`SyncError::is_retryable`] is false re-fail
/// immediately with no delay, regardless of attempts remaining. Attempts
/// are strictly sequential, never parallel.
pub async fn with_retry<T, F, Fut>(retry: &RetryConfig, mut operation: F) -> SyncResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = SyncResult<T>>,
{
    let attempts = retry.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = retry.delay_for_retry(attempt - 1);
            tracing::debug!(attempt, ?delay, "retrying after backoff");
            tokio::time::sleep(delay).await;
        }

        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if !error.is_retryable() {
                    return Err(error);
                }
                tracing::debug!(attempt, %error, "attempt failed");
                last_error = Some(error);
            }
        }
    }

    Err(last_error.unwrap_or(SyncError::Protocol("no attempts made".into())))
}
