//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for sync and mutation operations.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Hard deadline applied to every remote call.
    pub call_timeout: Duration,
    /// Batch width for steady-state fetches. Independent of the size of
    /// the first page, which the backend chooses when the snapshot opens.
    pub batch_size: u32,
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Field length limits applied before any mutation is sent.
    pub limits: SnippetLimits,
    /// Per-operation rollback behavior.
    pub rollback: RollbackPolicy,
}

impl SyncConfig {
    /// Creates a configuration with defaults.
    pub fn new() -> Self {
        Self {
            call_timeout: Duration::from_secs(60),
            batch_size: 500,
            retry: RetryConfig::default(),
            limits: SnippetLimits::default(),
            rollback: RollbackPolicy::default(),
        }
    }

    /// Sets the per-call timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Sets the steady-state batch width.
    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the field length limits.
    pub fn with_limits(mut self, limits: SnippetLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Sets the rollback policy.
    pub fn with_rollback(mut self, rollback: RollbackPolicy) -> Self {
        self.rollback = rollback;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for retry behavior.
///
/// The delay sequence is unconditional exponential doubling with no
/// jitter: `initial_delay, 2x, 4x, ...`. An optional ceiling clamps each
/// delay but never alters the doubling law below it.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (first call included).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Optional ceiling on any single delay.
    pub max_delay: Option<Duration>,
}

impl RetryConfig {
    /// Creates a retry configuration with the given attempt count.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_secs(1),
            max_delay: None,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: None,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets a ceiling on any single delay.
    pub fn with_max_delay(mut self, ceiling: Duration) -> Self {
        self.max_delay = Some(ceiling);
        self
    }

    /// The delay before retry number `retry` (0-indexed): doubles each
    /// time, clamped to the ceiling when one is set.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        let doubled = self
            .initial_delay
            .saturating_mul(2u32.saturating_pow(retry));
        match self.max_delay {
            Some(ceiling) => doubled.min(ceiling),
            None => doubled,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Field length limits for snippet validation.
///
/// These bounds are configuration, not hardcoded policy; the defaults
/// match what the reference backend accepts.
#[derive(Debug, Clone)]
pub struct SnippetLimits {
    /// Maximum trigger length.
    pub trigger: usize,
    /// Maximum expansion length.
    pub expansion: usize,
    /// Maximum tags length.
    pub tags: usize,
    /// Maximum description length.
    pub description: usize,
    /// Maximum application name length.
    pub application: usize,
    /// Maximum language label length, for backends that accept a raw
    /// free-text label. Local snippets carry a normalized language enum
    /// whose wire form is always well under this bound, so nothing
    /// checks it client-side; it is kept so the full backend limit set
    /// lives in one place.
    pub language: usize,
}

impl Default for SnippetLimits {
    fn default() -> Self {
        Self {
            trigger: 80,
            expansion: 50_000,
            tags: 512,
            description: 2_000,
            application: 128,
            language: 64,
        }
    }
}

/// Per-operation rollback behavior for optimistic mutations.
///
/// Favorite toggles default to fire-and-forget: favorite state is
/// low-stakes and eventually consistent, so a remote failure is logged
/// without reverting the local flip. Upserts and deletes always roll back
/// by default.
#[derive(Debug, Clone)]
pub struct RollbackPolicy {
    /// Roll back a rejected upsert.
    pub upsert: bool,
    /// Roll back a rejected delete.
    pub delete: bool,
    /// Roll back a rejected favorite toggle.
    pub favorite: bool,
}

impl Default for RollbackPolicy {
    fn default() -> Self {
        Self {
            upsert: true,
            delete: true,
            favorite: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = SyncConfig::new()
            .with_call_timeout(Duration::from_secs(30))
            .with_batch_size(250)
            .with_retry(RetryConfig::new(5));

        assert_eq!(config.call_timeout, Duration::from_secs(30));
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn retry_delays_double() {
        let retry = RetryConfig::new(4).with_initial_delay(Duration::from_millis(100));
        assert_eq!(retry.delay_for_retry(0), Duration::from_millis(100));
        assert_eq!(retry.delay_for_retry(1), Duration::from_millis(200));
        assert_eq!(retry.delay_for_retry(2), Duration::from_millis(400));
        assert_eq!(retry.delay_for_retry(3), Duration::from_millis(800));
    }

    #[test]
    fn retry_delay_ceiling_clamps() {
        let retry = RetryConfig::new(6)
            .with_initial_delay(Duration::from_secs(1))
            .with_max_delay(Duration::from_secs(3));
        assert_eq!(retry.delay_for_retry(0), Duration::from_secs(1));
        assert_eq!(retry.delay_for_retry(1), Duration::from_secs(2));
        assert_eq!(retry.delay_for_retry(2), Duration::from_secs(3));
        assert_eq!(retry.delay_for_retry(5), Duration::from_secs(3));
    }

    #[test]
    fn no_retry_config() {
        let retry = RetryConfig::no_retry();
        assert_eq!(retry.max_attempts, 1);
    }

    #[test]
    fn default_limits_match_backend() {
        let limits = SnippetLimits::default();
        assert_eq!(limits.trigger, 80);
        assert_eq!(limits.expansion, 50_000);
        assert_eq!(limits.tags, 512);
        assert_eq!(limits.description, 2_000);
        assert_eq!(limits.application, 128);
        assert_eq!(limits.language, 64);
    }

    #[test]
    fn default_rollback_policy_is_asymmetric() {
        let policy = RollbackPolicy::default();
        assert!(policy.upsert);
        assert!(policy.delete);
        assert!(!policy.favorite);
    }
}
