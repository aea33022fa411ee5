use std::time::Duration;

/// Number of retries after the initial attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Delays used when the server does not send `Retry-After`.
pub const DEFAULT_BACKOFF_SECONDS: [u64; 3] = [1, 2, 4];

/// Upper bound applied to server-provided `Retry-After` values.
pub const DEFAULT_MAX_RETRY_AFTER_SECONDS: u64 = 60;

/// Bounded retry schedule for transient failures and 429 responses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    backoff: Vec<Duration>,
    max_retry_after: Duration,
}

impl RetryPolicy {
    /// Creates a policy with an explicit schedule.
    ///
    /// An empty schedule retries immediately.
    #[must_use]
    pub fn new(max_retries: u32, backoff: Vec<Duration>, max_retry_after: Duration) -> Self {
        Self {
            max_retries,
            backoff,
            max_retry_after,
        }
    }

    /// Maximum number of retries after the first attempt.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns whether another attempt is allowed after `attempt` (zero-based).
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_retries
    }

    /// Delay before the attempt following `attempt`.
    ///
    /// A server hint wins over the schedule but is capped. Attempts past the
    /// end of the schedule reuse its last entry.
    #[must_use]
    pub fn delay_for(&self, attempt: u32, retry_after_seconds: Option<u64>) -> Duration {
        if let Some(seconds) = retry_after_seconds {
            return Duration::from_secs(seconds).min(self.max_retry_after);
        }

        let index = usize::try_from(attempt).unwrap_or(usize::MAX);
        self.backoff
            .get(index)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_RETRIES,
            DEFAULT_BACKOFF_SECONDS
                .iter()
                .map(|seconds| Duration::from_secs(*seconds))
                .collect(),
            Duration::from_secs(DEFAULT_MAX_RETRY_AFTER_SECONDS),
        )
    }
}
