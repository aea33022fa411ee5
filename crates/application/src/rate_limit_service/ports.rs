use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};

use pennywise_core::AppResult;
use pennywise_domain::RateLimitRecord;

/// Repository port for rate limit records.
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// Returns the record stored under `key`, if any.
    async fn get(&self, key: &str) -> AppResult<Option<RateLimitRecord>>;

    /// Adds one to an existing record's count.
    ///
    /// Returns `None` when the record vanished since it was read.
    async fn increment(&self, key: &str) -> AppResult<Option<RateLimitRecord>>;

    /// Replaces the record with `count = 1` starting at `window_started_at`.
    ///
    /// `window` lets stores with native expiry drop the key on their own.
    async fn reset(
        &self,
        key: &str,
        window_started_at: DateTime<Utc>,
        window: TimeDelta,
    ) -> AppResult<RateLimitRecord>;

    /// Removes records under `key_prefix` whose window started before the cutoff.
    async fn purge_expired(
        &self,
        key_prefix: &str,
        window_started_before: DateTime<Utc>,
    ) -> AppResult<u64>;
}
