use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use pennywise_application::RateLimitRepository;
use pennywise_core::AppResult;
use pennywise_domain::RateLimitRecord;
use tokio::sync::Mutex;

/// Process-local rate limit store.
///
/// Counts are not shared between server instances.
#[derive(Default)]
pub struct InMemoryRateLimitRepository {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl InMemoryRateLimitRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn get(&self, key: &str) -> AppResult<Option<RateLimitRecord>> {
        Ok(self.records.lock().await.get(key).copied())
    }

    async fn increment(&self, key: &str) -> AppResult<Option<RateLimitRecord>> {
        let mut records = self.records.lock().await;
        Ok(records.get_mut(key).map(|record| {
            record.count = record.count.saturating_add(1);
            *record
        }))
    }

    async fn reset(
        &self,
        key: &str,
        window_started_at: DateTime<Utc>,
        _window: TimeDelta,
    ) -> AppResult<RateLimitRecord> {
        let record = RateLimitRecord::start(window_started_at);
        self.records.lock().await.insert(key.to_owned(), record);
        Ok(record)
    }

    async fn purge_expired(
        &self,
        key_prefix: &str,
        window_started_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        let namespace = format!("{key_prefix}:");
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|key, record| {
            !key.starts_with(namespace.as_str())
                || record.window_started_at >= window_started_before
        });

        Ok(u64::try_from(before - records.len()).unwrap_or(u64::MAX))
    }
}
