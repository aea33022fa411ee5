//! Redis-backed rate limit repository.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use pennywise_application::RateLimitRepository;
use pennywise_core::{AppError, AppResult};
use pennywise_domain::RateLimitRecord;
use redis::Script;
use redis::aio::MultiplexedConnection;

const COUNT_FIELD: &str = "count";
const WINDOW_STARTED_FIELD: &str = "window_started_at_ms";

const INCREMENT_SCRIPT: &str = r#"
local key = KEYS[1]

if redis.call('EXISTS', key) == 0 then
  return nil
end

local count = redis.call('HINCRBY', key, ARGV[1], 1)
local window_started = redis.call('HGET', key, ARGV[2])
return {count, tonumber(window_started)}
"#;

const RESET_SCRIPT: &str = r#"
local key = KEYS[1]

redis.call('DEL', key)
redis.call('HSET', key, ARGV[1], 1, ARGV[2], ARGV[3])
redis.call('PEXPIRE', key, ARGV[4])
return 1
"#;

/// Redis implementation of the rate limit repository port.
///
/// Records live in hashes that expire one window after they were reset, so
/// idle keys disappear without a sweep.
#[derive(Clone)]
pub struct RedisRateLimitRepository {
    client: redis::Client,
    namespace: String,
}

impl RedisRateLimitRepository {
    /// Creates a repository with a configured Redis client and key namespace.
    #[must_use]
    pub fn new(client: redis::Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    fn redis_key(&self, key: &str) -> String {
        format!("{}:{key}", self.namespace)
    }

    async fn connection(&self) -> AppResult<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

fn record_from_parts(count: i64, window_started_ms: i64) -> AppResult<RateLimitRecord> {
    let count = u32::try_from(count)
        .map_err(|error| AppError::Internal(format!("invalid redis rate limit count: {error}")))?;
    let window_started_at = Utc
        .timestamp_millis_opt(window_started_ms)
        .single()
        .ok_or_else(|| {
            AppError::Internal(format!(
                "invalid redis window start timestamp: {window_started_ms}"
            ))
        })?;

    Ok(RateLimitRecord {
        count,
        window_started_at,
    })
}

#[async_trait]
impl RateLimitRepository for RedisRateLimitRepository {
    async fn get(&self, key: &str) -> AppResult<Option<RateLimitRecord>> {
        let mut connection = self.connection().await?;

        let (count, window_started_ms): (Option<i64>, Option<i64>) = redis::cmd("HMGET")
            .arg(self.redis_key(key))
            .arg(COUNT_FIELD)
            .arg(WINDOW_STARTED_FIELD)
            .query_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read redis rate limit record: {error}"))
            })?;

        match (count, window_started_ms) {
            (Some(count), Some(window_started_ms)) => {
                record_from_parts(count, window_started_ms).map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn increment(&self, key: &str) -> AppResult<Option<RateLimitRecord>> {
        let mut connection = self.connection().await?;

        let parts: Option<(i64, i64)> = Script::new(INCREMENT_SCRIPT)
            .key(self.redis_key(key))
            .arg(COUNT_FIELD)
            .arg(WINDOW_STARTED_FIELD)
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to increment redis rate limit record: {error}"
                ))
            })?;

        parts
            .map(|(count, window_started_ms)| record_from_parts(count, window_started_ms))
            .transpose()
    }

    async fn reset(
        &self,
        key: &str,
        window_started_at: DateTime<Utc>,
        window: TimeDelta,
    ) -> AppResult<RateLimitRecord> {
        let window_ms = window.num_milliseconds();
        if window_ms <= 0 {
            return Err(AppError::Validation(
                "rate limit window must be greater than zero".to_owned(),
            ));
        }

        let mut connection = self.connection().await?;

        let _: i64 = Script::new(RESET_SCRIPT)
            .key(self.redis_key(key))
            .arg(COUNT_FIELD)
            .arg(WINDOW_STARTED_FIELD)
            .arg(window_started_at.timestamp_millis())
            .arg(window_ms)
            .invoke_async(&mut connection)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to reset redis rate limit record: {error}"))
            })?;

        record_from_parts(1, window_started_at.timestamp_millis())
    }

    async fn purge_expired(
        &self,
        _key_prefix: &str,
        _window_started_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        // Keys expire through PEXPIRE set on reset.
        Ok(0)
    }
}
