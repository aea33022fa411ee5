//! PostgreSQL-backed rate limit repository using the `rate_limit_records` table.

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use sqlx::PgPool;

use pennywise_application::RateLimitRepository;
use pennywise_core::{AppError, AppResult};
use pennywise_domain::RateLimitRecord;

/// PostgreSQL implementation of the rate limit repository port.
#[derive(Clone)]
pub struct PostgresRateLimitRepository {
    pool: PgPool,
}

impl PostgresRateLimitRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitRepository for PostgresRateLimitRepository {
    async fn get(&self, key: &str) -> AppResult<Option<RateLimitRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            SELECT count, window_started_at
            FROM rate_limit_records
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read rate limit record: {error}")))?;

        row.map(RecordRow::into_record).transpose()
    }

    async fn increment(&self, key: &str) -> AppResult<Option<RateLimitRecord>> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            UPDATE rate_limit_records
            SET count = count + 1
            WHERE key = $1
            RETURNING count, window_started_at
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to increment rate limit record: {error}"))
        })?;

        row.map(RecordRow::into_record).transpose()
    }

    async fn reset(
        &self,
        key: &str,
        window_started_at: DateTime<Utc>,
        _window: TimeDelta,
    ) -> AppResult<RateLimitRecord> {
        let row = sqlx::query_as::<_, RecordRow>(
            r#"
            INSERT INTO rate_limit_records (key, count, window_started_at)
            VALUES ($1, 1, $2)
            ON CONFLICT (key) DO UPDATE
            SET count = 1, window_started_at = EXCLUDED.window_started_at
            RETURNING count, window_started_at
            "#,
        )
        .bind(key)
        .bind(window_started_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to reset rate limit record: {error}"))
        })?;

        row.into_record()
    }

    async fn purge_expired(
        &self,
        key_prefix: &str,
        window_started_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM rate_limit_records
            WHERE starts_with(key, $1) AND window_started_at < $2
            "#,
        )
        .bind(format!("{key_prefix}:"))
        .bind(window_started_before)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to purge expired rate limits: {error}"))
        })?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecordRow {
    count: i32,
    window_started_at: DateTime<Utc>,
}

impl RecordRow {
    fn into_record(self) -> AppResult<RateLimitRecord> {
        let count = u32::try_from(self.count)
            .map_err(|error| AppError::Internal(format!("invalid rate limit count: {error}")))?;

        Ok(RateLimitRecord {
            count,
            window_started_at: self.window_started_at,
        })
    }
}
