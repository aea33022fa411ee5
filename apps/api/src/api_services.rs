use std::sync::Arc;
use std::time::Duration;

use pennywise_application::{RateLimitRepository, RateLimitRule, RateLimitService};
use pennywise_core::{AppError, SystemClock};
use pennywise_infrastructure::{
    InMemoryRateLimitRepository, PostgresRateLimitRepository, RedisRateLimitRepository,
};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api_config::RateLimitStoreConfig;

pub const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub async fn build_rate_limit_service(
    store: &RateLimitStoreConfig,
) -> Result<RateLimitService, AppError> {
    let repository: Arc<dyn RateLimitRepository> = match store {
        RateLimitStoreConfig::Memory => Arc::new(InMemoryRateLimitRepository::new()),
        RateLimitStoreConfig::Redis { redis_url } => Arc::new(RedisRateLimitRepository::new(
            build_redis_client(redis_url)?,
            "pennywise:rate_limit",
        )),
        RateLimitStoreConfig::Postgres { database_url } => {
            Arc::new(PostgresRateLimitRepository::new(
                connect_and_migrate(database_url).await?,
            ))
        }
    };

    Ok(RateLimitService::new(repository, Arc::new(SystemClock)))
}

pub fn build_redis_client(redis_url: &str) -> Result<redis::Client, AppError> {
    redis::Client::open(redis_url)
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))
}

pub async fn connect_and_migrate(database_url: &str) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    Ok(pool)
}

/// Periodically drops rate limit records whose window has elapsed.
pub fn spawn_rate_limit_sweep(
    service: RateLimitService,
    rules: Vec<RateLimitRule>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;

            match service.cleanup(&rules).await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "purged expired rate limit records"),
                Err(error) => warn!(error = %error, "rate limit sweep failed"),
            }
        }
    })
}
