use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use pennywise_core::{AppError, AppResult, Clock};
use pennywise_domain::RateLimitRecord;
use tokio::sync::Mutex;

use crate::test_support::ManualClock;

use super::{RateLimitRepository, RateLimitRule, RateLimitService};

#[derive(Default)]
struct FakeRateLimitRepository {
    records: Mutex<HashMap<String, RateLimitRecord>>,
}

impl FakeRateLimitRepository {
    async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.records.lock().await.keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl RateLimitRepository for FakeRateLimitRepository {
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
        let mut records = self.records.lock().await;
        let before = records.len();
        let prefix = format!("{key_prefix}:");
        records.retain(|key, record| {
            !(key.starts_with(prefix.as_str()) && record.window_started_at < window_started_before)
        });
        Ok(u64::try_from(before - records.len()).unwrap_or(u64::MAX))
    }
}

struct UnavailableRepository;

#[async_trait]
impl RateLimitRepository for UnavailableRepository {
    async fn get(&self, _key: &str) -> AppResult<Option<RateLimitRecord>> {
        Err(AppError::Internal("store unreachable".to_owned()))
    }

    async fn increment(&self, _key: &str) -> AppResult<Option<RateLimitRecord>> {
        Err(AppError::Internal("store unreachable".to_owned()))
    }

    async fn reset(
        &self,
        _key: &str,
        _window_started_at: DateTime<Utc>,
        _window: TimeDelta,
    ) -> AppResult<RateLimitRecord> {
        Err(AppError::Internal("store unreachable".to_owned()))
    }

    async fn purge_expired(
        &self,
        _key_prefix: &str,
        _window_started_before: DateTime<Utc>,
    ) -> AppResult<u64> {
        Err(AppError::Internal("store unreachable".to_owned()))
    }
}

fn service() -> (
    RateLimitService,
    Arc<FakeRateLimitRepository>,
    Arc<ManualClock>,
) {
    let repository = Arc::new(FakeRateLimitRepository::default());
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let service = RateLimitService::new(repository.clone(), clock.clone());
    (service, repository, clock)
}

#[tokio::test]
async fn fourth_request_in_window_is_rejected() {
    let (service, _, clock) = service();
    let rule = RateLimitRule::new("test", 3, 60);

    for expected_remaining in [2, 1, 0] {
        let decision = service
            .check(&rule, "10.0.0.1")
            .await
            .unwrap_or_else(|error| panic!("check failed: {error}"));
        assert!(decision.allowed);
        assert_eq!(decision.remaining, expected_remaining);
        assert_eq!(decision.retry_after_seconds, None);
        clock.advance(TimeDelta::seconds(1));
    }

    let rejected = service
        .check(&rule, "10.0.0.1")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    assert!(!rejected.allowed);
    assert_eq!(rejected.limit, 3);
    assert_eq!(rejected.remaining, 0);
    assert_eq!(rejected.retry_after_seconds, Some(57));
}

#[tokio::test]
async fn identities_are_tracked_independently() {
    let (service, _, _) = service();
    let rule = RateLimitRule::new("test", 1, 60);

    let first = service.check(&rule, "alice").await;
    let second = service.check(&rule, "bob").await;
    let first_again = service.check(&rule, "alice").await;

    assert!(matches!(first, Ok(decision) if decision.allowed));
    assert!(matches!(second, Ok(decision) if decision.allowed));
    assert!(matches!(first_again, Ok(decision) if !decision.allowed));
}

#[tokio::test]
async fn exhausted_identity_is_allowed_after_window_elapses() {
    let (service, repository, clock) = service();
    let rule = RateLimitRule::new("test", 2, 60);

    for _ in 0..3 {
        let _ = service.check(&rule, "10.0.0.9").await;
    }
    let blocked = service.check(&rule, "10.0.0.9").await;
    assert!(matches!(blocked, Ok(decision) if !decision.allowed));

    clock.advance(TimeDelta::seconds(60));
    let still_blocked = service.check(&rule, "10.0.0.9").await;
    assert!(matches!(still_blocked, Ok(decision) if !decision.allowed));

    clock.advance(TimeDelta::milliseconds(1));
    let allowed = service
        .check(&rule, "10.0.0.9")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));
    assert!(allowed.allowed);
    assert_eq!(allowed.remaining, 1);

    let record = repository.get("test:10.0.0.9").await;
    assert!(matches!(record, Ok(Some(record)) if record.count == 1));
}

#[tokio::test]
async fn auth_and_api_rules_never_share_counters() {
    let (service, repository, _) = service();
    let auth = RateLimitRule::auth();
    let api = RateLimitRule::api();

    for _ in 0..6 {
        let _ = service.check(&auth, "203.0.113.7").await;
    }
    let auth_decision = service.check(&auth, "203.0.113.7").await;
    let api_decision = service
        .check(&api, "203.0.113.7")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));

    assert!(matches!(auth_decision, Ok(decision) if !decision.allowed));
    assert!(api_decision.allowed);
    assert_eq!(api_decision.remaining, 99);
    assert_eq!(
        repository.keys().await,
        vec!["api:203.0.113.7".to_owned(), "auth:203.0.113.7".to_owned()]
    );
}

#[tokio::test]
async fn reset_time_is_reported_on_allowed_requests() {
    let (service, _, clock) = service();
    let rule = RateLimitRule::new("test", 10, 900);
    let window_end = clock.now() + TimeDelta::seconds(900);

    let decision = service
        .check(&rule, "client")
        .await
        .unwrap_or_else(|error| panic!("check failed: {error}"));

    assert!(decision.reset_at_epoch_seconds >= window_end.timestamp());
    assert!(decision.reset_at_epoch_seconds <= window_end.timestamp() + 1);
}

#[tokio::test]
async fn cleanup_removes_only_elapsed_windows() {
    let (service, repository, clock) = service();
    let auth = RateLimitRule::new("auth", 5, 60);
    let api = RateLimitRule::new("api", 100, 600);

    let _ = service.check(&auth, "old").await;
    let _ = service.check(&api, "old").await;
    clock.advance(TimeDelta::seconds(120));
    let _ = service.check(&auth, "fresh").await;

    let removed = service.cleanup(&[auth, api]).await;

    assert!(matches!(removed, Ok(1)));
    assert_eq!(
        repository.keys().await,
        vec!["api:old".to_owned(), "auth:fresh".to_owned()]
    );
}

#[tokio::test]
async fn store_errors_are_propagated() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let service = RateLimitService::new(Arc::new(UnavailableRepository), clock);

    let result = service.check(&RateLimitRule::api(), "client").await;

    assert!(matches!(result, Err(AppError::Internal(_))));
}

#[test]
fn default_rules_use_fifteen_minute_windows() {
    let auth = RateLimitRule::auth();
    let api = RateLimitRule::api();

    assert_eq!(auth.max_requests, 5);
    assert_eq!(api.max_requests, 100);
    assert_eq!(auth.window, TimeDelta::minutes(15));
    assert_eq!(api.window, TimeDelta::minutes(15));
    assert_eq!(auth.key_for("1.2.3.4"), "auth:1.2.3.4");
}
