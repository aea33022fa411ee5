use std::sync::Arc;

use pennywise_core::{AppResult, Clock};
use pennywise_domain::RateLimitDecision;

use super::config::RateLimitRule;
use super::ports::RateLimitRepository;

/// Application service for rate limiting.
#[derive(Clone)]
pub struct RateLimitService {
    repository: Arc<dyn RateLimitRepository>,
    clock: Arc<dyn Clock>,
}

impl RateLimitService {
    /// Creates a new rate limit service.
    #[must_use]
    pub fn new(repository: Arc<dyn RateLimitRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Counts one request from `identity` against `rule`.
    ///
    /// A missing record or one whose window has elapsed restarts at a count
    /// of one. Store errors are returned to the caller untouched.
    pub async fn check(
        &self,
        rule: &RateLimitRule,
        identity: &str,
    ) -> AppResult<RateLimitDecision> {
        let now = self.clock.now();
        let key = rule.key_for(identity);

        let current = self.repository.get(&key).await?;
        let record = match current {
            Some(record) if !record.window_elapsed(rule.window, now) => {
                match self.repository.increment(&key).await? {
                    Some(record) => record,
                    None => self.repository.reset(&key, now, rule.window).await?,
                }
            }
            _ => self.repository.reset(&key, now, rule.window).await?,
        };

        Ok(RateLimitDecision::evaluate(
            &record,
            rule.max_requests,
            rule.window,
            now,
        ))
    }

    /// Removes records whose window has fully elapsed, for every rule given.
    pub async fn cleanup(&self, rules: &[RateLimitRule]) -> AppResult<u64> {
        let now = self.clock.now();
        let mut removed = 0;
        for rule in rules {
            removed += self
                .repository
                .purge_expired(&rule.key_prefix, now - rule.window)
                .await?;
        }
        Ok(removed)
    }
}
