use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Counter state for one rate-limit key within its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitRecord {
    /// Requests observed since `window_started_at`, including the current one.
    pub count: u32,
    /// Start of the active window.
    pub window_started_at: DateTime<Utc>,
}

impl RateLimitRecord {
    /// Opens a fresh window with the current request counted.
    #[must_use]
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            window_started_at: now,
        }
    }

    /// Returns whether `now` is past the end of this record's window.
    #[must_use]
    pub fn window_elapsed(&self, window: TimeDelta, now: DateTime<Utc>) -> bool {
        now - self.window_started_at > window
    }

    /// Instant at which the window closes.
    #[must_use]
    pub fn resets_at(&self, window: TimeDelta) -> DateTime<Utc> {
        self.window_started_at + window
    }
}

/// Outcome of one limiter check, carried into response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the request may proceed.
    pub allowed: bool,
    /// Configured quota for the window.
    pub limit: u32,
    /// Requests left in the window, clamped at zero.
    pub remaining: u32,
    /// Window close time in epoch seconds, rounded up.
    pub reset_at_epoch_seconds: i64,
    /// Seconds the caller should wait, set only on rejection.
    pub retry_after_seconds: Option<u64>,
}

impl RateLimitDecision {
    /// Evaluates an already-updated record against the quota.
    #[must_use]
    pub fn evaluate(
        record: &RateLimitRecord,
        max_requests: u32,
        window: TimeDelta,
        now: DateTime<Utc>,
    ) -> Self {
        let resets_at = record.resets_at(window);
        let allowed = record.count <= max_requests;
        let retry_after_seconds = (!allowed).then(|| {
            let remaining_ms = (resets_at - now).num_milliseconds();
            // Rejections always advertise at least one second.
            u64::try_from(ceil_div(remaining_ms, 1000)).unwrap_or(0).max(1)
        });

        Self {
            allowed,
            limit: max_requests,
            remaining: max_requests.saturating_sub(record.count),
            reset_at_epoch_seconds: ceil_div(resets_at.timestamp_millis(), 1000),
            retry_after_seconds,
        }
    }
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    let quotient = value.div_euclid(divisor);
    if value.rem_euclid(divisor) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone, Utc};
    use proptest::prelude::*;

    use super::{RateLimitDecision, RateLimitRecord};

    #[test]
    fn fourth_request_over_quota_of_three_is_rejected() {
        let start = Utc::now();
        let window = TimeDelta::minutes(15);
        let record = RateLimitRecord {
            count: 4,
            window_started_at: start,
        };

        let decision =
            RateLimitDecision::evaluate(&record, 3, window, start + TimeDelta::seconds(10));
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert_eq!(decision.retry_after_seconds, Some(890));
    }

    #[test]
    fn retry_after_rounds_partial_seconds_up() {
        let start = Utc.timestamp_millis_opt(1_000_000).single();
        let Some(start) = start else {
            panic!("valid timestamp");
        };
        let record = RateLimitRecord {
            count: 2,
            window_started_at: start,
        };

        let decision = RateLimitDecision::evaluate(
            &record,
            1,
            TimeDelta::seconds(5),
            start + TimeDelta::milliseconds(1_500),
        );
        assert_eq!(decision.retry_after_seconds, Some(4));
        assert_eq!(decision.reset_at_epoch_seconds, 1_005);
    }

    #[test]
    fn window_elapses_strictly_after_its_length() {
        let start = Utc::now();
        let window = TimeDelta::seconds(60);
        let record = RateLimitRecord::start(start);

        assert!(!record.window_elapsed(window, start + window));
        assert!(record.window_elapsed(window, start + window + TimeDelta::milliseconds(1)));
    }

    proptest! {
        #[test]
        fn decision_matches_quota(
            count in 1_u32..500,
            max in 0_u32..200,
            offset_ms in 0_i64..900_000,
        ) {
            let start = Utc::now();
            let window = TimeDelta::minutes(15);
            let record = RateLimitRecord { count, window_started_at: start };
            let decision = RateLimitDecision::evaluate(
                &record,
                max,
                window,
                start + TimeDelta::milliseconds(offset_ms),
            );

            prop_assert_eq!(decision.allowed, count <= max);
            prop_assert!(decision.remaining <= max);
            if let Some(retry_after) = decision.retry_after_seconds {
                prop_assert!(retry_after >= 1);
                prop_assert!(retry_after <= 900);
            } else {
                prop_assert!(decision.allowed);
            }
        }
    }
}
