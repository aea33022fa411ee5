use chrono::TimeDelta;

const DEFAULT_WINDOW_SECONDS: i64 = 15 * 60;

/// Configuration for one route class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Namespace for this rule's keys (e.g. "auth", "api").
    pub key_prefix: String,
    /// Requests allowed per identity in one window.
    pub max_requests: u32,
    /// Window length.
    pub window: TimeDelta,
}

impl RateLimitRule {
    /// Creates a new rate limit rule.
    #[must_use]
    pub fn new(key_prefix: impl Into<String>, max_requests: u32, window_seconds: i64) -> Self {
        Self {
            key_prefix: key_prefix.into(),
            max_requests,
            window: TimeDelta::seconds(window_seconds),
        }
    }

    /// Limiter for login and other credential routes.
    #[must_use]
    pub fn auth() -> Self {
        Self::new("auth", 5, DEFAULT_WINDOW_SECONDS)
    }

    /// Limiter for general API routes.
    #[must_use]
    pub fn api() -> Self {
        Self::new("api", 100, DEFAULT_WINDOW_SECONDS)
    }

    /// Storage key for `identity` under this rule.
    #[must_use]
    pub fn key_for(&self, identity: &str) -> String {
        format!("{}:{identity}", self.key_prefix)
    }
}
