//! Shared primitives for all Rust crates in Pennywise.

#![forbid(unsafe_code)]

/// Wall-clock abstraction shared by the queue and the limiter.
pub mod clock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use clock::{Clock, SystemClock};

/// Result type used across Pennywise crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// User is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller exceeded the request quota for the current window.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// No response was obtained from the remote side.
    #[error("network error: {0}")]
    Network(String),

    /// The client is offline and the request was not sent.
    #[error("offline: {0}")]
    Offline(String),

    /// The client is offline and the request was stored for later replay.
    #[error("offline, request queued: {0}")]
    OfflineQueued(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
