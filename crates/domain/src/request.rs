use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use pennywise_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hours after which a failed queued request is discarded instead of retained.
pub const MAX_QUEUED_REQUEST_AGE_HOURS: i64 = 24;

/// HTTP methods the request pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// Plain read.
    Get,
    /// Header-only read.
    Head,
    /// Capability probe.
    Options,
    /// Create.
    Post,
    /// Replace.
    Put,
    /// Partial update.
    Patch,
    /// Remove.
    Delete,
}

impl HttpMethod {
    /// Returns the wire token for this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Returns whether the method changes server state.
    ///
    /// Only mutating requests are eligible for the offline queue.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }
}

impl Display for HttpMethod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unsupported HTTP method '{value}'"
            ))),
        }
    }
}

/// One logical HTTP call issued by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundRequest {
    /// Absolute target URL.
    pub url: String,
    /// Request method.
    pub method: HttpMethod,
    /// JSON body, sent with `Content-Type: application/json` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    /// Caller-supplied headers keyed by lowercase name. Credentials are
    /// attached at send time, not here.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl OutboundRequest {
    /// Creates a request without body or headers.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            body: None,
            headers: BTreeMap::new(),
        }
    }

    /// Attaches a JSON body.
    #[must_use]
    pub fn with_json_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets one header, replacing any existing header with the same name in
    /// any letter case. Names are stored lowercase.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Looks up a header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Short `METHOD url` label used in logs and error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }
}

/// Response as observed by the client pipeline.
///
/// Header names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers keyed by lowercase name.
    pub headers: BTreeMap<String, String>,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response with no headers and an empty body.
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: Vec::new(),
        }
    }

    /// Adds one header, normalising the name to lowercase.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Returns whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns whether the server rejected the call with 429.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Looks up a header by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(name.to_ascii_lowercase().as_str())
            .map(String::as_str)
    }

    /// Parses a `Retry-After` header expressed in whole seconds.
    ///
    /// HTTP-date values are not supported and yield `None`.
    #[must_use]
    pub fn retry_after_seconds(&self) -> Option<u64> {
        self.header("retry-after")
            .and_then(|value| value.trim().parse::<u64>().ok())
    }

    /// Returns the body decoded as UTF-8, replacing invalid sequences.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// A mutating request stored while the client was offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedRequest {
    /// The request to replay.
    #[serde(flatten)]
    pub request: OutboundRequest,
    /// When the request entered the queue.
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedRequest {
    /// Wraps a mutating request for the offline queue.
    pub fn new(request: OutboundRequest, enqueued_at: DateTime<Utc>) -> Result<Self, AppError> {
        if !request.method.is_mutating() {
            return Err(AppError::Validation(format!(
                "only mutating requests can be queued, got {}",
                request.method
            )));
        }

        Ok(Self {
            request,
            enqueued_at,
        })
    }

    /// Time elapsed since the request was queued.
    #[must_use]
    pub fn age(&self, now: DateTime<Utc>) -> TimeDelta {
        now - self.enqueued_at
    }

    /// Returns whether the request is too old to be kept after a failed replay.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.age(now) >= TimeDelta::hours(MAX_QUEUED_REQUEST_AGE_HOURS)
    }
}
