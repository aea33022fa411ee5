use chrono::NaiveDate;
use pennywise_domain::{EntryKind, LedgerEntry};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// API error payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Body of a 429 rejection.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitErrorResponse {
    pub error: &'static str,
    pub message: String,
    pub retry_after: u64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    pub kind: EntryKind,
    pub amount: i64,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub id: Uuid,
    pub kind: EntryKind,
    pub amount: i64,
    pub category: String,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl From<&LedgerEntry> for EntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id(),
            kind: entry.kind(),
            amount: entry.amount(),
            category: entry.category().to_owned(),
            date: entry.date(),
            note: entry.note().map(ToOwned::to_owned),
        }
    }
}
