//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod ledger;
mod rate_limit;
mod request;
mod retry;

pub use ledger::{
    EntryKind, LedgerEntry, MAX_CATEGORY_LENGTH, MAX_ENTRY_AMOUNT, MAX_NOTE_LENGTH,
};
pub use rate_limit::{RateLimitDecision, RateLimitRecord};
pub use request::{
    HttpMethod, HttpResponse, MAX_QUEUED_REQUEST_AGE_HOURS, OutboundRequest, QueuedRequest,
};
pub use retry::{
    DEFAULT_BACKOFF_SECONDS, DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_AFTER_SECONDS, RetryPolicy,
};
