//! Application services and ports.

#![forbid(unsafe_code)]

mod offline_queue;
mod rate_limit_service;
mod request_dispatcher;
mod sync_ports;

#[cfg(test)]
mod test_support;

pub use offline_queue::{
    FlushReport, FlushSkipReason, FlushSubscription, OfflineQueue, subscribe_flush_on_reconnect,
};
pub use rate_limit_service::{RateLimitRepository, RateLimitRule, RateLimitService};
pub use request_dispatcher::{DispatchOptions, RequestDispatcher};
pub use sync_ports::{
    ConnectivityMonitor, HttpTransport, OfflineQueueStore, SyncNotice, SyncNotifier,
};
