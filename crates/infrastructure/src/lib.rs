//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_rate_limit_repository;
mod json_file_offline_queue_store;
mod postgres_rate_limit_repository;
mod redis_rate_limit_repository;
mod reqwest_http_transport;
mod tracing_sync_notifier;
mod watch_connectivity_monitor;

pub use in_memory_rate_limit_repository::InMemoryRateLimitRepository;
pub use json_file_offline_queue_store::JsonFileOfflineQueueStore;
pub use postgres_rate_limit_repository::PostgresRateLimitRepository;
pub use redis_rate_limit_repository::RedisRateLimitRepository;
pub use reqwest_http_transport::ReqwestHttpTransport;
pub use tracing_sync_notifier::TracingSyncNotifier;
pub use watch_connectivity_monitor::WatchConnectivityMonitor;
