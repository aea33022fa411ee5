//! Ports for the client sync pipeline.

mod connectivity;
mod notifier;
mod queue_store;
mod transport;

pub use connectivity::ConnectivityMonitor;
pub use notifier::{SyncNotice, SyncNotifier};
pub use queue_store::OfflineQueueStore;
pub use transport::HttpTransport;
