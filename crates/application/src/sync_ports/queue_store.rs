use async_trait::async_trait;
use pennywise_core::AppResult;
use pennywise_domain::QueuedRequest;

/// Durable storage for the offline queue.
#[async_trait]
pub trait OfflineQueueStore: Send + Sync {
    /// Loads the persisted queue in enqueue order. Missing state is an empty queue.
    async fn load(&self) -> AppResult<Vec<QueuedRequest>>;

    /// Replaces the persisted queue with `entries`.
    async fn save(&self, entries: &[QueuedRequest]) -> AppResult<()>;
}
