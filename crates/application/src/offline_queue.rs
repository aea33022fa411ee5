//! Durable queue of mutating requests that could not be sent while offline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use pennywise_core::{AppResult, Clock};
use pennywise_domain::{OutboundRequest, QueuedRequest};
use tokio::sync::Mutex;
use tracing::info;

use crate::sync_ports::{ConnectivityMonitor, OfflineQueueStore, SyncNotice, SyncNotifier};

mod flush;
mod subscription;

pub use flush::{FlushReport, FlushSkipReason};
pub use subscription::{FlushSubscription, subscribe_flush_on_reconnect};

/// Ordered, persisted buffer of requests awaiting replay.
pub struct OfflineQueue {
    store: Arc<dyn OfflineQueueStore>,
    notifier: Arc<dyn SyncNotifier>,
    clock: Arc<dyn Clock>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    entries: Mutex<Vec<QueuedRequest>>,
    flushing: AtomicBool,
}

impl OfflineQueue {
    /// Restores the queue from `store`.
    pub async fn load(
        store: Arc<dyn OfflineQueueStore>,
        notifier: Arc<dyn SyncNotifier>,
        clock: Arc<dyn Clock>,
        connectivity: Arc<dyn ConnectivityMonitor>,
    ) -> AppResult<Self> {
        let entries = store.load().await?;
        if !entries.is_empty() {
            info!(pending = entries.len(), "restored offline queue");
        }

        Ok(Self {
            store,
            notifier,
            clock,
            connectivity,
            entries: Mutex::new(entries),
            flushing: AtomicBool::new(false),
        })
    }

    /// Appends a mutating request, persists the queue, and emits a queued notice.
    pub async fn enqueue(&self, request: OutboundRequest) -> AppResult<()> {
        let queued = QueuedRequest::new(request, self.clock.now())?;
        let description = queued.request.describe();

        let pending = {
            let mut entries = self.entries.lock().await;
            entries.push(queued);
            self.store.save(entries.as_slice()).await?;
            entries.len()
        };

        info!(request = %description, pending, "request queued for replay");
        self.notifier.notify(SyncNotice::Queued {
            request: description,
            pending,
        });

        Ok(())
    }

    /// Number of requests waiting for replay.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Returns whether nothing is waiting for replay.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Copy of the pending requests in enqueue order.
    pub async fn snapshot(&self) -> Vec<QueuedRequest> {
        self.entries.lock().await.clone()
    }

    /// Returns whether a flush is currently running.
    #[must_use]
    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::Acquire)
    }
}
