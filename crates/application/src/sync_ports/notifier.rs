/// Transient user-facing notices emitted by the offline queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncNotice {
    /// A request was stored for replay.
    Queued {
        /// `METHOD url` of the stored request.
        request: String,
        /// Queue length after the append.
        pending: usize,
    },
    /// A flush delivered everything and the queue is empty.
    Synced {
        /// Requests delivered by the flush.
        replayed: usize,
    },
    /// Stale entries were dropped after failing to replay.
    Discarded {
        /// Number of dropped requests.
        count: usize,
    },
}

/// Port for surfacing queue notices to the user.
pub trait SyncNotifier: Send + Sync {
    /// Publishes one notice. Must not block.
    fn notify(&self, notice: SyncNotice);
}
