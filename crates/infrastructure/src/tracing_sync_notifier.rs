use pennywise_application::{SyncNotice, SyncNotifier};
use tracing::{info, warn};

/// Reports sync notices through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSyncNotifier;

impl SyncNotifier for TracingSyncNotifier {
    fn notify(&self, notice: SyncNotice) {
        match notice {
            SyncNotice::Queued { request, pending } => {
                info!(request = %request, pending, "saved offline, will send when back online");
            }
            SyncNotice::Synced { replayed } => {
                info!(replayed, "offline changes synced");
            }
            SyncNotice::Discarded { count } => {
                warn!(count, "dropped queued changes older than 24 hours");
            }
        }
    }
}
