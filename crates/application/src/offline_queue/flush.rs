use std::sync::atomic::{AtomicBool, Ordering};

use pennywise_core::AppResult;
use tracing::{info, warn};

use crate::request_dispatcher::RequestDispatcher;
use crate::sync_ports::SyncNotice;

use super::OfflineQueue;

/// Why a flush returned without replaying anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushSkipReason {
    /// Another flush holds the guard.
    InProgress,
    /// The client still believes it is offline.
    Offline,
    /// Nothing is queued.
    Empty,
}

/// Outcome of one flush pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushReport {
    /// The pass did not run.
    Skipped(FlushSkipReason),
    /// Every queued request was attempted once.
    Completed {
        /// Requests delivered and removed.
        replayed: usize,
        /// Failed requests kept for the next pass.
        retained: usize,
        /// Failed requests dropped for being older than the retention age.
        discarded: usize,
    },
}

struct FlushGuard<'a>(&'a AtomicBool);

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl OfflineQueue {
    /// Replays queued requests in enqueue order through `dispatcher`.
    ///
    /// At most one flush runs at a time; overlapping calls return
    /// `Skipped(InProgress)`. One failing request never stops the pass.
    /// Requests enqueued while the pass runs stay behind the retained ones.
    pub async fn flush(&self, dispatcher: &RequestDispatcher) -> AppResult<FlushReport> {
        if self
            .flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(FlushReport::Skipped(FlushSkipReason::InProgress));
        }
        let _guard = FlushGuard(&self.flushing);

        if !self.connectivity.is_online() {
            return Ok(FlushReport::Skipped(FlushSkipReason::Offline));
        }

        let pending = self.entries.lock().await.clone();
        if pending.is_empty() {
            return Ok(FlushReport::Skipped(FlushSkipReason::Empty));
        }

        let attempted = pending.len();
        let mut retained = Vec::new();
        let mut replayed = 0_usize;
        let mut discarded = 0_usize;

        for entry in pending {
            let description = entry.request.describe();
            let failure = match dispatcher.send(&entry.request).await {
                Ok(response) if response.is_success() => None,
                Ok(response) => Some(format!("status {}", response.status)),
                Err(error) => Some(error.to_string()),
            };

            let Some(failure) = failure else {
                replayed += 1;
                continue;
            };

            if entry.is_stale(self.clock.now()) {
                discarded += 1;
                warn!(request = %description, error = %failure, "discarding stale queued request");
            } else {
                warn!(request = %description, error = %failure, "queued request replay failed");
                retained.push(entry);
            }
        }

        let retained_count = retained.len();
        let (remaining, saved) = {
            let mut entries = self.entries.lock().await;
            let split = attempted.min(entries.len());
            let enqueued_during_flush: Vec<_> = entries.drain(split..).collect();
            *entries = retained;
            entries.extend(enqueued_during_flush);
            let saved = self.store.save(entries.as_slice()).await;
            (entries.len(), saved)
        };

        info!(
            replayed,
            retained = retained_count,
            discarded,
            remaining,
            "offline queue flushed"
        );

        if discarded > 0 {
            self.notifier
                .notify(SyncNotice::Discarded { count: discarded });
        }
        if retained_count == 0 && discarded == 0 && remaining == 0 {
            self.notifier.notify(SyncNotice::Synced { replayed });
        }

        if let Err(error) = &saved {
            warn!(error = %error, remaining, "failed to persist offline queue after flush");
        }
        saved?;

        Ok(FlushReport::Completed {
            replayed,
            retained: retained_count,
            discarded,
        })
    }
}
