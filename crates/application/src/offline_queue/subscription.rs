use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::request_dispatcher::RequestDispatcher;
use crate::sync_ports::ConnectivityMonitor;

use super::FlushReport;

/// Handle for the reconnect listener. Dropping it stops the listener.
pub struct FlushSubscription {
    handle: JoinHandle<()>,
    in_flight: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl FlushSubscription {
    /// Stops listening for reconnects. A flush already running is not interrupted.
    pub fn cancel(self) {
        drop(self);
    }

    /// Stops listening and waits for a reconnect flush that is still running.
    ///
    /// Once this returns, the queue store reflects every delivered request.
    pub async fn shutdown(mut self) {
        self.handle.abort();
        let _ = (&mut self.handle).await;
        let in_flight = lock(&self.in_flight).take();

        if let Some(flush) = in_flight {
            if let Err(error) = flush.await {
                warn!(error = %error, "reconnect flush task ended abnormally");
            }
        }
    }

    /// Returns whether the listener task is still running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

fn lock(in_flight: &Mutex<Option<JoinHandle<()>>>) -> MutexGuard<'_, Option<JoinHandle<()>>> {
    match in_flight.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Drop for FlushSubscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Flushes the dispatcher's queue on every offline to online transition.
///
/// The initial state counts as a transition, so a client that starts online
/// with a restored queue replays it immediately. Each flush runs in its own
/// task; a transition seen while one is still running is ignored.
pub fn subscribe_flush_on_reconnect(
    dispatcher: Arc<RequestDispatcher>,
    connectivity: Arc<dyn ConnectivityMonitor>,
) -> FlushSubscription {
    let mut receiver = connectivity.subscribe();
    let in_flight = Arc::new(Mutex::new(None::<JoinHandle<()>>));
    let listener_in_flight = Arc::clone(&in_flight);

    let handle = tokio::spawn(async move {
        let mut was_online = false;

        loop {
            let online = *receiver.borrow_and_update();
            if online && !was_online {
                let mut slot = lock(&listener_in_flight);
                if slot.as_ref().is_some_and(|flush| !flush.is_finished()) {
                    info!("reconnect flush already running");
                } else {
                    let dispatcher = Arc::clone(&dispatcher);
                    *slot = Some(tokio::spawn(async move {
                        match dispatcher.flush_queue().await {
                            Ok(FlushReport::Skipped(reason)) => {
                                info!(?reason, "offline queue flush skipped");
                            }
                            Ok(FlushReport::Completed { .. }) => {}
                            Err(error) => {
                                warn!(error = %error, "offline queue flush failed");
                            }
                        }
                    }));
                }
            }
            was_online = online;

            if receiver.changed().await.is_err() {
                break;
            }
        }
    });

    FlushSubscription { handle, in_flight }
}
