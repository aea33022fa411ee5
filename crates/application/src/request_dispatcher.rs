//! Retrying request dispatcher for the client pipeline.
//!
//! Every call goes through one bounded retry loop. Only 429 responses and
//! network-level failures are retried; every other outcome is handed back to
//! the caller untouched. When the client is offline, mutating calls may be
//! diverted into the [`OfflineQueue`] instead of failing outright.

use std::sync::{Arc, RwLock};

use pennywise_core::{AppError, AppResult};
use pennywise_domain::{HttpResponse, OutboundRequest, RetryPolicy};
use tracing::warn;

use crate::offline_queue::{FlushReport, OfflineQueue};
use crate::sync_ports::{ConnectivityMonitor, HttpTransport};

/// Per-call dispatch switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchOptions {
    /// Store mutating calls for replay when the client is offline.
    pub queue_when_offline: bool,
}

impl DispatchOptions {
    /// Options that divert offline mutations into the queue.
    #[must_use]
    pub fn queued() -> Self {
        Self {
            queue_when_offline: true,
        }
    }
}

/// Sends requests with bounded retries and offline handling.
pub struct RequestDispatcher {
    transport: Arc<dyn HttpTransport>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    queue: Arc<OfflineQueue>,
    retry_policy: RetryPolicy,
    access_token: RwLock<Option<String>>,
}

impl RequestDispatcher {
    /// Creates a dispatcher with the default retry policy and no credentials.
    #[must_use]
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        queue: Arc<OfflineQueue>,
    ) -> Self {
        Self {
            transport,
            connectivity,
            queue,
            retry_policy: RetryPolicy::default(),
            access_token: RwLock::new(None),
        }
    }

    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry_policy: RetryPolicy) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    /// Sets the bearer token attached to every attempt.
    #[must_use]
    pub fn with_access_token(self, access_token: Option<String>) -> Self {
        self.set_access_token(access_token);
        self
    }

    /// Replaces the bearer token. Queued requests pick up the new value on replay.
    pub fn set_access_token(&self, access_token: Option<String>) {
        let access_token = access_token.filter(|token| !token.trim().is_empty());
        match self.access_token.write() {
            Ok(mut slot) => *slot = access_token,
            Err(poisoned) => *poisoned.into_inner() = access_token,
        }
    }

    /// Returns the queue this dispatcher diverts offline mutations into.
    #[must_use]
    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// Dispatches one logical request.
    ///
    /// Offline behaviour:
    /// - mutating request with `queue_when_offline`: stored, then
    ///   `AppError::OfflineQueued`;
    /// - anything else: `AppError::Offline` without touching the network.
    pub async fn dispatch(
        &self,
        request: OutboundRequest,
        options: DispatchOptions,
    ) -> AppResult<HttpResponse> {
        if !self.connectivity.is_online() {
            let description = request.describe();
            if options.queue_when_offline && request.method.is_mutating() {
                self.queue.enqueue(request).await?;
                return Err(AppError::OfflineQueued(description));
            }

            return Err(AppError::Offline(format!("no network for {description}")));
        }

        self.send_with_retry(&request).await
    }

    /// Dispatches without ever queuing. Used for replay.
    pub async fn send(&self, request: &OutboundRequest) -> AppResult<HttpResponse> {
        if !self.connectivity.is_online() {
            return Err(AppError::Offline(format!(
                "no network for {}",
                request.describe()
            )));
        }

        self.send_with_retry(request).await
    }

    /// Replays the offline queue through this dispatcher.
    pub async fn flush_queue(&self) -> AppResult<FlushReport> {
        self.queue.flush(self).await
    }

    async fn send_with_retry(&self, request: &OutboundRequest) -> AppResult<HttpResponse> {
        let prepared = self.authorize(request);
        let mut attempt = 0_u32;

        loop {
            match self.transport.send(&prepared).await {
                Ok(response)
                    if response.is_rate_limited() && self.retry_policy.should_retry(attempt) =>
                {
                    let delay = self
                        .retry_policy
                        .delay_for(attempt, response.retry_after_seconds());
                    warn!(
                        request = %prepared.describe(),
                        attempt,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "rate limited, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Ok(response) => return Ok(response),
                Err(AppError::Network(message)) if self.retry_policy.should_retry(attempt) => {
                    let delay = self.retry_policy.delay_for(attempt, None);
                    warn!(
                        request = %prepared.describe(),
                        attempt,
                        error = %message,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "network failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(error) => return Err(error),
            }

            attempt = attempt.saturating_add(1);
        }
    }

    fn authorize(&self, request: &OutboundRequest) -> OutboundRequest {
        let token = match self.access_token.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };

        match token {
            Some(token) => request
                .clone()
                .with_header("Authorization", format!("Bearer {token}")),
            None => request.clone(),
        }
    }
}
