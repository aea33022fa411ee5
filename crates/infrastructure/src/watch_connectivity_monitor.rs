use std::sync::Arc;
use std::time::Duration;

use pennywise_application::ConnectivityMonitor;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// Connectivity state held in a `watch` channel.
///
/// Subscribers are woken only when the state actually flips.
pub struct WatchConnectivityMonitor {
    sender: watch::Sender<bool>,
}

impl WatchConnectivityMonitor {
    /// Creates a monitor with the given initial state.
    #[must_use]
    pub fn new(online: bool) -> Self {
        let (sender, _receiver) = watch::channel(online);
        Self { sender }
    }

    /// Records the latest observed state.
    pub fn set_online(&self, online: bool) {
        let changed = self.sender.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });

        if changed {
            info!(online, "connectivity changed");
        }
    }

    /// Requests `health_url` once and records the result.
    ///
    /// Any HTTP response counts as online. Transport failures and probes
    /// slower than `timeout` count as offline.
    pub async fn probe_once(
        &self,
        http_client: &reqwest::Client,
        health_url: &str,
        timeout: Duration,
    ) -> bool {
        let online = tokio::time::timeout(timeout, http_client.get(health_url).send())
            .await
            .is_ok_and(|response| response.is_ok());
        self.set_online(online);
        online
    }

    /// Probes `health_url` every `interval`, starting immediately.
    ///
    /// Each probe is bounded by `interval`. The task runs until aborted.
    pub fn spawn_probe(
        self: &Arc<Self>,
        http_client: reqwest::Client,
        health_url: String,
        interval: Duration,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);

        tokio::spawn(async move {
            loop {
                monitor
                    .probe_once(&http_client, health_url.as_str(), interval)
                    .await;
                tokio::time::sleep(interval).await;
            }
        })
    }
}

impl ConnectivityMonitor for WatchConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pennywise_application::ConnectivityMonitor;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::WatchConnectivityMonitor;

    const UNAVAILABLE_RESPONSE: &[u8] =
        b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

    #[tokio::test]
    async fn subscribers_see_only_real_transitions() {
        let monitor = WatchConnectivityMonitor::new(false);
        let mut receiver = monitor.subscribe();

        monitor.set_online(false);
        assert!(!receiver.has_changed().unwrap_or(true));

        monitor.set_online(true);
        assert!(receiver.has_changed().unwrap_or(false));
        assert!(*receiver.borrow_and_update());
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn probe_marks_unreachable_server_offline() {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|error| panic!("failed to bind test listener: {error}"));
        let address = listener
            .local_addr()
            .unwrap_or_else(|error| panic!("failed to read listener address: {error}"));
        drop(listener);

        let monitor = Arc::new(WatchConnectivityMonitor::new(true));
        let mut receiver = monitor.subscribe();
        let probe = monitor.spawn_probe(
            reqwest::Client::new(),
            format!("http://{address}/health"),
            Duration::from_secs(60),
        );

        let changed = tokio::time::timeout(Duration::from_secs(5), receiver.changed()).await;
        probe.abort();

        assert!(matches!(changed, Ok(Ok(()))));
        assert!(!monitor.is_online());
    }

    async fn bind() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|error| panic!("failed to bind test listener: {error}"));
        let address = listener
            .local_addr()
            .unwrap_or_else(|error| panic!("failed to read listener address: {error}"));
        (listener, format!("http://{address}/health"))
    }

    #[tokio::test]
    async fn first_check_sets_initial_state_from_server() {
        let (listener, health_url) = bind().await;
        let server = tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buffer = [0_u8; 1024];
                let _ = socket.read(&mut buffer).await;
                let _ = socket.write_all(UNAVAILABLE_RESPONSE).await;
            }
        });

        let monitor = WatchConnectivityMonitor::new(false);
        let online = monitor
            .probe_once(&reqwest::Client::new(), &health_url, Duration::from_secs(5))
            .await;
        server.abort();

        assert!(online);
        assert!(monitor.is_online());
    }

    #[tokio::test]
    async fn first_check_gives_up_after_timeout() {
        let (listener, health_url) = bind().await;
        let server = tokio::spawn(async move {
            let accepted = listener.accept().await;
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(accepted);
        });

        let monitor = WatchConnectivityMonitor::new(true);
        let online = monitor
            .probe_once(
                &reqwest::Client::new(),
                &health_url,
                Duration::from_millis(200),
            )
            .await;
        server.abort();

        assert!(!online);
        assert!(!monitor.is_online());
    }
}
