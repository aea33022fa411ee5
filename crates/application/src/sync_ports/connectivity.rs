use tokio::sync::watch;

/// Port exposing the client's view of network reachability.
pub trait ConnectivityMonitor: Send + Sync {
    /// Returns the last known state.
    fn is_online(&self) -> bool;

    /// Subscribes to state changes. The receiver starts at the current state.
    fn subscribe(&self) -> watch::Receiver<bool>;
}
