use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use pennywise_core::{AppResult, Clock};
use pennywise_domain::{HttpResponse, OutboundRequest, QueuedRequest};
use tokio::sync::{Mutex, watch};

use crate::offline_queue::OfflineQueue;
use crate::request_dispatcher::RequestDispatcher;
use crate::sync_ports::{
    ConnectivityMonitor, HttpTransport, OfflineQueueStore, SyncNotice, SyncNotifier,
};

pub(crate) struct FakeTransport {
    script: Mutex<VecDeque<AppResult<HttpResponse>>>,
    statuses_by_url: HashMap<String, u16>,
    fallback_status: u16,
    sent: Mutex<Vec<OutboundRequest>>,
}

impl FakeTransport {
    pub(crate) fn always(status: u16) -> Self {
        Self::scripted(Vec::new(), status)
    }

    pub(crate) fn scripted(script: Vec<AppResult<HttpResponse>>, fallback_status: u16) -> Self {
        Self {
            script: Mutex::new(script.into()),
            statuses_by_url: HashMap::new(),
            fallback_status,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_status_for(mut self, url: &str, status: u16) -> Self {
        self.statuses_by_url.insert(url.to_owned(), status);
        self
    }

    pub(crate) async fn sent(&self) -> Vec<OutboundRequest> {
        self.sent.lock().await.clone()
    }

    pub(crate) async fn attempts(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: &OutboundRequest) -> AppResult<HttpResponse> {
        self.sent.lock().await.push(request.clone());

        if let Some(result) = self.script.lock().await.pop_front() {
            return result;
        }

        let status = self
            .statuses_by_url
            .get(request.url.as_str())
            .copied()
            .unwrap_or(self.fallback_status);
        Ok(HttpResponse::new(status))
    }
}

pub(crate) struct FakeConnectivity {
    sender: watch::Sender<bool>,
}

impl FakeConnectivity {
    pub(crate) fn new(online: bool) -> Self {
        let (sender, _receiver) = watch::channel(online);
        Self { sender }
    }

    pub(crate) fn set_online(&self, online: bool) {
        self.sender.send_replace(online);
    }
}

impl ConnectivityMonitor for FakeConnectivity {
    fn is_online(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

#[derive(Default)]
pub(crate) struct MemoryQueueStore {
    saved: Mutex<Vec<QueuedRequest>>,
    saves: Mutex<usize>,
}

impl MemoryQueueStore {
    pub(crate) fn with_entries(entries: Vec<QueuedRequest>) -> Self {
        Self {
            saved: Mutex::new(entries),
            saves: Mutex::new(0),
        }
    }

    pub(crate) async fn saved(&self) -> Vec<QueuedRequest> {
        self.saved.lock().await.clone()
    }

    pub(crate) async fn save_count(&self) -> usize {
        *self.saves.lock().await
    }
}

#[async_trait]
impl OfflineQueueStore for MemoryQueueStore {
    async fn load(&self) -> AppResult<Vec<QueuedRequest>> {
        Ok(self.saved.lock().await.clone())
    }

    async fn save(&self, entries: &[QueuedRequest]) -> AppResult<()> {
        *self.saved.lock().await = entries.to_vec();
        *self.saves.lock().await += 1;
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notices: StdMutex<Vec<SyncNotice>>,
}

impl RecordingNotifier {
    pub(crate) fn notices(&self) -> Vec<SyncNotice> {
        match self.notices.lock() {
            Ok(notices) => notices.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SyncNotifier for RecordingNotifier {
    fn notify(&self, notice: SyncNotice) {
        match self.notices.lock() {
            Ok(mut notices) => notices.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}

pub(crate) struct ManualClock {
    now: StdMutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(crate) fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: StdMutex::new(now),
        }
    }

    pub(crate) fn advance(&self, delta: TimeDelta) {
        match self.now.lock() {
            Ok(mut now) => *now += delta,
            Err(poisoned) => *poisoned.into_inner() += delta,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

pub(crate) struct Harness<T = FakeTransport> {
    pub(crate) transport: Arc<T>,
    pub(crate) connectivity: Arc<FakeConnectivity>,
    pub(crate) store: Arc<MemoryQueueStore>,
    pub(crate) notifier: Arc<RecordingNotifier>,
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) dispatcher: Arc<RequestDispatcher>,
}

pub(crate) async fn harness(
    transport: FakeTransport,
    online: bool,
    preloaded: Vec<QueuedRequest>,
) -> Harness<FakeTransport> {
    harness_with_transport(Arc::new(transport), online, preloaded).await
}

pub(crate) async fn harness_with_transport<T>(
    transport: Arc<T>,
    online: bool,
    preloaded: Vec<QueuedRequest>,
) -> Harness<T>
where
    T: HttpTransport + 'static,
{
    let connectivity = Arc::new(FakeConnectivity::new(online));
    let store = Arc::new(MemoryQueueStore::with_entries(preloaded));
    let notifier = Arc::new(RecordingNotifier::default());
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let queue = OfflineQueue::load(
        store.clone(),
        notifier.clone(),
        clock.clone(),
        connectivity.clone(),
    )
    .await
    .unwrap_or_else(|error| panic!("failed to load offline queue: {error}"));

    let dispatcher = Arc::new(RequestDispatcher::new(
        transport.clone(),
        connectivity.clone(),
        Arc::new(queue),
    ));

    Harness {
        transport,
        connectivity,
        store,
        notifier,
        clock,
        dispatcher,
    }
}
