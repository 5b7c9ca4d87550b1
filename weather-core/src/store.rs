//! Weather state store.
//!
//! Holds the one current [`WeatherSnapshot`] and is its only write path.
//! Every change goes through [`WeatherSnapshot::reduce`], a pure function from the previous
//! snapshot and a [`WeatherEvent`] to a new snapshot, which is then swapped
//! in wholesale and handed to observers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::model::{FetchPayload, Status, WeatherSnapshot};

/// Identity of one dispatch, handed out by [`WeatherStore::on_request_started`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// How completions of superseded requests are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Whichever completion arrives last is applied, even if its request
    /// started before a newer one.
    #[default]
    LastWriteWins,
    /// Completions of any request older than the most recently started one
    /// are dropped.
    LatestRequestWins,
}

/// Lifecycle events the store knows how to apply.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherEvent {
    RequestStarted,
    RequestSucceeded(FetchPayload),
    RequestFailed(String),
}

impl WeatherEvent {
    pub fn name(&self) -> &'static str {
        match self {
            WeatherEvent::RequestStarted => "RequestStarted",
            WeatherEvent::RequestSucceeded(_) => "RequestSucceeded",
            WeatherEvent::RequestFailed(_) => "RequestFailed",
        }
    }
}

impl WeatherSnapshot {
    /// Pure transition: (previous snapshot, event) -> next snapshot.
    ///
    /// Transitions are accepted from any state. `RequestStarted` keeps the
    /// previous success payload visible and clears `error`; `RequestFailed`
    /// drops the by-city payload so it never coexists with an error.
    pub fn reduce(&self, event: WeatherEvent) -> Self {
        match event {
            WeatherEvent::RequestStarted => WeatherSnapshot {
                status: Status::Loading,
                error: None,
                ..self.clone()
            },

            WeatherEvent::RequestSucceeded(FetchPayload::Report(report)) => WeatherSnapshot {
                status: Status::Succeeded,
                current: Some(report.current),
                local_time: Some(report.local_time),
                location_name: Some(report.location_name),
                forecast: Some(report.forecast),
                regions: self.regions.clone(),
                error: None,
            },

            WeatherEvent::RequestSucceeded(FetchPayload::Region { key, body }) => {
                let mut next = WeatherSnapshot {
                    status: Status::Succeeded,
                    error: None,
                    ..self.clone()
                };
                next.regions.insert(key, body);
                next
            }

            WeatherEvent::RequestFailed(message) => WeatherSnapshot {
                status: Status::Failed,
                regions: self.regions.clone(),
                error: Some(message),
                ..WeatherSnapshot::default()
            },
        }
    }
}

type Observer = Arc<dyn Fn(&WeatherSnapshot) + Send + Sync>;

#[derive(Debug, Default)]
struct Sequencer {
    next: u64,
    latest_started: Option<u64>,
}

impl Sequencer {
    fn issue(&mut self) -> RequestId {
        let id = self.next;
        self.next += 1;
        self.latest_started = Some(id);
        RequestId(id)
    }

    fn is_stale(&self, id: RequestId) -> bool {
        self.latest_started.is_some_and(|latest| id.0 < latest)
    }
}

/// Shared, thread-safe holder of the current snapshot.
///
/// Construct one per process (or per test) and pass it around as
/// `Arc<WeatherStore>`.
///
/// Observers run while the commit lock is held so every observer sees
/// transitions in commit order. An observer must therefore not call the
/// `on_request_*` methods itself; spawn a task for follow-up dispatches.
pub struct WeatherStore {
    policy: StalePolicy,
    sequencer: Mutex<Sequencer>,
    snapshot: RwLock<Arc<WeatherSnapshot>>,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    next_subscription: AtomicU64,
}

impl std::fmt::Debug for WeatherStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherStore")
            .field("policy", &self.policy)
            .field("status", &self.read().status)
            .field("observers", &lock(&self.observers).len())
            .finish()
    }
}

impl Default for WeatherStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WeatherStore {
    /// Store in `Idle` with the default last-write-wins policy.
    pub fn new() -> Self {
        Self::with_policy(StalePolicy::default())
    }

    pub fn with_policy(policy: StalePolicy) -> Self {
        Self {
            policy,
            sequencer: Mutex::new(Sequencer::default()),
            snapshot: RwLock::new(Arc::new(WeatherSnapshot::idle())),
            observers: Mutex::new(Vec::new()),
            next_subscription: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    /// Current committed snapshot. Never blocks on in-flight requests.
    pub fn read(&self) -> Arc<WeatherSnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Registers `observer` for every transition committed from now on.
    pub fn subscribe<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&WeatherSnapshot) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        lock(&self.observers).push((id, Arc::new(observer)));
        id
    }

    /// Stops delivery to `id`. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = lock(&self.observers);
        let before = observers.len();
        observers.retain(|(sub, _)| *sub != id);
        observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.observers).len()
    }

    /// Moves to `Loading` and returns the id of the new request.
    pub fn on_request_started(&self) -> RequestId {
        let mut seq = lock(&self.sequencer);
        let id = seq.issue();
        self.apply(&seq, WeatherEvent::RequestStarted);
        id
    }

    /// Moves to `Succeeded` with `payload`.
    ///
    /// Returns `false` when the completion was dropped as stale.
    pub fn on_request_succeeded(&self, request: RequestId, payload: FetchPayload) -> bool {
        self.complete(request, WeatherEvent::RequestSucceeded(payload))
    }

    /// Moves to `Failed` with `message`.
    ///
    /// Returns `false` when the completion was dropped as stale.
    pub fn on_request_failed(&self, request: RequestId, message: impl Into<String>) -> bool {
        self.complete(request, WeatherEvent::RequestFailed(message.into()))
    }

    /// Moves straight to `Failed` for a request refused before it started.
    ///
    /// The refusal counts as the newest request, so under
    /// [`StalePolicy::LatestRequestWins`] older in-flight completions are
    /// dropped afterwards.
    pub fn on_request_rejected(&self, message: impl Into<String>) {
        let mut seq = lock(&self.sequencer);
        seq.issue();
        self.apply(&seq, WeatherEvent::RequestFailed(message.into()));
    }

    fn complete(&self, request: RequestId, event: WeatherEvent) -> bool {
        let seq = lock(&self.sequencer);
        if self.policy == StalePolicy::LatestRequestWins && seq.is_stale(request) {
            tracing::debug!(
                request = request.0,
                event = event.name(),
                "dropping completion of superseded request"
            );
            return false;
        }
        self.apply(&seq, event);
        true
    }

    // `_seq` proves the caller holds the commit lock.
    fn apply(&self, _seq: &MutexGuard<'_, Sequencer>, event: WeatherEvent) {
        let name = event.name();
        let next = Arc::new(self.read().reduce(event));

        *self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::clone(&next);

        tracing::debug!(event = name, status = %next.status, "weather snapshot committed");

        let observers: Vec<Observer> = lock(&self.observers)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in observers {
            observer(&next);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
