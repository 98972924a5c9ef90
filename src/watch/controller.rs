use crate::domain::TrackPoint;
use crate::position_source::{PositionError, PositionEvent, PositionSource, SourceWatchId, WatchOptions};
use crate::trajectory_store::TrajectoryStore;
use crate::watch::listener::{Callbacks, WatchListener};
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::sync::mpsc::{self, Receiver};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// Identifies one watch session. Only the handle of the running session is valid, stopping it or
/// starting another session invalidates it for good.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchHandle {
    generation: u64,
}

/// What happened to a single position event.
#[derive(Debug, PartialEq)]
pub enum SampleOutcome {
    /// Appended, the trajectory now has this many points.
    Accepted(usize),
    /// Earlier than the last accepted sample, dropped.
    Rejected,
    /// Reported to the listener as an error.
    Failed,
    /// The handle is no longer valid, nothing happened.
    Dropped,
}

/// Runs at most one position watch at a time and records its samples into a trajectory.
pub struct PositionWatchController {
    source: Arc<dyn PositionSource>,
    options: WatchOptions,
    buffer_size: usize,
    next_generation: AtomicU64,
    inner: Arc<Inner>,
}

struct Inner {
    observer_id: String,
    state: Mutex<WatchState>,
}

#[derive(Default)]
struct WatchState {
    store: TrajectoryStore,
    active: Option<ActiveWatch>,
}

struct ActiveWatch {
    handle: WatchHandle,
    source_id: SourceWatchId,
    listener: Arc<dyn WatchListener>,
    pump: JoinHandle<()>,
}

impl PositionWatchController {
    pub fn new(source: Arc<dyn PositionSource>, observer_id: impl Into<String>, options: WatchOptions, buffer_size: usize) -> Self {
        PositionWatchController {
            source,
            options,
            buffer_size: buffer_size.max(1),
            next_generation: AtomicU64::new(1),
            inner: Arc::new(Inner {
                observer_id: observer_id.into(),
                state: Mutex::new(WatchState::default()),
            }),
        }
    }

    pub async fn start_watch<F, E>(&self, on_sample: F, on_error: E) -> Result<WatchHandle, PositionError>
    where
        F: Fn(&[TrackPoint]) + Send + Sync + 'static,
        E: Fn(&PositionError) + Send + Sync + 'static,
    {
        self.start_watch_with(Arc::new(Callbacks::new(on_sample, on_error))).await
    }

    /// Starts a fresh session: a running watch is stopped first and the trajectory is cleared
    /// before the first sample arrives.
    #[instrument(skip_all)]
    pub async fn start_watch_with(&self, listener: Arc<dyn WatchListener>) -> Result<WatchHandle, PositionError> {
        let mut state = self.inner.state.lock().await;
        if let Some(previous) = state.active.take() {
            info!(generation = previous.handle.generation, "🛰️ Stopping the running watch first");
            self.release(previous);
        }
        state.store.clear();

        let handle = WatchHandle {
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed),
        };
        let (tx, rx) = mpsc::channel(self.buffer_size);
        let source_id = self.source.watch_position(&self.options, tx)?;
        let pump = tokio::spawn(pump(self.inner.clone(), handle, rx));

        state.active = Some(ActiveWatch {
            handle,
            source_id,
            listener,
            pump,
        });
        info!(generation = handle.generation, "🛰️ Started position watch");
        Ok(handle)
    }

    /// Stops the watch and clears the trajectory. Returns false, and does nothing, if the handle
    /// is no longer valid.
    #[instrument(skip(self))]
    pub async fn stop_watch(&self, handle: WatchHandle) -> bool {
        let mut state = self.inner.state.lock().await;
        match state.active.take_if(|active| active.handle == handle) {
            Some(active) => {
                self.release(active);
                state.store.clear();
                info!(generation = handle.generation, "🛰️ Stopped position watch");
                true
            }
            None => {
                debug!(generation = handle.generation, "🛰️ Ignoring stop for an inactive watch");
                false
            }
        }
    }

    /// Stops whatever watch is running and clears the trajectory.
    pub async fn reset(&self) {
        let mut state = self.inner.state.lock().await;
        if let Some(active) = state.active.take() {
            self.release(active);
        }
        state.store.clear();
    }

    pub async fn is_valid(&self, handle: WatchHandle) -> bool {
        self.inner.state.lock().await.active.as_ref().is_some_and(|active| active.handle == handle)
    }

    pub async fn trajectory(&self) -> Vec<TrackPoint> {
        self.inner.state.lock().await.store.all().to_vec()
    }

    pub async fn last_point(&self) -> Option<TrackPoint> {
        self.inner.state.lock().await.store.last().cloned()
    }

    /// Processes a position event as if it was delivered by the watch identified by `handle`.
    pub async fn deliver(&self, handle: WatchHandle, event: PositionEvent) -> SampleOutcome {
        self.inner.deliver(handle, event).await
    }

    fn release(&self, active: ActiveWatch) {
        self.source.clear_watch(active.source_id);
        active.pump.abort();
    }
}

impl Drop for PositionWatchController {
    fn drop(&mut self) {
        if let Ok(mut state) = self.inner.state.try_lock()
            && let Some(active) = state.active.take()
        {
            self.release(active);
        }
    }
}

impl Inner {
    async fn deliver(&self, handle: WatchHandle, event: PositionEvent) -> SampleOutcome {
        let mut state = self.state.lock().await;
        let WatchState { store, active } = &mut *state;

        let Some(active) = active.as_ref().filter(|active| active.handle == handle) else {
            debug!(generation = handle.generation, "🔸 Dropping event of an inactive watch");
            return SampleOutcome::Dropped;
        };

        let sample = match event {
            PositionEvent::Sample(sample) => sample,
            PositionEvent::Error(error) => {
                warn!("⚠️ Position source reported an error: {}", error);
                active.listener.on_error(&error);
                return SampleOutcome::Failed;
            }
        };

        let timestamp = sample.timestamp.unwrap_or_else(Utc::now);
        let point = match TrackPoint::new(self.observer_id.as_str(), timestamp, sample.latitude, sample.longitude) {
            Ok(point) => point,
            Err(e) => {
                let error = PositionError::InvalidSample(e);
                warn!("⚠️ {}", error);
                active.listener.on_error(&error);
                return SampleOutcome::Failed;
            }
        };

        match store.append(point) {
            Ok(()) => {
                debug!(points = store.len(), "🟢 Recorded {}", sample.position());
                active.listener.on_sample(store.all());
                SampleOutcome::Accepted(store.len())
            }
            Err(rejected) => {
                debug!("🔸 Dropping out-of-order sample: {}", rejected);
                SampleOutcome::Rejected
            }
        }
    }
}

async fn pump(inner: Arc<Inner>, handle: WatchHandle, mut rx: Receiver<PositionEvent>) {
    while let Some(event) = rx.recv().await {
        inner.deliver(handle, event).await;
    }
    debug!(generation = handle.generation, "Position events ended");
}
