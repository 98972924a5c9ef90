use crate::domain::PositionSample;
use crate::position_source::{PositionError, PositionEvent, PositionSource, SourceWatchId, WatchOptions};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc::Sender;

/// In-memory position source that lets tests push events into a watch.
#[derive(Debug, Default)]
pub struct FakePositionSource {
    current: Mutex<Option<PositionSample>>,
    watches: Mutex<HashMap<SourceWatchId, Sender<PositionEvent>>>,
    cleared: Mutex<Vec<SourceWatchId>>,
    next_id: Mutex<u64>,
}

impl FakePositionSource {
    pub fn with_current(sample: PositionSample) -> Self {
        let source = FakePositionSource::default();
        *source.current.lock().unwrap() = Some(sample);
        source
    }

    pub fn active_watches(&self) -> Vec<SourceWatchId> {
        let mut ids = self.watches.lock().unwrap().keys().copied().collect::<Vec<_>>();
        ids.sort_by_key(|id| id.0);
        ids
    }

    pub fn cleared(&self) -> Vec<SourceWatchId> {
        self.cleared.lock().unwrap().clone()
    }

    /// Sends an event into the given watch, returns false if nobody is listening anymore.
    pub async fn emit(&self, id: SourceWatchId, event: PositionEvent) -> bool {
        let tx = self.watches.lock().unwrap().get(&id).cloned();
        match tx {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    /// Keeps a sender around after the watch was cleared, like a callback that is already in flight.
    pub fn leak_sender(&self, id: SourceWatchId) -> Option<Sender<PositionEvent>> {
        self.watches.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl PositionSource for FakePositionSource {
    async fn current_position(&self, _options: &WatchOptions) -> Result<PositionSample, PositionError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| PositionError::Unavailable("permission denied".to_string()))
    }

    fn watch_position(&self, _options: &WatchOptions, tx: Sender<PositionEvent>) -> Result<SourceWatchId, PositionError> {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let id = SourceWatchId(*next_id);
        self.watches.lock().unwrap().insert(id, tx);
        Ok(id)
    }

    fn clear_watch(&self, id: SourceWatchId) {
        if self.watches.lock().unwrap().remove(&id).is_some() {
            self.cleared.lock().unwrap().push(id);
        }
    }
}
