use crate::domain::{PositionSample, TrackPointError};
use crate::sse::SseError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::Sender;

/// Delivers the device position, either once or continuously until the watch is cleared.
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, options: &WatchOptions) -> Result<PositionSample, PositionError>;

    /// Starts delivering position events to `tx`. Delivery stops after `clear_watch` or when the
    /// receiver is dropped.
    fn watch_position(&self, options: &WatchOptions, tx: Sender<PositionEvent>) -> Result<SourceWatchId, PositionError>;

    /// Stops a watch. Unknown or already cleared ids are ignored.
    fn clear_watch(&self, id: SourceWatchId);
}

/// Id of a subscription on the source side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceWatchId(pub u64);

#[derive(Debug)]
pub enum PositionEvent {
    Sample(PositionSample),
    Error(PositionError),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct WatchOptions {
    #[serde(default = "default_high_accuracy")]
    pub high_accuracy: bool,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
    /// Oldest acceptable sample, `None` accepts samples of any age.
    #[serde(default, with = "humantime_serde")]
    pub maximum_age: Option<Duration>,
}

fn default_high_accuracy() -> bool {
    true
}

fn default_timeout() -> Duration {
    Duration::from_secs(5)
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions {
            high_accuracy: default_high_accuracy(),
            timeout: default_timeout(),
            maximum_age: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum PositionError {
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("no position within {0:?}")]
    Timeout(Duration),
    #[error("position request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("position stream failed: {0}")]
    Stream(#[from] SseError),
    #[error("invalid position sample: {0}")]
    InvalidSample(#[from] TrackPointError),
}
