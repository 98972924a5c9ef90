use crate::domain::Position;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A raw reading as delivered by a position source.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Capture time reported by the source, if it provides one.
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, timestamp: Option<DateTime<Utc>>) -> Self {
        PositionSample {
            latitude,
            longitude,
            timestamp,
        }
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}
