use crate::domain::TrackPoint;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Ordered trajectory of the current recording session.
///
/// Insertion order is chronological order: a point is only accepted if it is not earlier than the
/// last accepted point. Points with the same timestamp are accepted.
#[derive(Debug, Default)]
pub struct TrajectoryStore {
    points: Vec<TrackPoint>,
}

impl TrajectoryStore {
    pub fn new() -> Self {
        TrajectoryStore { points: Vec::new() }
    }

    pub fn append(&mut self, point: TrackPoint) -> Result<(), RejectedSample> {
        if let Some(last) = self.points.last()
            && point.timestamp() < last.timestamp()
        {
            return Err(RejectedSample {
                last: last.timestamp(),
                rejected: point.timestamp(),
            });
        }

        self.points.push(point);
        Ok(())
    }

    pub fn all(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// Ordered `(latitude, longitude)` pairs, the shape a map draws a path from.
pub fn polyline(points: &[TrackPoint]) -> Vec<(f64, f64)> {
    points.iter().map(|point| (point.latitude(), point.longitude())).collect()
}

#[derive(Error, Debug, PartialEq)]
#[error("sample at {rejected} is earlier than the last accepted sample at {last}")]
pub struct RejectedSample {
    pub last: DateTime<Utc>,
    pub rejected: DateTime<Utc>,
}
