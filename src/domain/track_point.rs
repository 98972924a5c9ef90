use crate::domain::Position;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// One accepted sample of a trajectory. Immutable once constructed.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackPoint {
    observer_id: String,
    timestamp: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
}

impl TrackPoint {
    pub fn new(observer_id: impl Into<String>, timestamp: DateTime<Utc>, latitude: f64, longitude: f64) -> Result<Self, TrackPointError> {
        let observer_id = observer_id.into();
        if observer_id.trim().is_empty() {
            return Err(TrackPointError::EmptyObserverId);
        }

        // Track files can't escape the field separator
        if observer_id.contains(',') {
            return Err(TrackPointError::CommaInObserverId(observer_id));
        }

        // Written as a contains check so NaN is rejected as well
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(TrackPointError::LatitudeOutOfRange(latitude));
        }

        if !(-180.0..=180.0).contains(&longitude) {
            return Err(TrackPointError::LongitudeOutOfRange(longitude));
        }

        Ok(TrackPoint {
            observer_id,
            timestamp,
            latitude,
            longitude,
        })
    }

    pub fn observer_id(&self) -> &str {
        &self.observer_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum TrackPointError {
    #[error("observer id must not be empty")]
    EmptyObserverId,
    #[error("observer id '{0}' must not contain a comma")]
    CommaInObserverId(String),
    #[error("latitude {0} is outside of [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside of [-180, 180]")]
    LongitudeOutOfRange(f64),
}
