use crate::geodesy::{destination_point, haversine_distance_meters, initial_bearing_degrees};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}°, {:.6}°)", self.latitude, self.longitude)
    }
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Position { latitude, longitude }
    }

    /// Distance in meters along the great circle.
    pub fn distance_to(&self, other: &Position) -> f64 {
        haversine_distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Initial bearing towards `other` in degrees, `None` if both positions coincide.
    pub fn bearing_to(&self, other: &Position) -> Option<f64> {
        if self == other {
            return None;
        }

        Some(initial_bearing_degrees(self.latitude, self.longitude, other.latitude, other.longitude))
    }

    /// Projects this position by `distance_m` meters along `bearing_deg`, `None` if the
    /// computation breaks down numerically.
    pub fn project(&self, bearing_deg: f64, distance_m: f64) -> Option<Position> {
        let (latitude, longitude) = destination_point(self.latitude, self.longitude, bearing_deg, distance_m);
        if latitude.is_nan() || longitude.is_nan() {
            return None;
        }

        Some(Position::new(latitude, longitude))
    }
}
