use crate::domain::Position;
use serde::de::Error;
use serde::{Deserialize, Deserializer};

/// Accepts `{latitude, longitude}` as well as the short `{lat, lon}` form used by the coordinate
/// backend, and rejects coordinates outside of the valid ranges.
impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Coordinates {
            #[serde(alias = "lat")]
            latitude: f64,
            #[serde(alias = "lon")]
            longitude: f64,
        }

        let Coordinates { latitude, longitude } = Coordinates::deserialize(deserializer)?;
        check_range("latitude", latitude, 90.0)?;
        check_range("longitude", longitude, 180.0)?;

        Ok(Position::new(latitude, longitude))
    }
}

fn check_range<E: Error>(name: &str, value: f64, limit: f64) -> Result<(), E> {
    if (-limit..=limit).contains(&value) {
        Ok(())
    } else {
        Err(E::custom(format!("invalid {}: {}, must be between -{} and {}", name, value, limit, limit)))
    }
}
