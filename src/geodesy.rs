use crate::domain::Position;
use std::f64::consts::PI;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Threshold below which cos(latitude) is treated as zero (at a pole).
const POLE_EPSILON: f64 = 1e-6;

pub fn to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}

pub fn to_degrees(radians: f64) -> f64 {
    radians * 180.0 / PI
}

/// Great-circle distance between two points using the Haversine formula.
/// Read more here: https://en.wikipedia.org/wiki/Haversine_formula
/// Returns the distance in meters.
pub fn haversine_distance_meters(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let phi_a = to_radians(lat_a);
    let phi_b = to_radians(lat_b);
    let delta_phi = to_radians(lat_b - lat_a);
    let delta_lambda = to_radians(lon_b - lon_a);

    let a = (delta_phi / 2.0).sin().powi(2) + phi_a.cos() * phi_b.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Forward azimuth from A to B in degrees, clockwise from true north, in [0, 360).
///
/// The value is meaningless when A and B coincide, callers should check for that first.
pub fn initial_bearing_degrees(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let phi_a = to_radians(lat_a);
    let phi_b = to_radians(lat_b);
    let delta_lambda = to_radians(lon_b - lon_a);

    let y = delta_lambda.sin() * phi_b.cos();
    let x = phi_a.cos() * phi_b.sin() - phi_a.sin() * phi_b.cos() * delta_lambda.cos();

    normalize(to_degrees(y.atan2(x)), 360.0)
}

/// Converts degrees to gon (400 gon is a full circle), normalized into [0, 400).
pub fn degrees_to_gon(degrees: f64) -> f64 {
    normalize(degrees * 10.0 / 9.0, 400.0)
}

/// Projects a point forward along a great circle.
/// bearing: degrees (0-360, where 0 is North)
/// distance: meters
///
/// Returns (latitude, longitude) with the longitude normalized to [-180, 180). Not stable near
/// the poles or for distances close to half the circumference, the result may contain NaN.
pub fn destination_point(lat: f64, lon: f64, bearing_deg: f64, distance_m: f64) -> (f64, f64) {
    let phi_1 = to_radians(lat);
    let lambda_1 = to_radians(lon);
    let theta = to_radians(bearing_deg);
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let phi_2 = (phi_1.sin() * angular_distance.cos() + phi_1.cos() * angular_distance.sin() * theta.cos()).asin();
    let lambda_2 = lambda_1 + (theta.sin() * angular_distance.sin() * phi_1.cos()).atan2(angular_distance.cos() - phi_1.sin() * phi_2.sin());

    (to_degrees(phi_2), normalize(to_degrees(lambda_2) + 180.0, 360.0) - 180.0)
}

/// Wraps a value into [0, period). Handles negatives and values more than one period away.
fn normalize(value: f64, period: f64) -> f64 {
    let wrapped = value.rem_euclid(period);
    // rem_euclid rounds tiny negative values up to exactly `period`
    if wrapped >= period { wrapped - period } else { wrapped }
}

/// Axis-aligned area on the map, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn contains(&self, position: &Position) -> bool {
        (self.south..=self.north).contains(&position.latitude) && (self.west..=self.east).contains(&position.longitude)
    }
}

/// A square with the given side length centered on `center`, using a flat approximation that is
/// fine for a few kilometers. Returns `None` at the poles, where the longitude span is undefined.
pub fn bounding_square(center: Position, side_m: f64) -> Option<BoundingBox> {
    let half_side = side_m / 2.0;
    let cos_lat = to_radians(center.latitude).cos();
    if cos_lat.abs() < POLE_EPSILON {
        return None;
    }

    let delta_lat = to_degrees(half_side / EARTH_RADIUS_M);
    let delta_lon = to_degrees(half_side / (EARTH_RADIUS_M * cos_lat));

    Some(BoundingBox {
        south: center.latitude - delta_lat,
        west: center.longitude - delta_lon,
        north: center.latitude + delta_lat,
        east: center.longitude + delta_lon,
    })
}
