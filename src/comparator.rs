use crate::domain::{CompassPoint, Position};
use crate::geodesy::degrees_to_gon;
use std::fmt;
use tracing::debug;

/// Distance and direction from "my" position to a reference position. Every field is `None`
/// unless both positions are known. Bearing and indicator are also `None` when the positions
/// coincide.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ComparisonResult {
    pub distance_m: Option<f64>,
    pub bearing_deg: Option<f64>,
    pub bearing_gon: Option<f64>,
    pub compass_point: Option<CompassPoint>,
    /// Fixed-length line from my position towards the reference.
    pub indicator_line: Option<(Position, Position)>,
}

impl fmt::Display for ComparisonResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.distance_m, self.bearing_gon, self.compass_point) {
            (Some(distance), Some(gon), Some(compass_point)) => {
                write!(f, "{:.0} m towards {:.1} gon ({})", distance, gon, compass_point.name())
            }
            (Some(distance), _, _) => write!(f, "{:.0} m", distance),
            _ => write!(f, "unknown"),
        }
    }
}

/// Computes the comparison from scratch.
pub fn compare(my_position: Option<Position>, reference: Option<Position>, indicator_length_m: f64) -> ComparisonResult {
    let (Some(my_position), Some(reference)) = (my_position, reference) else {
        return ComparisonResult::default();
    };

    let distance_m = my_position.distance_to(&reference);
    let Some(bearing_deg) = my_position.bearing_to(&reference) else {
        return ComparisonResult {
            distance_m: Some(distance_m),
            ..ComparisonResult::default()
        };
    };

    ComparisonResult {
        distance_m: Some(distance_m),
        bearing_deg: Some(bearing_deg),
        bearing_gon: Some(degrees_to_gon(bearing_deg)),
        compass_point: Some(CompassPoint::from_bearing(bearing_deg)),
        indicator_line: my_position
            .project(bearing_deg, indicator_length_m)
            .map(|end| (my_position, end)),
    }
}

/// Holds the two sides of a comparison and recomputes the result whenever one of them changes.
#[derive(Debug)]
pub struct ReferenceComparator {
    my_position: Option<Position>,
    reference: Option<Position>,
    indicator_length_m: f64,
    result: ComparisonResult,
}

impl ReferenceComparator {
    pub fn new(indicator_length_m: f64) -> Self {
        ReferenceComparator {
            my_position: None,
            reference: None,
            indicator_length_m,
            result: ComparisonResult::default(),
        }
    }

    pub fn update(&mut self, my_position: Option<Position>, reference: Option<Position>) -> ComparisonResult {
        self.my_position = my_position;
        self.reference = reference;
        self.recompute()
    }

    pub fn set_my_position(&mut self, my_position: Option<Position>) -> ComparisonResult {
        self.update(my_position, self.reference)
    }

    pub fn set_reference(&mut self, reference: Option<Position>) -> ComparisonResult {
        self.update(self.my_position, reference)
    }

    pub fn my_position(&self) -> Option<Position> {
        self.my_position
    }

    pub fn reference(&self) -> Option<Position> {
        self.reference
    }

    pub fn result(&self) -> ComparisonResult {
        self.result
    }

    fn recompute(&mut self) -> ComparisonResult {
        self.result = compare(self.my_position, self.reference, self.indicator_length_m);
        debug!("🧭 Reference is {}", self.result);
        self.result
    }
}
