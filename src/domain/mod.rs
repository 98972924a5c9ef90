mod compass_point;
mod position;
mod position_sample;
mod track_point;

pub use compass_point::CompassPoint;
pub use position::Position;
pub use position_sample::PositionSample;
pub use track_point::{TrackPoint, TrackPointError};
