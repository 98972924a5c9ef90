use crate::domain::TrackPoint;
use crate::position_source::PositionError;

/// Receives the outcome of a position watch, typically the map display.
pub trait WatchListener: Send + Sync {
    /// Called with the whole trajectory after every accepted sample.
    fn on_sample(&self, trajectory: &[TrackPoint]);

    /// Called for every error reported by the position source. The watch keeps running.
    fn on_error(&self, error: &PositionError);
}

/// Adapts a pair of closures to a `WatchListener`.
pub struct Callbacks<F, E> {
    on_sample: F,
    on_error: E,
}

impl<F, E> Callbacks<F, E>
where
    F: Fn(&[TrackPoint]) + Send + Sync,
    E: Fn(&PositionError) + Send + Sync,
{
    pub fn new(on_sample: F, on_error: E) -> Self {
        Callbacks { on_sample, on_error }
    }
}

impl<F, E> WatchListener for Callbacks<F, E>
where
    F: Fn(&[TrackPoint]) + Send + Sync,
    E: Fn(&PositionError) + Send + Sync,
{
    fn on_sample(&self, trajectory: &[TrackPoint]) {
        (self.on_sample)(trajectory)
    }

    fn on_error(&self, error: &PositionError) {
        (self.on_error)(error)
    }
}
