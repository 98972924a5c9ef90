mod controller;
mod listener;

pub use controller::{PositionWatchController, SampleOutcome, WatchHandle};
pub use listener::{Callbacks, WatchListener};
