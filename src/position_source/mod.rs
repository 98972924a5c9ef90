#[cfg(test)]
pub mod fake_source;
mod http_source;
mod source;

pub use http_source::HttpPositionSource;
pub use source::{PositionError, PositionEvent, PositionSource, SourceWatchId, WatchOptions};
