mod listen;
mod server_sent_event;

pub use listen::{Config, SseError, SseItem, listen};
pub use server_sent_event::{EventBuffer, ServerSentEvent};
