//! Session state owned by the controller: chat messages and loop counters.

mod counters;
mod message;

pub use counters::SessionCounters;
pub use message::ChatMessage;
