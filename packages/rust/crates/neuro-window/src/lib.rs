//! neuro-window: sliding history window for the orchestration controller.
//!
//! Append-only ring of `ConversationTurn`s bounded by a turn count and an
//! optional token budget. Oldest non-pinned turns are dropped first; the most
//! recent turn is never dropped.

mod tokens;
mod window;

pub use tokens::{count_tokens, truncate_to_tokens};
pub use window::{HistoryWindow, WindowLimits, WindowStats};
