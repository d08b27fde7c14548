//! Outer surfaces over a [`crate::SessionHandle`].

mod stdio;

pub use stdio::{STDIO_CANCEL_COMMAND, run_stdio};
