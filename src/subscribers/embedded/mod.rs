//! # Built-in subscribers
//!
//! - [`LogWriter`]: renders every event as one `tracing` line.
//! - [`EchoBuffer`]: keeps the most recent `echo` lines for display.

mod echo;
mod log;

pub use echo::EchoBuffer;
pub use log::LogWriter;
