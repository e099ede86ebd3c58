//! Built-in task kinds.
//!
//! - [`SleepKind`]: randomized sleep with per-second progress, for exercising
//!   the scheduler without any external dependency.

mod sleep;

pub use sleep::SleepKind;
