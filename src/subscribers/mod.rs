//! # Event subscribers.
//!
//! Subscribers are the presentation side of the engine: they receive every
//! [`Event`](crate::Event) published on the [`Bus`](crate::Bus) through the
//! engine's listener, without being able to slow the pickup loop down.
//!
//! ## Architecture
//! ```text
//!   Bus ──► engine listener ──► SubscriberSet::emit_arc(ev)
//!                                    │  (skips subscribers whose accepts(channel) is false)
//!                                    ├──► [queue S1] ─► worker S1 ─► on_event()
//!                                    ├──► [queue S2] ─► worker S2 ─► on_event()
//!                                    └──► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! ## Contents
//! - [`Subscribe`] the extension trait
//! - [`SubscriberSet`] fan-out with per-subscriber queues and panic isolation
//! - [`FnSubscriber`] closure bound to one channel (or all of them)
//! - [`LogWriter`], [`EchoBuffer`] built-in subscribers

mod embedded;
mod fn_subscriber;
mod set;
mod subscribe;

pub use embedded::{EchoBuffer, LogWriter};
pub use fn_subscriber::FnSubscriber;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
