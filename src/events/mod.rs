//! Engine events: typed channels and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish engine notifications to the presentation layer without coupling
//! the scheduler to any renderer.
//!
//! ## Contents
//! - [`Channel`], [`Event`], [`Payload`] channel classification and payloads
//! - [`Heartbeat`] payload of the `tick` channel
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the pickup loop (`pickup`), task runners (`popup`),
//!   [`TaskContext`](crate::TaskContext) (`progress`, `echo`), the health
//!   monitor (`check`), the ticker (`tick`).
//! - **Consumers**: the engine's listener, which fans out to
//!   [`SubscriberSet`](crate::SubscriberSet); or raw receivers from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Channel, Event, Heartbeat, Payload};
