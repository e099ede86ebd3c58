//! # Closure-backed subscriber.
//!
//! [`FnSubscriber`] turns a plain `Fn(&Event)` into a [`Subscribe`]
//! implementation, optionally bound to a single [`Channel`]. This is what
//! [`Engine::subscribe`](crate::Engine::subscribe) builds.
//!
//! ## Example
//! ```rust
//! use pickvisor::{Channel, Event, FnSubscriber};
//!
//! let sub = FnSubscriber::on(Channel::Check, |ev: &Event| {
//!     println!("health = {:?}", ev.score());
//! });
//! # let _ = sub;
//! ```

use async_trait::async_trait;

use crate::events::{Channel, Event};
use crate::subscribers::Subscribe;

/// Subscriber that calls a closure for each accepted event.
pub struct FnSubscriber<F> {
    name: &'static str,
    channel: Option<Channel>,
    f: F,
}

impl<F> FnSubscriber<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    /// Handles events of `channel` only.
    pub fn on(channel: Channel, f: F) -> Self {
        Self {
            name: channel.as_str(),
            channel: Some(channel),
            f,
        }
    }

    /// Handles events of every channel.
    pub fn all(f: F) -> Self {
        Self {
            name: "fn",
            channel: None,
            f,
        }
    }

    /// Overrides the name used in logs.
    #[must_use]
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

#[async_trait]
impl<F> Subscribe for FnSubscriber<F>
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    async fn on_event(&self, event: &Event) {
        (self.f)(event);
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn accepts(&self, channel: Channel) -> bool {
        self.channel.is_none_or(|c| c == channel)
    }
}
