//! # Event handlers
//!
//! Anything that wants to watch the engine (dashboards or log sinks)
//! implements [`Subscribe`] and is registered with the builder or with
//! [`Engine::add_subscriber`](crate::Engine::add_subscriber) at runtime.
//!
//! Delivery goes through a per-handler queue drained by its own worker, so a
//! slow handler only delays itself. When its queue is full the event is lost
//! for that handler alone and a warning is logged. Handlers narrow their feed
//! with [`Subscribe::accepts`]; rejected channels never reach the queue.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use pickvisor::{Channel, Event, Subscribe};
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Subscribe for Audit {
//!     async fn on_event(&self, ev: &Event) {
//!         let _ = ev.finished();
//!     }
//!     fn name(&self) -> &'static str { "audit" }
//!     fn accepts(&self, channel: Channel) -> bool { channel == Channel::Popup }
//! }
//! ```

use async_trait::async_trait;

use crate::events::{Channel, Event};

/// Receives engine events on a dedicated worker task.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Called once per accepted event, in publish order.
    async fn on_event(&self, event: &Event);

    /// Name shown in overflow and panic warnings.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Events buffered before this handler starts losing them.
    fn queue_capacity(&self) -> usize {
        1024
    }

    /// Whether events of `channel` should be delivered at all.
    fn accepts(&self, _channel: Channel) -> bool {
        true
    }
}
