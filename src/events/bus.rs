//! Engine-wide broadcast channel.
//!
//! The pickup loop, runners, task contexts and the health monitor all publish
//! here. The engine keeps one listener that hands events to its
//! [`SubscriberSet`](crate::SubscriberSet); tests may attach their own
//! receivers with [`Bus::subscribe`].
//!
//! ```text
//!   pickup loop ─┐
//!   runners     ─┤
//!   contexts    ─┼─► Bus (broadcast) ─► listener ─► SubscriberSet
//!   monitor     ─┘
//! ```
//!
//! Sending never waits. The ring buffer is shared; a receiver that falls
//! behind sees `Lagged(n)` and resumes from the oldest retained event. With no
//! receivers, events are simply discarded.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle to the engine's broadcast sender.
///
/// Events travel as `Arc<Event>`, so every receiver shares one allocation.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Arc<Event>>,
}

impl Bus {
    /// Opens a bus buffering up to `capacity` events (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Arc<Event>>(capacity.max(1));
        Self { tx }
    }

    /// Sends `ev` to current receivers; dropped when there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(Arc::new(ev));
    }

    /// Independent receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Event>> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
