//! Fan-out from the engine listener to registered handlers.
//!
//! Every handler owns a bounded mpsc queue and a worker task that drains it.
//! `emit_arc` only does `try_send`, so the listener never waits on a handler.
//! Order is preserved per handler, not across handlers. A full queue loses the
//! event for that handler only, with a warning; nothing is retried.
//!
//! ```text
//!  listener ─► emit_arc ─┬─ accepts? ─► [mpsc] ─► worker ─► on_event (catch_unwind)
//!                        └─ accepts? ─► [mpsc] ─► worker ─► on_event (catch_unwind)
//! ```

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::{Mutex, RwLock};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::panic_message;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// A handler and the sending half of its queue.
struct SubscriberChannel {
    sub: Arc<dyn Subscribe>,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Registered handlers and their workers.
///
/// A handler panic is logged and the worker moves on to the next event. Workers are spawned on the current tokio runtime, so a set must be created
/// (and extended) from within one.
#[derive(Default)]
pub struct SubscriberSet {
    channels: RwLock<Vec<SubscriberChannel>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl SubscriberSet {
    /// Builds a set with a running worker for each handler in `subs`.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let set = Self::default();
        for sub in subs {
            set.add(sub);
        }
        set
    }

    /// Adds a subscriber and spawns its worker.
    ///
    /// The subscriber sees events emitted after this call.
    pub fn add(&self, sub: Arc<dyn Subscribe>) {
        let cap = sub.queue_capacity().max(1);
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(cap);
        let s = Arc::clone(&sub);

        let handle = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let fut = s.on_event(ev.as_ref());
                if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                    tracing::warn!(
                        subscriber = s.name(),
                        channel = ev.channel().as_str(),
                        info = %panic_message(panic_err.as_ref()),
                        "subscriber panicked"
                    );
                }
            }
        });

        self.channels
            .write()
            .push(SubscriberChannel { sub, sender: tx });
        self.workers.lock().push(handle);
    }

    /// Number of subscribers in the set.
    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    /// Whether the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clones `event` into an `Arc` and forwards it; see [`emit_arc`](Self::emit_arc).
    pub fn emit(&self, event: &Event) {
        self.emit_arc(Arc::new(event.clone()));
    }

    /// Emits a pre-allocated `Arc<Event>` to every subscriber that accepts its channel.
    ///
    /// Uses `try_send`; on a full or closed queue the event is dropped for that
    /// subscriber and a warning is logged.
    pub fn emit_arc(&self, event: Arc<Event>) {
        let channel = event.channel();
        for ch in self.channels.read().iter() {
            if !ch.sub.accepts(channel) {
                continue;
            }
            match ch.sender.try_send(Arc::clone(&event)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    tracing::warn!(
                        subscriber = ch.sub.name(),
                        channel = channel.as_str(),
                        seq = event.seq,
                        "subscriber dropped event: queue full"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    tracing::warn!(
                        subscriber = ch.sub.name(),
                        channel = channel.as_str(),
                        seq = event.seq,
                        "subscriber dropped event: worker closed"
                    );
                }
            }
        }
    }

    /// Closes every queue and waits for the workers to drain them.
    ///
    /// Events emitted afterwards are ignored.
    pub async fn close(&self) {
        drop(std::mem::take(&mut *self.channels.write()));
        let workers = std::mem::take(&mut *self.workers.lock());
        for h in workers {
            let _ = h.await;
        }
    }
}
