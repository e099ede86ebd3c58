//! # Engine: pickup loop, bookkeeping and graceful shutdown.
//!
//! The [`Engine`] owns one task kind, the event bus, the subscriber set and the
//! [`Sheet`] (registry, caches, counters, health history). While running it drives
//! three background loops, all stopped by the same cancellation token:
//!
//! ```text
//! start()
//!   ├─► pickup loop ── every cycle ──► quota = pickup_count.sample()
//!   │                                   repeat quota times:
//!   │                                     live < max_concurrent ? ──no──► stop cycle
//!   │                                        │ yes
//!   │                                     kind.create() ─► Sheet::admit ─► publish pickup
//!   │                                        └─► tracker.spawn(run_task)   (not awaited)
//!   │                                   kind.delay(cfg.delay)  (cancellable)
//!   ├─► health loop ── every check_interval ──► check_now()
//!   └─► tick loop   ── every tick_interval  ──► publish tick(Heartbeat)
//!
//! pause()            cancels the loops; in-flight tasks run to completion
//! shutdown(grace)    pause + wait for in-flight tasks (up to grace) + flush subscribers
//!
//! Bus ──► listener ──► SubscriberSet (spawned by build(), stopped by shutdown())
//! ```
//!
//! ## Rules
//! - `start()` and `pause()` are idempotent.
//! - Live tasks never exceed `max_concurrent` right after an admission step.
//! - `max_concurrent = 0` keeps the loop cycling without admitting ("paused but alive").
//! - While admission is held by backpressure the loop keeps cycling without admitting.
//! - A task failure never stops the loop; nothing a task does reaches the caller.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::config::EngineConfig;
use crate::core::builder::EngineBuilder;
use crate::core::runner::run_task;
use crate::core::sheet::Sheet;
use crate::core::shutdown;
use crate::core::stats::StatsSnapshot;
use crate::error::{RuntimeError, panic_message};
use crate::events::{Bus, Channel, Event, Heartbeat};
use crate::subscribers::{FnSubscriber, Subscribe, SubscriberSet};
use crate::tasks::{Finished, KindRef, TaskRecord, TaskSnapshot, next_task_id};

/// Why an admission attempt did not produce a task.
enum Refusal {
    Full,
    Factory,
}

/// Admission-controlled executor for one task kind.
pub struct Engine {
    pub(super) kind: KindRef,
    pub(super) kind_name: Arc<str>,
    pub(super) cfg: EngineConfig,
    pub(super) bus: Bus,
    pub(super) subs: Arc<SubscriberSet>,
    pub(super) sheet: Arc<Mutex<Sheet>>,
    pub(super) held_until: Mutex<Option<Instant>>,
    tracker: TaskTracker,
    max_concurrent: AtomicUsize,
    run: Mutex<Option<CancellationToken>>,
    closed: AtomicBool,
    born: Instant,
    listener: Mutex<Option<JoinHandle<()>>>,
    listener_stop: CancellationToken,
}

impl Engine {
    /// Starts building an engine for `kind`.
    pub fn builder(kind: KindRef) -> EngineBuilder {
        EngineBuilder::new(kind)
    }

    pub(super) fn new_internal(
        kind: KindRef,
        cfg: EngineConfig,
        subscribers: Vec<Arc<dyn Subscribe>>,
    ) -> Arc<Self> {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(subscribers));
        let listener_stop = CancellationToken::new();
        let listener = spawn_listener(&bus, Arc::clone(&subs), listener_stop.clone());

        Arc::new(Self {
            kind,
            kind_name: Arc::from(cfg.name.as_str()),
            max_concurrent: AtomicUsize::new(cfg.max_concurrent),
            sheet: Arc::new(Mutex::new(Sheet::new(&cfg))),
            cfg,
            bus,
            subs,
            held_until: Mutex::new(None),
            tracker: TaskTracker::new(),
            run: Mutex::new(None),
            closed: AtomicBool::new(false),
            born: Instant::now(),
            listener: Mutex::new(Some(listener)),
            listener_stop,
        })
    }

    /// Begins admitting tasks. No-op if already running or shut down.
    pub fn start(self: &Arc<Self>) {
        if self.closed.load(Ordering::Acquire) {
            tracing::warn!(kind = %self.kind_name, "start ignored: engine is shut down");
            return;
        }
        let mut run = self.run.lock();
        if run.is_some() {
            return;
        }
        let token = CancellationToken::new();
        tokio::spawn(Arc::clone(self).pickup_loop(token.clone()));
        tokio::spawn(Arc::clone(self).health_loop(token.clone()));
        tokio::spawn(Arc::clone(self).tick_loop(token.clone()));
        *run = Some(token);

        tracing::info!(
            kind = %self.kind_name,
            max_concurrent = self.max_concurrent(),
            "engine started"
        );
    }

    /// Stops admitting tasks and stops the health check. In-flight tasks keep
    /// running to completion. No-op if not running.
    pub fn pause(&self) {
        if let Some(token) = self.run.lock().take() {
            token.cancel();
            tracing::info!(kind = %self.kind_name, alive = self.stats().alive, "engine paused");
        }
    }

    /// Whether the pickup loop is running.
    pub fn is_running(&self) -> bool {
        self.run.lock().is_some()
    }

    /// Pauses, waits up to `grace` for in-flight tasks, then flushes subscribers.
    ///
    /// The engine cannot be restarted afterwards. On timeout, returns
    /// [`RuntimeError::GraceExceeded`] with the titles of the tasks still alive.
    pub async fn shutdown(&self, grace: Duration) -> Result<(), RuntimeError> {
        self.pause();
        self.closed.store(true, Ordering::Release);
        self.tracker.close();

        let drained = tokio::time::timeout(grace, self.tracker.wait()).await;
        let stuck = self.sheet.lock().registry.titles();
        self.flush_subscribers().await;

        match drained {
            Ok(()) => {
                tracing::info!(kind = %self.kind_name, "all tasks settled within grace");
                Ok(())
            }
            Err(_) => {
                tracing::warn!(
                    kind = %self.kind_name,
                    ?grace,
                    stuck = stuck.len(),
                    "grace exceeded"
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        }
    }

    /// Starts the engine, waits for a termination signal, then shuts down with
    /// the configured grace period.
    pub async fn run_until_signal(self: &Arc<Self>) -> Result<(), RuntimeError> {
        self.start();
        let signal = shutdown::wait_for_shutdown_signal().await?;
        tracing::info!(kind = %self.kind_name, signal, "shutdown requested");
        self.shutdown(self.cfg.grace).await
    }

    /// Current live-task ceiling.
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.load(Ordering::Relaxed)
    }

    /// Changes the live-task ceiling; takes effect at the next admission.
    ///
    /// Lowering it never cancels running tasks. `0` keeps the loop cycling
    /// without admitting.
    pub fn set_max_concurrent(&self, n: usize) {
        let prev = self.max_concurrent.swap(n, Ordering::Relaxed);
        if prev != n {
            tracing::info!(kind = %self.kind_name, from = prev, to = n, "max_concurrent changed");
        }
    }

    /// Whether admission is currently held by backpressure.
    pub fn is_held(&self) -> bool {
        self.held_until
            .lock()
            .is_some_and(|until| Instant::now() < until)
    }

    /// Counters plus the live gauge.
    pub fn stats(&self) -> StatsSnapshot {
        self.sheet.lock().stats()
    }

    /// Snapshots of the live tasks, in admission order.
    pub fn alive(&self) -> Vec<TaskSnapshot> {
        self.sheet.lock().registry.snapshots()
    }

    /// The last `n` `ok`/`fail` outcomes, oldest first.
    pub fn results(&self, n: usize) -> Vec<Arc<Finished>> {
        self.sheet.lock().results.tail(n)
    }

    /// The last `n` `err` outcomes, oldest first.
    pub fn errors(&self, n: usize) -> Vec<Arc<Finished>> {
        self.sheet.lock().errors.tail(n)
    }

    /// Retained health scores, oldest first.
    pub fn health_history(&self) -> Vec<f64> {
        self.sheet.lock().health.to_vec()
    }

    /// Time since the engine was built.
    pub fn uptime(&self) -> Duration {
        self.born.elapsed()
    }

    /// Effective configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// The engine's event bus (raw receivers via [`Bus::subscribe`]).
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Calls `handler` for every event published on `channel`.
    ///
    /// Handlers run on their own worker; a panicking handler is logged and
    /// never affects the engine or other subscribers.
    pub fn subscribe<F>(&self, channel: Channel, handler: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.subs.add(Arc::new(FnSubscriber::on(channel, handler)));
    }

    /// Adds a subscriber at runtime.
    pub fn add_subscriber(&self, sub: Arc<dyn Subscribe>) {
        self.subs.add(sub);
    }

    async fn pickup_loop(self: Arc<Self>, token: CancellationToken) {
        while !token.is_cancelled() {
            self.pickup(&token);
            tokio::select! {
                _ = token.cancelled() => break,
                _ = self.kind.delay(&self.cfg.delay) => {}
            }
        }
    }

    /// One admission cycle; returns the number of admitted tasks.
    fn pickup(&self, token: &CancellationToken) -> usize {
        if self.is_held() {
            tracing::trace!(kind = %self.kind_name, "admission held");
            return 0;
        }
        let quota = self.cfg.pickup_count.sample();
        let mut admitted = 0;
        for _ in 0..quota {
            if token.is_cancelled() {
                break;
            }
            match self.admit_one() {
                Ok(()) => admitted += 1,
                Err(Refusal::Full) => break,
                Err(Refusal::Factory) => {}
            }
        }
        admitted
    }

    fn admit_one(&self) -> Result<(), Refusal> {
        let max = self.max_concurrent();
        if self.sheet.lock().registry.len() >= max {
            return Err(Refusal::Full);
        }

        let task = match std::panic::catch_unwind(AssertUnwindSafe(|| self.kind.create())) {
            Ok(task) => task,
            Err(panic) => {
                tracing::error!(
                    kind = %self.kind_name,
                    info = %panic_message(panic.as_ref()),
                    "task factory panicked"
                );
                return Err(Refusal::Factory);
            }
        };

        let record = Arc::new(TaskRecord::new(
            next_task_id(&self.kind_name),
            Arc::clone(&self.kind_name),
        ));
        if !self.sheet.lock().admit(Arc::clone(&record), max) {
            return Err(Refusal::Full);
        }

        let snapshot = record.snapshot();
        tracing::debug!(task = %snapshot.title, "task admitted");
        self.bus.publish(Event::pickup(snapshot));
        self.tracker.spawn(run_task(
            task,
            record,
            self.bus.clone(),
            Arc::clone(&self.sheet),
        ));
        Ok(())
    }

    async fn tick_loop(self: Arc<Self>, token: CancellationToken) {
        let period = self.cfg.tick_interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => self.bus.publish(Event::tick(self.heartbeat())),
            }
        }
    }

    /// Current heartbeat payload.
    pub fn heartbeat(&self) -> Heartbeat {
        Heartbeat {
            uptime: self.uptime(),
            stats: self.stats(),
            running: self.is_running(),
            held: self.is_held(),
        }
    }

    async fn flush_subscribers(&self) {
        self.listener_stop.cancel();
        let listener = self.listener.lock().take();
        if let Some(handle) = listener {
            let _ = handle.await;
        }
        self.subs.close().await;
    }
}

/// Forwards bus events to the subscriber set until `stop`, then drains what is
/// still buffered.
fn spawn_listener(bus: &Bus, subs: Arc<SubscriberSet>, stop: CancellationToken) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                msg = rx.recv() => match msg {
                    Ok(ev) => subs.emit_arc(ev),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "event listener lagged");
                    }
                    Err(RecvError::Closed) => break,
                },
                _ = stop.cancelled() => {
                    loop {
                        match rx.try_recv() {
                            Ok(ev) => subs.emit_arc(ev),
                            Err(TryRecvError::Lagged(_)) => continue,
                            Err(_) => break,
                        }
                    }
                    break;
                }
            }
        }
    })
}
