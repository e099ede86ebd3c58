//! # Health monitor.
//!
//! Every `check_interval` while the engine runs, the task kind's
//! [`check`](crate::TaskKind::check) is called with snapshots of the live tasks,
//! both caches and the previous scores. The score is appended to the bounded
//! health history and published on the `check` channel.
//!
//! The engine does not interpret the score beyond the configured
//! [`BackpressurePolicy`](crate::BackpressurePolicy): with `HoldOnNegative`, a
//! negative score holds admission for a while and an `echo` line says so.
//!
//! A panicking check is logged and scored `0.0` (unhealthy but tolerable).

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::core::engine::Engine;
use crate::error::panic_message;
use crate::events::Event;
use crate::tasks::HealthInput;

impl Engine {
    pub(super) async fn health_loop(self: Arc<Self>, token: CancellationToken) {
        let period = self.cfg.check_interval;
        let mut timer = tokio::time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = timer.tick() => {
                    self.check_now();
                }
            }
        }
    }

    /// Runs the health check once, records and publishes the score.
    ///
    /// Called by the monitor on every interval; callable by hand at any time.
    pub fn check_now(&self) -> f64 {
        let (alive, results, errors, history) = {
            let g = self.sheet.lock();
            (
                g.registry.snapshots(),
                g.results.to_vec(),
                g.errors.to_vec(),
                g.health.to_vec(),
            )
        };
        let input = HealthInput {
            alive: &alive,
            results: &results,
            errors: &errors,
            history: &history,
        };

        let score = match std::panic::catch_unwind(AssertUnwindSafe(|| self.kind.check(&input))) {
            Ok(score) => score,
            Err(panic) => {
                tracing::warn!(
                    kind = %self.kind_name,
                    info = %panic_message(panic.as_ref()),
                    "health check panicked"
                );
                0.0
            }
        };

        self.sheet.lock().health.push(score);
        tracing::debug!(kind = %self.kind_name, score, alive = alive.len(), "health checked");
        self.bus.publish(Event::check(score));

        if let Some(hold) = self.cfg.backpressure.hold_for(score) {
            *self.held_until.lock() = Some(Instant::now() + hold);
            tracing::info!(
                kind = %self.kind_name,
                score,
                hold_ms = hold.as_millis() as u64,
                "admission held"
            );
            self.bus.publish(Event::echo(format!(
                "health {score:.2}: admission held for {}ms",
                hold.as_millis()
            )));
        }
        score
    }
}
