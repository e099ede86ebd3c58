//! # Sleep kind.
//!
//! Each task draws a duration in `[min, max)` during `initialize`, then sleeps
//! it in one-second steps, publishing `progress` after every full second and
//! sleeping the sub-second remainder last. Its title becomes
//! `"sleep <id> <ms>ms"`.
//!
//! With `fail_above` set, a drawn duration above the threshold is reported as
//! an error once the sleep completes.
//!
//! The kind's health check scores the share of `err` outcomes among recent
//! results: `1.0` with no errors, down to `0.0` when errors dominate, and `-1.0`
//! when every recent outcome is an error.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::config::EngineConfig;
use crate::error::TaskError;
use crate::policies::Spread;
use crate::tasks::{BoxTask, Cleanup, Execute, HealthInput, Initialize, TaskContext, TaskKind};

/// Randomized sleep task kind.
#[derive(Clone, Debug)]
pub struct SleepKind {
    min: Duration,
    max: Duration,
    fail_above: Option<Duration>,
    config: EngineConfig,
}

impl SleepKind {
    /// Tasks sleep a random duration in `[min, max)`; `max <= min` means exactly `min`.
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            fail_above: None,
            config: Self::default_config(),
        }
    }

    /// Durations above `threshold` end as errors.
    #[must_use]
    pub fn fail_above(mut self, threshold: Duration) -> Self {
        self.fail_above = Some(threshold);
        self
    }

    /// Replaces the default engine settings of this kind.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// `name = "sleep"`, 12 concurrent, `1s + random[0, 500ms)` between cycles,
    /// health checked every 5s.
    pub fn default_config() -> EngineConfig {
        EngineConfig {
            name: "sleep".to_string(),
            description: "randomized sleep".to_string(),
            max_concurrent: 12,
            check_interval: Duration::from_secs(5),
            delay: Spread::new(Duration::from_millis(1000), Duration::from_millis(500)),
            ..EngineConfig::default()
        }
    }

    fn draw(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let span = (self.max - self.min).as_millis() as u64;
        if span == 0 {
            return self.min;
        }
        self.min + Duration::from_millis(rand::rng().random_range(0..span))
    }
}

impl Default for SleepKind {
    /// Sleeps 5s to 20s.
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(20))
    }
}

impl TaskKind for SleepKind {
    fn config(&self) -> EngineConfig {
        self.config.clone()
    }

    fn create(&self) -> BoxTask {
        Box::new(SleepTask {
            duration: self.draw(),
            fail_above: self.fail_above,
        })
    }

    fn check(&self, input: &HealthInput<'_>) -> f64 {
        let settled = input.results.len() + input.errors.len();
        if settled == 0 {
            return 1.0;
        }
        if input.results.is_empty() {
            return -1.0;
        }
        1.0 - input.errors.len() as f64 / settled as f64
    }
}

struct SleepTask {
    duration: Duration,
    fail_above: Option<Duration>,
}

#[async_trait]
impl Initialize for SleepTask {
    async fn initialize(&mut self, ctx: &TaskContext) -> Result<(), TaskError> {
        ctx.set_title(format!(
            "sleep {} {}ms",
            ctx.id(),
            self.duration.as_millis()
        ));
        Ok(())
    }
}

#[async_trait]
impl Execute for SleepTask {
    async fn execute(&mut self, ctx: &TaskContext) -> Result<(), TaskError> {
        let steps = self.duration.as_secs();
        for i in 1..=steps {
            tokio::time::sleep(Duration::from_secs(1)).await;
            ctx.progress(i, steps);
        }
        let remainder = self.duration - Duration::from_secs(steps);
        if !remainder.is_zero() {
            tokio::time::sleep(remainder).await;
        }

        match self.fail_above {
            Some(limit) if self.duration > limit => Err(TaskError::error(format!(
                "invalid long duration {}ms",
                self.duration.as_millis()
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Cleanup for SleepTask {
    async fn cleanup(&mut self, ctx: &TaskContext) -> Result<(), TaskError> {
        ctx.set_note(format!("{}ms", ctx.used_time().as_millis()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Bus, Channel, Payload};
    use crate::tasks::{Finished, Outcome, Stage, TaskRecord};
    use std::sync::Arc;

    #[test]
    fn test_draw_within_bounds() {
        let kind = SleepKind::new(Duration::from_millis(100), Duration::from_millis(200));
        for _ in 0..100 {
            let d = kind.draw();
            assert!(d >= Duration::from_millis(100) && d < Duration::from_millis(200));
        }
        let fixed = SleepKind::new(Duration::from_secs(2), Duration::from_secs(1));
        assert_eq!(fixed.draw(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_every_second() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let ctx = TaskContext::standalone(1, "sleep", bus);
        let mut task = SleepTask {
            duration: Duration::from_millis(3500),
            fail_above: None,
        };

        task.initialize(&ctx).await.unwrap();
        assert_eq!(ctx.title(), "sleep 1 3500ms");
        task.execute(&ctx).await.unwrap();

        let mut steps = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            assert_eq!(ev.channel(), Channel::Progress);
            if let Payload::Progress { current, total, .. } = &ev.payload {
                steps.push((*current, *total));
            }
        }
        assert_eq!(steps, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_long_duration_fails() {
        let ctx = TaskContext::standalone(2, "sleep", Bus::new(16));
        let mut task = SleepTask {
            duration: Duration::from_millis(1500),
            fail_above: Some(Duration::from_secs(1)),
        };
        let err = task.execute(&ctx).await.unwrap_err();
        assert_eq!(err.as_message(), "invalid long duration 1500ms");
        assert!(!err.is_soft());
    }

    fn finished(outcome: Outcome) -> Arc<Finished> {
        Arc::new(Finished {
            task: TaskRecord::new(1, "sleep").snapshot(),
            stage: Stage::Execute,
            outcome,
        })
    }

    #[test]
    fn test_check_scores() {
        let kind = SleepKind::default();
        let ok = vec![finished(Outcome::Ok)];
        let err = vec![finished(Outcome::Err(TaskError::error("x")))];

        let empty = HealthInput { alive: &[], results: &[], errors: &[], history: &[] };
        assert_eq!(kind.check(&empty), 1.0);

        let healthy = HealthInput { alive: &[], results: &ok, errors: &[], history: &[] };
        assert_eq!(kind.check(&healthy), 1.0);

        let all_bad = HealthInput { alive: &[], results: &[], errors: &err, history: &[] };
        assert_eq!(kind.check(&all_bad), -1.0);

        let mixed = HealthInput { alive: &[], results: &ok, errors: &err, history: &[] };
        assert_eq!(kind.check(&mixed), 0.5);
    }
}
