//! Error types used by the pickvisor engine and its tasks.
//!
//! This module defines three enums:
//!
//! - [`RuntimeError`] errors raised by the engine itself (bad config, lifecycle
//!   contract violations, shutdown drain timing out).
//! - [`TaskError`] errors raised by individual task bodies; these are always
//!   contained at the task boundary and classified as `fail` or `err`.
//! - [`ConfigError`] validation and parse failures for [`EngineConfig`](crate::EngineConfig).
//!
//! `RuntimeError` and `TaskError` provide `as_label` / `as_message` helpers for logs.

use std::time::Duration;

use thiserror::Error;

use crate::tasks::TaskState;

/// # Errors produced by the engine.
///
/// None of these are produced by a task body failing; task failures are
/// recorded in the caches and counters instead.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration was rejected by [`EngineConfig::validate`](crate::EngineConfig::validate).
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A task was asked to move backwards (or sideways) in its lifecycle.
    ///
    /// This indicates an engine bug, not a task bug.
    #[error("task {task}: invalid lifecycle transition {from:?} -> {to:?}")]
    InvalidTransition {
        /// Title of the offending task.
        task: String,
        /// State the task was in.
        from: TaskState,
        /// State that was requested.
        to: TaskState,
    },

    /// In-flight tasks did not finish within the shutdown grace period.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// How long shutdown waited.
        grace: Duration,
        /// Titles of tasks still alive when the grace period ran out.
        stuck: Vec<String>,
    },

    /// Registering OS signal handlers failed.
    #[error("signal handler: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pickvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::InvalidConfig(_) => "runtime_invalid_config",
            RuntimeError::InvalidTransition { .. } => "runtime_invalid_transition",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }

    /// Log-friendly description including the error's fields.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::InvalidConfig(e) => format!("config rejected: {e}"),
            RuntimeError::InvalidTransition { task, from, to } => {
                format!("task {task} cannot go from {from:?} to {to:?}")
            }
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("grace exceeded after {grace:?}; stuck tasks={stuck:?}")
            }
            RuntimeError::Signal(e) => format!("signal setup failed: {e}"),
        }
    }
}

/// # Errors produced by task bodies.
///
/// The engine never propagates these; it classifies them:
/// - [`TaskError::Fail`] is a **soft failure** the task reports about its own
///   work (e.g. an unexpected status code) and is counted as `fail`.
/// - everything else is counted as `err`.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task ran to completion but judged its own result a failure.
    #[error("failed: {error}")]
    Fail {
        /// The underlying failure message.
        error: String,
    },

    /// The task could not complete its work.
    #[error("error: {error}")]
    Error {
        /// What went wrong, as reported by the task.
        error: String,
    },

    /// The task panicked; the panic was caught at its error boundary.
    #[error("panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    pub fn fail(error: impl std::fmt::Display) -> Self {
        TaskError::Fail {
            error: error.to_string(),
        }
    }

    /// Shorthand for [`TaskError::Error`].
    pub fn error(error: impl std::fmt::Display) -> Self {
        TaskError::Error {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use pickvisor::TaskError;
    ///
    /// assert_eq!(TaskError::fail("502").as_label(), "task_fail");
    /// assert_eq!(TaskError::error("boom").as_label(), "task_error");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_fail",
            TaskError::Error { .. } => "task_error",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }

    /// Returns the bare message without the variant prefix.
    pub fn as_message(&self) -> &str {
        match self {
            TaskError::Fail { error } | TaskError::Error { error } => error,
            TaskError::Panicked { info } => info,
        }
    }

    /// Indicates whether this is a soft failure (`fail`) rather than an `err`.
    pub fn is_soft(&self) -> bool {
        matches!(self, TaskError::Fail { .. })
    }

    /// Renders a caught panic payload into [`TaskError::Panicked`].
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        TaskError::Panicked {
            info: panic_message(payload.as_ref()),
        }
    }
}

/// Extracts a readable message from a panic payload.
pub(crate) fn panic_message(any: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = any.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = any.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// # Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The task kind name is empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A periodic interval is zero.
    #[error("{field} must be greater than zero")]
    ZeroInterval {
        /// Name of the offending field.
        field: &'static str,
    },

    /// The per-cycle admission spread is not a finite, non-negative number.
    #[error("pickup_count must be finite and non-negative (base={base}, variance={variance})")]
    BadCount {
        /// Configured base.
        base: f64,
        /// Configured variance.
        variance: f64,
    },

    /// The backpressure unit or cap is zero.
    #[error("backpressure hold unit must be greater than zero")]
    ZeroHoldUnit,

    /// TOML could not be parsed into an [`EngineConfig`](crate::EngineConfig).
    #[error("parse: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config file could not be read.
    #[error("read {path}: {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
