//! # Outcome classification.
//!
//! Every task settles into exactly one [`Outcome`]:
//!
//! | result of the lifecycle                | outcome        | counter | history  |
//! |----------------------------------------|----------------|---------|----------|
//! | `execute` → `Ok(())`                   | `Ok`           | `ok`    | results  |
//! | `execute` → `Err(TaskError::Fail)`     | `Fail(e)`      | `fail`  | results  |
//! | `execute` → other error / panic        | `Err(e)`       | `err`   | errors   |
//! | `initialize` → any error / panic       | `Err(e)`       | `err`   | errors   |

use crate::error::TaskError;
use crate::tasks::TaskSnapshot;

/// Lifecycle stage a task settled in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// `initialize` failed (admission failure).
    Initialize,
    /// `execute` settled.
    Execute,
}

/// Classified result of one task.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// Completed normally.
    Ok,
    /// Soft failure reported by the task itself.
    Fail(TaskError),
    /// Error or panic.
    Err(TaskError),
}

impl Outcome {
    /// Classifies an `execute` result.
    pub fn classify(res: Result<(), TaskError>) -> Self {
        match res {
            Ok(()) => Outcome::Ok,
            Err(e) if e.is_soft() => Outcome::Fail(e),
            Err(e) => Outcome::Err(e),
        }
    }

    /// `"ok"`, `"fail"` or `"err"`.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Fail(_) => "fail",
            Outcome::Err(_) => "err",
        }
    }

    /// The error, unless the outcome is `Ok`.
    pub fn error(&self) -> Option<&TaskError> {
        match self {
            Outcome::Ok => None,
            Outcome::Fail(e) | Outcome::Err(e) => Some(e),
        }
    }

    /// Whether this outcome belongs in the errors history.
    pub fn is_err(&self) -> bool {
        matches!(self, Outcome::Err(_))
    }
}

/// A settled task, as stored in the results/errors history.
#[derive(Clone, Debug, PartialEq)]
pub struct Finished {
    /// Final snapshot of the task (state `Ended`).
    pub task: TaskSnapshot,
    /// Where the lifecycle settled.
    pub stage: Stage,
    /// Classification.
    pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_splits_fail_from_err() {
        assert_eq!(Outcome::classify(Ok(())), Outcome::Ok);
        assert_eq!(Outcome::classify(Err(TaskError::fail("404"))).label(), "fail");
        assert_eq!(Outcome::classify(Err(TaskError::error("boom"))).label(), "err");
        assert!(Outcome::classify(Err(TaskError::Panicked { info: "p".into() })).is_err());
    }

    #[test]
    fn test_error_accessor() {
        assert!(Outcome::Ok.error().is_none());
        let e = TaskError::error("boom");
        assert_eq!(Outcome::Err(e.clone()).error(), Some(&e));
    }
}
