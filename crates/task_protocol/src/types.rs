//! Core types shared between the runner and collaborator tasks.
//!
//! - [`TaskStatus`] - lifecycle state of a task inside a single run
//! - [`Outcome`] - result signal returned by a [`crate::Runnable`]

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a task within one pipeline run.
///
/// ## Transitions
///
/// Every task starts as `Pending`. The runner moves a task to `Running` right
/// before its body starts and to `Succeeded` or `Failed` once the body (and
/// any `doLast` actions) finished. A task that is never started, because the
/// pipeline was inactive or an earlier task failed, stays `Pending`.
///
/// ```text
/// Pending -> Running -> Succeeded
///                    \-> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Not started (yet).
    #[default]
    Pending,
    /// Body is currently executing.
    Running,
    /// Body and every `doLast` action completed successfully.
    Succeeded,
    /// Body or a `doLast` action failed.
    Failed,
}

impl TaskStatus {
    /// Returns whether the task has finished, successfully or not.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns whether the task was started at some point during the run.
    #[must_use]
    pub const fn was_attempted(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The signal a [`crate::Runnable`] hands back to the runner.
///
/// The runner never inspects how a collaborator did its work; the outcome is
/// the only thing it reads.
///
/// # Example
///
/// ```rust
/// use shipyard_task_protocol::Outcome;
///
/// let outcome = Outcome::failed("registry unreachable");
/// assert!(!outcome.is_success());
/// assert_eq!(outcome.failure_reason(), Some("registry unreachable"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Outcome {
    Succeeded,
    Failed { reason: String },
}

impl Outcome {
    /// Convenience constructor for a failed outcome.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    /// The failure reason, if the outcome is a failure.
    #[must_use]
    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Succeeded => None,
            Self::Failed { reason } => Some(reason),
        }
    }
}
