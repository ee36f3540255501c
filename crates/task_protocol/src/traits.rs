//! Capability traits for collaborator tasks.
//!
//! - [`Runnable`] - an opaque task the runner can schedule and execute
//! - [`StatusReporter`] - progress callback handed to a running task

use crate::types::Outcome;

/// Progress callback passed to [`Runnable::run`].
///
/// **Purpose**: lets a collaborator surface what it is doing (for example
/// "pushing localhost:5001/cdc-agents") without the runner knowing anything
/// about the work itself. The runner forwards every message to its log.
pub trait StatusReporter {
    /// Report a human-readable progress message for the running task.
    fn progress(&mut self, message: &str);
}

/// An opaque task provided by an external collaborator.
///
/// **Purpose**: the runner only adds dependency edges to and from a runnable
/// and reads the [`Outcome`] it returns. How the work is done (invoking a
/// Docker CLI, calling a remote service, ...) stays behind this trait.
///
/// **Contract**:
/// - `id` must be stable; it is the task identifier inside the graph.
/// - `run` is called at most once per pipeline run and blocks until the work
///   is done.
/// - Failures are returned as [`Outcome::Failed`], never by panicking.
///
/// # Example
///
/// ```rust
/// use shipyard_task_protocol::{Outcome, Runnable, StatusReporter};
///
/// struct Announce;
///
/// impl Runnable for Announce {
///     fn id(&self) -> &str {
///         "announce"
///     }
///
///     fn run(&self, reporter: &mut dyn StatusReporter) -> Outcome {
///         reporter.progress("announcing release");
///         Outcome::Succeeded
///     }
/// }
///
/// struct Silent;
/// impl StatusReporter for Silent {
///     fn progress(&mut self, _message: &str) {}
/// }
///
/// assert!(Announce.run(&mut Silent).is_success());
/// ```
pub trait Runnable {
    /// Identifier of the task inside the pipeline graph.
    fn id(&self) -> &str;

    /// Short description shown by `shipyard list`.
    fn description(&self) -> Option<String> {
        None
    }

    /// Execute the task, blocking until it finishes.
    fn run(&self, reporter: &mut dyn StatusReporter) -> Outcome;
}
