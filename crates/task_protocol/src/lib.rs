//! Shipyard Task Protocol
//!
//! Collaborator tasks (for example a Docker image build provided by another
//! tool) are opaque to the Shipyard runner. This crate defines the small
//! capability interface such tasks implement so that the runner can schedule
//! them next to its own task bodies without depending on their internals.
//!
//! - [`Runnable`] - an opaque task with an identifier and a `run` entry point
//! - [`StatusReporter`] - the callback a runnable uses to report progress
//! - [`Outcome`] - the success/failure signal returned by a runnable
//! - [`TaskStatus`] - the lifecycle state the runner tracks for every task

pub mod traits;
pub mod types;

pub use traits::{Runnable, StatusReporter};
pub use types::{Outcome, TaskStatus};
