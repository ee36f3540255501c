//! Task execution module
//!
//! This module handles the actual execution of tasks including command execution,
//! glob cleanup, schedule resolution, and the runner that ties them together.

pub mod cleanup;
pub mod command;
pub mod dependencies;
pub mod runner;

pub use cleanup::DeleteMatching;
pub use command::{CommandExecutor, CommandSpec};
pub use dependencies::{resolve_schedule, Schedule, ScheduledTask, TaskRole};
pub use runner::TaskGraphRunner;
