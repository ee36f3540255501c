//! Shipyard Core Library
//!
//! This is the core library for the Shipyard build orchestrator. It provides a
//! small directed task graph with conditional activation, finalizer edges,
//! glob-based cleanup, and delegation to external processes.
//!
//! ## Architecture
//!
//! The core library is organized into several modules:
//!
//! - [`pipeline_manager`] - High-level interface over a `shipyard.yml` pipeline
//! - [`graph`] - Tasks, task bodies, and the task graph with validation
//! - [`execution`] - Scheduling, command execution, cleanup, and the runner
//! - [`activation`] - The two-flag activation condition and run settings
//! - [`docker`] - Docker image/push collaborator tasks
//! - [`tasks`] - Task utilities and color management
//! - [`configs`] - Configuration parsing for the pipeline file
//! - [`results`] - Result types for runs and inspections
//! - [`types`] - Common error types and type aliases
//!
//! ## Usage
//!
//! ```rust,no_run
//! use shipyard_core::activation::{ActivationCondition, PipelineSettings};
//! use shipyard_core::execution::{CommandSpec, TaskGraphRunner};
//! use shipyard_core::graph::{Task, TaskBody, TaskGraph};
//!
//! # fn example() -> shipyard_core::types::ShipyardResult<()> {
//! let mut graph = TaskGraph::new();
//! graph.register(Task::new(
//!     "copyLibs",
//!     TaskBody::ExternalCommand(CommandSpec::new("docker", "./build.sh")),
//! ))?;
//! graph.register(Task::no_op("buildDocker").depends_on(["copyLibs"]))?;
//!
//! let settings = PipelineSettings::new(".", ActivationCondition::active());
//! let report = TaskGraphRunner::new(graph, settings).run("buildDocker")?;
//! println!("success: {}", report.success());
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod configs;
pub mod docker;
pub mod execution;
pub mod graph;
pub mod pipeline_manager;
pub mod results;
pub mod tasks;
pub mod types;

// Re-export the main types for easier usage
pub use pipeline_manager::{PipelineManager, PipelineManagerConfig};
pub use types::{ShipyardError, ShipyardResult};
