//! High-level pipeline management interface
//!
//! This module provides the [`PipelineManager`] which serves as the primary interface
//! for pipeline operations. It reads the pipeline file and the activation flags once,
//! then builds a fresh task graph for every plan, run, or inspection.
//!
//! The PipelineManager abstracts away:
//! - Loading the `shipyard.yml` pipeline file
//! - Reading the two activation flags from properties and the environment
//! - Registering Docker collaborator tasks next to the configured tasks
//! - Applying `extend` wiring to tasks registered elsewhere
//!
//! ## Example
//!
//! ```rust,no_run
//! use shipyard_core::pipeline_manager::{PipelineManager, PipelineManagerConfig};
//! use std::collections::HashMap;
//! use std::path::PathBuf;
//!
//! # fn example() -> shipyard_core::types::ShipyardResult<()> {
//! let manager = PipelineManager::new(PipelineManagerConfig {
//!     project_dir: PathBuf::from("."),
//!     config_path: None,
//!     properties: HashMap::from([
//!         ("enable-docker".to_string(), "true".to_string()),
//!         ("build-cdc-agents".to_string(), "true".to_string()),
//!     ]),
//! })?;
//!
//! let plan = manager.plan("buildDocker")?;
//! let report = manager.run("buildDocker")?;
//! assert_eq!(report.success(), report.failures.is_empty());
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::activation::{ActivationCondition, PipelineSettings, PropertySource};
use crate::configs::pipeline::{
    parse_pipeline_config, ActionConfig, PipelineConfig, TaskConfig, DEFAULT_PIPELINE_FILE,
};
use crate::docker::{docker_contexts, DockerImageTask, PushImagesTask, DEFAULT_DOCKER_BINARY};
use crate::execution::cleanup::DeleteMatching;
use crate::execution::command::CommandSpec;
use crate::execution::runner::TaskGraphRunner;
use crate::graph::{Task, TaskBody, TaskGraph};
use crate::results::{DependencyGraphResult, ExecutionPlanResult, RunReport, TaskListResult};
use crate::types::{ShipyardError, ShipyardResult};

/// High-level manager over one pipeline file
pub struct PipelineManager {
    pub pipeline: PipelineConfig,
    pub config_path: PathBuf,
    settings: PipelineSettings,
}

/// Configuration for initializing a pipeline manager
pub struct PipelineManagerConfig {
    pub project_dir: PathBuf,
    /// Defaults to `<project_dir>/shipyard.yml`
    pub config_path: Option<PathBuf>,
    /// `-P key=value` properties, consulted before the environment
    pub properties: HashMap<String, String>,
}

impl PipelineManager {
    /// Load the pipeline file and read the activation flags
    pub fn new(config: PipelineManagerConfig) -> ShipyardResult<Self> {
        let config_path = config
            .config_path
            .unwrap_or_else(|| config.project_dir.join(DEFAULT_PIPELINE_FILE));
        let pipeline = Self::load_pipeline_config(&config_path)?;
        let properties = PropertySource::from_process_env(config.properties);

        Ok(Self::from_parts(
            pipeline,
            config_path,
            config.project_dir,
            &properties,
        ))
    }

    /// Build a manager from an already parsed pipeline
    pub fn from_parts(
        pipeline: PipelineConfig,
        config_path: PathBuf,
        project_dir: PathBuf,
        properties: &PropertySource,
    ) -> Self {
        let condition = ActivationCondition::from_properties(
            properties,
            &pipeline.activation.enable_docker,
            &pipeline.activation.build_target,
        );

        Self {
            pipeline,
            config_path,
            settings: PipelineSettings::new(project_dir, condition),
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// The explicit target, or the pipeline's `defaultTarget`
    pub fn resolve_target(&self, target: Option<&str>) -> ShipyardResult<String> {
        target
            .map(str::to_string)
            .or_else(|| self.pipeline.default_target.clone())
            .ok_or_else(|| {
                ShipyardError::Config(format!(
                    "No target given and {} has no defaultTarget",
                    self.config_path.display()
                ))
            })
    }

    /// Execution order for a target, without running anything
    pub fn plan(&self, target: &str) -> ShipyardResult<ExecutionPlanResult> {
        let graph = self.build_graph()?;
        let schedule = graph.schedule(target)?;

        Ok(ExecutionPlanResult {
            target: schedule.target,
            active: self.settings.condition.is_active(),
            order: schedule
                .entries
                .into_iter()
                .map(|entry| (entry.id, entry.role))
                .collect(),
        })
    }

    /// Run a target once
    pub fn run(&self, target: &str) -> ShipyardResult<RunReport> {
        let graph = self.build_graph()?;
        TaskGraphRunner::new(graph, self.settings.clone()).run(target)
    }

    /// Get dependency graph information
    pub fn graph(&self) -> ShipyardResult<DependencyGraphResult> {
        Ok(self.build_graph()?.describe())
    }

    /// List every registered task
    pub fn list_tasks(&self) -> ShipyardResult<TaskListResult> {
        Ok(TaskListResult {
            name: self.pipeline.name.clone(),
            config_path: self.config_path.clone(),
            tasks: self.build_graph()?.describe().tasks,
        })
    }

    /// Register Docker tasks, configured tasks, then apply `extend` wiring
    pub fn build_graph(&self) -> ShipyardResult<TaskGraph> {
        let project_dir = self.settings.project_dir.as_path();
        let mut graph = TaskGraph::new();

        if let Some(docker) = &self.pipeline.docker {
            let binary = docker.binary.as_deref().unwrap_or(DEFAULT_DOCKER_BINARY);
            let contexts = docker_contexts(docker, project_dir);
            for context in &contexts {
                graph.register(Task::opaque(Box::new(DockerImageTask::new(
                    binary,
                    project_dir,
                    context.clone(),
                ))))?;
            }
            if !contexts.is_empty() {
                graph.register(Task::opaque(Box::new(PushImagesTask::new(
                    binary,
                    project_dir,
                    &contexts,
                ))))?;
            }
        }

        for task_config in &self.pipeline.tasks {
            graph.register(Self::build_task(task_config)?)?;
        }

        for task_config in &self.pipeline.tasks {
            for finalizer in task_config.finalized_by.iter().flatten() {
                graph.add_finalizer(&task_config.name, finalizer)?;
            }
        }

        for extension in &self.pipeline.extend {
            if !graph.contains(&extension.task) {
                return Err(ShipyardError::Config(format!(
                    "Cannot extend task '{}': it is not registered",
                    extension.task
                )));
            }
            for dependency in extension.depends_on.iter().flatten() {
                graph.add_dependency(&extension.task, dependency)?;
            }
            for finalizer in extension.finalized_by.iter().flatten() {
                graph.add_finalizer(&extension.task, finalizer)?;
            }
            for action in extension.do_last.iter().flatten() {
                graph.add_do_last(&extension.task, Self::build_action(action)?)?;
            }
        }

        debug!(tasks = graph.len(), "Built task graph");
        Ok(graph)
    }

    // Private helper methods

    fn load_pipeline_config(config_path: &Path) -> ShipyardResult<PipelineConfig> {
        let content = std::fs::read_to_string(config_path).map_err(|e| {
            ShipyardError::Config(format!(
                "Failed to read pipeline config {}: {}",
                config_path.display(),
                e
            ))
        })?;

        parse_pipeline_config(&content).map_err(|e| {
            ShipyardError::Config(format!(
                "Failed to parse pipeline config {}: {}",
                config_path.display(),
                e
            ))
        })
    }

    fn build_task(config: &TaskConfig) -> ShipyardResult<Task> {
        let body = match (&config.command, &config.delete_matching) {
            (Some(_), Some(_)) => {
                return Err(ShipyardError::Config(format!(
                    "Task '{}' has both a command and deleteMatching",
                    config.name
                )));
            }
            (Some(command), None) => {
                let (program, args) = command.program_and_args().map_err(|e| {
                    ShipyardError::Config(format!("Task '{}': {}", config.name, e))
                })?;
                TaskBody::ExternalCommand(
                    CommandSpec::new(working_dir(config.working_dir.as_deref()), program)
                        .with_args(args),
                )
            }
            (None, Some(delete)) => {
                TaskBody::DeleteMatching(DeleteMatching::new(&delete.base_dir, &delete.pattern)?)
            }
            (None, None) => TaskBody::NoOp,
        };

        let mut task = Task::new(config.name.clone(), body)
            .depends_on(config.depends_on.iter().flatten().cloned());
        for finalized in config.finalizes.iter().flatten() {
            task = task.finalizes(finalized.clone());
        }
        for action in config.do_last.iter().flatten() {
            task = task.do_last(Self::build_action(action)?);
        }
        if let Some(description) = &config.description {
            task = task.with_description(description.clone());
        }

        Ok(task)
    }

    fn build_action(action: &ActionConfig) -> ShipyardResult<CommandSpec> {
        let (program, args) = action.command.program_and_args()?;
        Ok(CommandSpec::new(working_dir(action.working_dir.as_deref()), program).with_args(args))
    }
}

/// Relative to the project directory; resolved by the runner
fn working_dir(configured: Option<&str>) -> PathBuf {
    PathBuf::from(configured.unwrap_or("."))
}
