//! Task graph runner
//!
//! Executes a schedule strictly one task at a time. Once a task fails, no
//! further ordinary task is started. Finalizers of attempted tasks and of the
//! target still run, together with any unstarted dependencies they need.
//! Progress lines go to stderr.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use colored::*;
use shipyard_task_protocol::{Outcome, StatusReporter, TaskStatus};
use tracing::{debug, info, warn};

use crate::activation::{ActivationCondition, PipelineSettings};
use crate::execution::command::CommandExecutor;
use crate::execution::dependencies::{Schedule, TaskRole};
use crate::graph::{Task, TaskBody, TaskGraph};
use crate::results::{RunReport, TaskFailure, TaskReport};
use crate::tasks::get_task_color;
use crate::types::{ShipyardError, ShipyardResult};

/// Runs one target of a task graph, once
pub struct TaskGraphRunner {
    graph: TaskGraph,
    settings: PipelineSettings,
}

impl TaskGraphRunner {
    pub fn new(graph: TaskGraph, settings: PipelineSettings) -> Self {
        Self { graph, settings }
    }

    /// Replace the activation condition before running.
    pub fn activate(&mut self, condition: ActivationCondition) {
        self.settings.condition = condition;
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Run `target` and everything it needs. Consumes the runner.
    ///
    /// Construction problems (unknown ids, cycles) are returned as errors
    /// before any task starts. Task failures are recorded in the report.
    pub fn run(self, target: &str) -> ShipyardResult<RunReport> {
        if !self.settings.condition.is_active() {
            info!(
                target,
                enable_docker = self.settings.condition.enable_docker,
                build_target = self.settings.condition.build_target,
                "Pipeline disabled, skipping"
            );
            return Ok(RunReport::inactive(target));
        }

        let schedule = self.graph.schedule(target)?;
        let mut execution = Execution::new(&self.graph, &schedule);

        for entry in &schedule.entries {
            let task = self.graph.task_at(entry.position);

            if !execution.may_start(entry.position, entry.role) {
                debug!(task = %task.id, "Not starting after an earlier failure");
                execution.mark_processed(entry.position);
                continue;
            }

            if let Some(dependency) = execution.unsucceeded_dependency(task) {
                if execution.is_triggered_finalizer(entry.position) {
                    warn!(
                        task = %task.id,
                        dependency,
                        "Finalizer skipped, a dependency did not succeed"
                    );
                    eprintln!(
                        "{} {}",
                        "!".yellow().bold(),
                        format!("{} skipped: dependency {} did not succeed", task.id, dependency)
                            .yellow()
                    );
                } else {
                    debug!(
                        task = %task.id,
                        dependency,
                        "Not starting, a dependency did not succeed"
                    );
                }
                execution.mark_processed(entry.position);
                continue;
            }

            execution.set_status(entry.position, TaskStatus::Running);
            print_task_header(task, entry.role);

            match self.execute_task(task) {
                Ok(()) => {
                    info!(task = %task.id, "Task succeeded");
                    execution.set_status(entry.position, TaskStatus::Succeeded);
                }
                Err(error) => {
                    warn!(task = %task.id, error = %error, "Task failed");
                    eprintln!(
                        "{} {}",
                        "✗".red().bold(),
                        format!("{} failed: {}", task.id, error).red()
                    );
                    execution.set_status(entry.position, TaskStatus::Failed);
                    execution.failures.push(TaskFailure {
                        task: task.id.clone(),
                        error,
                    });
                    execution.aborted = true;
                }
            }
            execution.mark_processed(entry.position);
        }

        Ok(execution.into_report(&schedule))
    }

    fn execute_task(&self, task: &Task) -> ShipyardResult<()> {
        let project_dir = self.settings.project_dir.as_path();

        match &task.body {
            TaskBody::ExternalCommand(spec) => {
                CommandExecutor::new(&task.id).execute(&spec.resolved_against(project_dir))?;
            }
            TaskBody::DeleteMatching(rule) => {
                rule.resolved_against(project_dir).execute()?;
            }
            TaskBody::NoOp => {}
            TaskBody::Opaque(runnable) => {
                let mut reporter = LogReporter { task: &task.id };
                if let Outcome::Failed { reason } = runnable.run(&mut reporter) {
                    return Err(ShipyardError::Runnable {
                        task: task.id.clone(),
                        reason,
                    });
                }
            }
        }

        run_do_last(task, project_dir)
    }
}

fn run_do_last(task: &Task, project_dir: &Path) -> ShipyardResult<()> {
    let executor = CommandExecutor::new(&task.id);
    for action in &task.do_last {
        executor.execute(&action.resolved_against(project_dir))?;
    }
    Ok(())
}

fn print_task_header(task: &Task, role: TaskRole) {
    let task_color = get_task_color(&task.id);
    eprintln!();
    eprintln!(
        "┌─ {} {}",
        "Running task".bold(),
        task.id.as_str().color(task_color).bold()
    );
    eprintln!(
        "└─ {} {} {}",
        "Kind:".bright_black(),
        task.body.kind(),
        format!("({})", role.as_str()).bright_black()
    );
}

/// Forwards collaborator progress to the log
struct LogReporter<'a> {
    task: &'a str,
}

impl StatusReporter for LogReporter<'_> {
    fn progress(&mut self, message: &str) {
        info!(task = self.task, "{}", message);
    }
}

/// Mutable state of a single run
struct Execution<'a> {
    graph: &'a TaskGraph,
    target: usize,
    scheduled: HashSet<usize>,
    finalizer_only: HashSet<usize>,
    /// Scheduled task -> scheduled finalizers that depend on it, directly or not
    needed_by: HashMap<usize, Vec<usize>>,
    statuses: HashMap<usize, TaskStatus>,
    processed: HashSet<usize>,
    failures: Vec<TaskFailure>,
    aborted: bool,
}

impl<'a> Execution<'a> {
    fn new(graph: &'a TaskGraph, schedule: &Schedule) -> Self {
        let scheduled: HashSet<usize> = schedule.entries.iter().map(|e| e.position).collect();
        let finalizer_only: HashSet<usize> = schedule
            .entries
            .iter()
            .filter(|e| e.role == TaskRole::Finalizer)
            .map(|e| e.position)
            .collect();

        let mut needed_by: HashMap<usize, Vec<usize>> = HashMap::new();
        for &finalizer in &scheduled {
            if graph.task_at(finalizer).finalizes.is_empty() {
                continue;
            }
            let mut stack = vec![finalizer];
            let mut seen = HashSet::from([finalizer]);
            while let Some(current) = stack.pop() {
                for dependency in &graph.task_at(current).depends_on {
                    if let Some(position) = graph.position(dependency) {
                        if scheduled.contains(&position) && seen.insert(position) {
                            needed_by.entry(position).or_default().push(finalizer);
                            stack.push(position);
                        }
                    }
                }
            }
        }

        Self {
            graph,
            target: graph.position(&schedule.target).unwrap_or_default(),
            scheduled,
            finalizer_only,
            needed_by,
            statuses: HashMap::new(),
            processed: HashSet::new(),
            failures: Vec::new(),
            aborted: false,
        }
    }

    fn status(&self, position: usize) -> TaskStatus {
        self.statuses.get(&position).copied().unwrap_or_default()
    }

    fn set_status(&mut self, position: usize, status: TaskStatus) {
        self.statuses.insert(position, status);
    }

    fn mark_processed(&mut self, position: usize) {
        self.processed.insert(position);
    }

    /// First dependency of `task` that has not succeeded.
    fn unsucceeded_dependency<'t>(&self, task: &'t Task) -> Option<&'t str> {
        task.depends_on
            .iter()
            .find(|dependency| {
                self.graph
                    .position(dependency)
                    .map(|position| self.status(position) != TaskStatus::Succeeded)
                    .unwrap_or(true)
            })
            .map(String::as_str)
    }

    fn may_start(&self, position: usize, role: TaskRole) -> bool {
        if self.is_triggered_finalizer(position) {
            return true;
        }
        if role == TaskRole::Target && !self.aborted {
            return true;
        }
        self.needed_by
            .get(&position)
            .map(|finalizers| finalizers.iter().any(|&f| self.may_trigger(f)))
            .unwrap_or(false)
    }

    /// A finalizer whose finalized task was attempted, or is the target.
    fn is_triggered_finalizer(&self, position: usize) -> bool {
        self.finalized_positions(position)
            .any(|finalized| finalized == self.target || self.status(finalized).was_attempted())
    }

    /// Whether the finalizer can still end up triggered.
    fn may_trigger(&self, finalizer: usize) -> bool {
        self.finalized_positions(finalizer).any(|finalized| {
            finalized == self.target
                || self.status(finalized).was_attempted()
                || (!self.processed.contains(&finalized)
                    && (!self.aborted
                        || self.finalizer_only.contains(&finalized)
                        || self.needed_by.contains_key(&finalized)))
        })
    }

    fn finalized_positions(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .task_at(position)
            .finalizes
            .iter()
            .filter_map(|id| self.graph.position(id))
            .filter(|finalized| self.scheduled.contains(finalized))
    }

    fn into_report(self, schedule: &Schedule) -> RunReport {
        let tasks = schedule
            .entries
            .iter()
            .map(|entry| TaskReport {
                id: entry.id.clone(),
                status: self.status(entry.position),
                role: entry.role,
            })
            .collect();

        RunReport {
            target: schedule.target.clone(),
            active: true,
            tasks,
            failures: self.failures,
        }
    }
}
