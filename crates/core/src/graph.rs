//! Task graph
//!
//! Tasks are registered once per run, in order, and refer to each other by
//! identifier. Two edge kinds exist: `depends_on` (the dependency must
//! succeed before the task starts) and `finalizes` (the finalizer runs after
//! the task it finalizes, whatever that task's outcome). Identifiers are only
//! resolved when the graph is validated, right before scheduling.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::kosaraju_scc;
use petgraph::prelude::*;
use shipyard_task_protocol::Runnable;

use crate::execution::cleanup::DeleteMatching;
use crate::execution::command::CommandSpec;
use crate::execution::dependencies::{resolve_schedule, Schedule};
use crate::results::{DependencyGraphResult, TaskSummary};
use crate::types::{ShipyardError, ShipyardResult};

/// What a task does when it runs
pub enum TaskBody {
    /// Spawn an external process and wait for it
    ExternalCommand(CommandSpec),
    /// Remove files matching a glob under a base directory
    DeleteMatching(DeleteMatching),
    /// Aggregate task that only exists for its dependencies
    NoOp,
    /// Collaborator task whose internals are not visible to the runner
    Opaque(Box<dyn Runnable>),
}

impl TaskBody {
    pub fn kind(&self) -> &'static str {
        match self {
            TaskBody::ExternalCommand(_) => "command",
            TaskBody::DeleteMatching(_) => "delete",
            TaskBody::NoOp => "noop",
            TaskBody::Opaque(_) => "external",
        }
    }
}

impl fmt::Debug for TaskBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskBody::ExternalCommand(spec) => {
                f.debug_tuple("ExternalCommand").field(spec).finish()
            }
            TaskBody::DeleteMatching(rule) => f
                .debug_struct("DeleteMatching")
                .field("base_dir", &rule.base_dir())
                .field("pattern", &rule.pattern())
                .finish(),
            TaskBody::NoOp => f.write_str("NoOp"),
            TaskBody::Opaque(runnable) => f.debug_tuple("Opaque").field(&runnable.id()).finish(),
        }
    }
}

/// A named unit of work
#[derive(Debug)]
pub struct Task {
    pub id: String,
    pub body: TaskBody,
    pub description: Option<String>,
    pub depends_on: Vec<String>,
    /// Tasks this one finalizes
    pub finalizes: Vec<String>,
    /// Actions appended to the body, run in order after it succeeds
    pub do_last: Vec<CommandSpec>,
}

impl Task {
    pub fn new(id: impl Into<String>, body: TaskBody) -> Self {
        Self {
            id: id.into(),
            body,
            description: None,
            depends_on: Vec::new(),
            finalizes: Vec::new(),
            do_last: Vec::new(),
        }
    }

    pub fn no_op(id: impl Into<String>) -> Self {
        Self::new(id, TaskBody::NoOp)
    }

    /// Wrap a collaborator task; its identifier becomes the task id.
    pub fn opaque(runnable: Box<dyn Runnable>) -> Self {
        let description = runnable.description();
        let mut task = Self::new(runnable.id().to_string(), TaskBody::Opaque(runnable));
        task.description = description;
        task
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on.extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn finalizes(mut self, task: impl Into<String>) -> Self {
        self.finalizes.push(task.into());
        self
    }

    pub fn do_last(mut self, action: CommandSpec) -> Self {
        self.do_last.push(action);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Registered tasks, in registration order
#[derive(Debug, Default)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: HashMap<String, usize>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Dependencies are not checked until validation.
    pub fn register(&mut self, task: Task) -> ShipyardResult<()> {
        if self.index.contains_key(&task.id) {
            return Err(ShipyardError::DuplicateTask(task.id));
        }
        self.index.insert(task.id.clone(), self.tasks.len());
        self.tasks.push(task);
        Ok(())
    }

    /// `task` must not start before `dependency` succeeded.
    pub fn add_dependency(&mut self, task: &str, dependency: &str) -> ShipyardResult<()> {
        let task = self.task_mut(task)?;
        if !task.depends_on.iter().any(|d| d == dependency) {
            task.depends_on.push(dependency.to_string());
        }
        Ok(())
    }

    /// `finalizer` runs after `task`, whatever the outcome of `task`.
    pub fn add_finalizer(&mut self, task: &str, finalizer: &str) -> ShipyardResult<()> {
        if !self.contains(task) {
            return Err(ShipyardError::UnknownTask(task.to_string()));
        }
        let finalizer = self.task_mut(finalizer)?;
        if !finalizer.finalizes.iter().any(|t| t == task) {
            finalizer.finalizes.push(task.to_string());
        }
        Ok(())
    }

    pub fn add_do_last(&mut self, task: &str, action: CommandSpec) -> ShipyardResult<()> {
        self.task_mut(task)?.do_last.push(action);
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.index.get(id).map(|&i| &self.tasks[i])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn task_at(&self, position: usize) -> &Task {
        &self.tasks[position]
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Check that every referenced id is registered and that no cycle exists.
    pub fn validate(&self) -> ShipyardResult<()> {
        for task in &self.tasks {
            for dependency in task.depends_on.iter().chain(task.finalizes.iter()) {
                if !self.contains(dependency) {
                    return Err(ShipyardError::UnknownDependency {
                        task: task.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let cycles = self.detect_cycles();
        if cycles.is_empty() {
            return Ok(());
        }

        let message = cycles
            .into_iter()
            .map(|cycle| {
                let mut cycle_path = cycle.clone();
                if let Some(first) = cycle_path.first().cloned() {
                    cycle_path.push(first);
                }
                cycle_path.join(" -> ")
            })
            .collect::<Vec<_>>()
            .join("; ");

        Err(ShipyardError::CycleDetected(message))
    }

    /// Order the target's closure and its finalizers for execution.
    pub fn schedule(&self, target: &str) -> ShipyardResult<Schedule> {
        self.validate()?;
        resolve_schedule(self, target)
    }

    /// Summaries of every task plus any cycles, without failing on them.
    pub fn describe(&self) -> DependencyGraphResult {
        let tasks = self
            .tasks
            .iter()
            .map(|task| TaskSummary {
                id: task.id.clone(),
                kind: task.body.kind(),
                description: task.description.clone(),
                depends_on: task.depends_on.clone(),
                finalizes: task.finalizes.clone(),
                finalized_by: self
                    .tasks
                    .iter()
                    .filter(|other| other.finalizes.contains(&task.id))
                    .map(|other| other.id.clone())
                    .collect(),
                do_last: task.do_last.iter().map(ToString::to_string).collect(),
            })
            .collect();

        DependencyGraphResult {
            tasks,
            cycles: self.detect_cycles(),
        }
    }

    /// Cycles over "runs after" edges: task -> dependency, finalizer -> finalized.
    fn detect_cycles(&self) -> Vec<Vec<String>> {
        let mut graph = DiGraph::<String, ()>::new();
        let nodes: Vec<NodeIndex> = self
            .tasks
            .iter()
            .map(|task| graph.add_node(task.id.clone()))
            .collect();

        for (position, task) in self.tasks.iter().enumerate() {
            for other in task.depends_on.iter().chain(task.finalizes.iter()) {
                if let Some(&to) = self.index.get(other) {
                    graph.add_edge(nodes[position], nodes[to], ());
                }
            }
        }

        let mut cycles: Vec<Vec<String>> = kosaraju_scc(&graph)
            .into_iter()
            .filter_map(|component| {
                if component.len() > 1 {
                    let mut cycle = component
                        .iter()
                        .map(|node| graph[*node].clone())
                        .collect::<Vec<_>>();
                    cycle.sort();
                    Some(cycle)
                } else {
                    let node = component[0];
                    if graph.contains_edge(node, node) {
                        Some(vec![graph[node].clone()])
                    } else {
                        None
                    }
                }
            })
            .collect();

        cycles.sort();
        cycles
    }

    fn task_mut(&mut self, id: &str) -> ShipyardResult<&mut Task> {
        match self.index.get(id) {
            Some(&position) => Ok(&mut self.tasks[position]),
            None => Err(ShipyardError::UnknownTask(id.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("bootJar")).unwrap();

        let err = graph.register(Task::no_op("bootJar")).unwrap_err();
        assert!(matches!(err, ShipyardError::DuplicateTask(id) if id == "bootJar"));
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_unknown_dependency_is_reported_at_validation() {
        let mut graph = TaskGraph::new();
        graph
            .register(Task::no_op("buildDocker").depends_on(["copyLibs"]))
            .expect("registration does not resolve dependencies");

        let err = graph.validate().unwrap_err();
        match err {
            ShipyardError::UnknownDependency { task, dependency } => {
                assert_eq!(task, "buildDocker");
                assert_eq!(dependency, "copyLibs");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_finalized_task_is_reported() {
        let mut graph = TaskGraph::new();
        graph
            .register(Task::no_op("cleanJars").finalizes("buildDocker"))
            .unwrap();

        assert!(matches!(
            graph.validate(),
            Err(ShipyardError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_cycle_is_reported_with_path() {
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("a").depends_on(["b"])).unwrap();
        graph.register(Task::no_op("b").depends_on(["a"])).unwrap();

        let err = graph.validate().unwrap_err();
        assert!(err.to_string().contains("a -> b -> a"));
        assert_eq!(graph.describe().cycles, vec![vec!["a".to_string(), "b".to_string()]]);
    }

    #[test]
    fn test_finalizer_edge_participates_in_cycles() {
        // a needs f first, but f has to run after a
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("a").depends_on(["f"])).unwrap();
        graph.register(Task::no_op("f").finalizes("a")).unwrap();

        assert!(matches!(graph.validate(), Err(ShipyardError::CycleDetected(_))));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("loop").depends_on(["loop"])).unwrap();

        let err = graph.validate().unwrap_err();
        assert!(err.to_string().contains("loop -> loop"));
    }

    #[test]
    fn test_extending_registered_tasks() {
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("copyLibs")).unwrap();
        graph.register(Task::no_op("pushImages")).unwrap();
        graph.register(Task::no_op("cleanJars")).unwrap();

        graph.add_dependency("pushImages", "copyLibs").unwrap();
        graph.add_dependency("pushImages", "copyLibs").unwrap();
        graph.add_finalizer("pushImages", "cleanJars").unwrap();
        graph
            .add_do_last("pushImages", CommandSpec::new("docker", "./after-build.sh"))
            .unwrap();

        let push = graph.get("pushImages").unwrap();
        assert_eq!(push.depends_on, vec!["copyLibs".to_string()]);
        assert_eq!(push.do_last.len(), 1);
        assert_eq!(
            graph.get("cleanJars").unwrap().finalizes,
            vec!["pushImages".to_string()]
        );

        let summary = graph.describe();
        let push_summary = summary.tasks.iter().find(|t| t.id == "pushImages").unwrap();
        assert_eq!(push_summary.finalized_by, vec!["cleanJars".to_string()]);

        assert!(matches!(
            graph.add_dependency("missing", "copyLibs"),
            Err(ShipyardError::UnknownTask(_))
        ));
        assert!(matches!(
            graph.add_finalizer("missing", "cleanJars"),
            Err(ShipyardError::UnknownTask(_))
        ));
    }
}
