//! Task dependency resolution
//!
//! Computes which tasks a run touches and in which order: the dependency
//! closure of the target, then every finalizer attached to a task in that set
//! together with the finalizer's own dependencies, repeated until nothing new
//! is added. The result is topologically ordered with registration order as
//! the tie-break.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use crate::graph::TaskGraph;
use crate::types::{ShipyardError, ShipyardResult};

/// Why a task is part of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRole {
    /// In the dependency closure of the target
    Target,
    /// Only present because a finalizer (or a finalizer's dependency) needs it
    Finalizer,
}

impl TaskRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskRole::Target => "target",
            TaskRole::Finalizer => "finalizer",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTask {
    pub id: String,
    /// Registration position in the graph
    pub position: usize,
    pub role: TaskRole,
}

/// Execution order for one target
#[derive(Debug, Clone)]
pub struct Schedule {
    pub target: String,
    pub entries: Vec<ScheduledTask>,
}

impl Schedule {
    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn role_of(&self, id: &str) -> Option<TaskRole> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.role)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.id.as_str()).collect()
    }
}

/// Build the schedule for `target`. The graph must already be validated.
pub fn resolve_schedule(graph: &TaskGraph, target: &str) -> ShipyardResult<Schedule> {
    let target_position = graph
        .position(target)
        .ok_or_else(|| ShipyardError::UnknownTask(target.to_string()))?;

    // Reverse finalizer edges: finalized task -> finalizers, in registration order
    let mut finalizers_of: HashMap<usize, Vec<usize>> = HashMap::new();
    for (position, task) in graph.tasks().enumerate() {
        for finalized in &task.finalizes {
            let finalized = position_of(graph, finalized)?;
            finalizers_of.entry(finalized).or_default().push(position);
        }
    }

    let closure = dependency_closure(graph, target_position, &HashSet::new())?;
    let mut members: HashSet<usize> = closure.clone();

    loop {
        let mut added = Vec::new();
        for member in &members {
            for &finalizer in finalizers_of.get(member).map(Vec::as_slice).unwrap_or(&[]) {
                if !members.contains(&finalizer) {
                    added.extend(dependency_closure(graph, finalizer, &members)?);
                }
            }
        }
        if added.is_empty() {
            break;
        }
        members.extend(added);
    }

    let order = topological_order(graph, &members)?;
    let entries = order
        .into_iter()
        .map(|position| ScheduledTask {
            id: graph.task_at(position).id.clone(),
            position,
            role: if closure.contains(&position) {
                TaskRole::Target
            } else {
                TaskRole::Finalizer
            },
        })
        .collect();

    Ok(Schedule {
        target: target.to_string(),
        entries,
    })
}

/// `start` plus everything it transitively depends on, skipping `known`.
fn dependency_closure(
    graph: &TaskGraph,
    start: usize,
    known: &HashSet<usize>,
) -> ShipyardResult<HashSet<usize>> {
    let mut visited = HashSet::new();
    let mut stack = vec![start];

    while let Some(current) = stack.pop() {
        if known.contains(&current) || !visited.insert(current) {
            continue;
        }
        for dependency in &graph.task_at(current).depends_on {
            stack.push(position_of(graph, dependency)?);
        }
    }

    Ok(visited)
}

/// Kahn's algorithm over "runs after" edges restricted to `members`.
fn topological_order(graph: &TaskGraph, members: &HashSet<usize>) -> ShipyardResult<Vec<usize>> {
    let mut in_degree: HashMap<usize, usize> = members.iter().map(|&m| (m, 0)).collect();
    let mut successors: HashMap<usize, BTreeSet<usize>> = HashMap::new();

    for &member in members {
        let task = graph.task_at(member);
        for before in task.depends_on.iter().chain(task.finalizes.iter()) {
            let before = position_of(graph, before)?;
            if members.contains(&before) && successors.entry(before).or_default().insert(member) {
                *in_degree.entry(member).or_default() += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&position, _)| Reverse(position))
        .collect();
    let mut order = Vec::with_capacity(members.len());

    while let Some(Reverse(position)) = ready.pop() {
        order.push(position);
        if let Some(next) = successors.get(&position) {
            for &successor in next {
                if let Some(degree) = in_degree.get_mut(&successor) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(Reverse(successor));
                    }
                }
            }
        }
    }

    if order.len() != members.len() {
        return Err(ShipyardError::CycleDetected(
            "tasks remain after ordering the schedule".to_string(),
        ));
    }

    Ok(order)
}

fn position_of(graph: &TaskGraph, id: &str) -> ShipyardResult<usize> {
    graph
        .position(id)
        .ok_or_else(|| ShipyardError::UnknownTask(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Task;

    fn index_of(schedule: &Schedule, id: &str) -> usize {
        schedule
            .entries
            .iter()
            .position(|entry| entry.id == id)
            .unwrap_or_else(|| panic!("{id} not scheduled"))
    }

    #[test]
    fn test_closure_excludes_unrelated_tasks() {
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("unrelated")).unwrap();
        graph.register(Task::no_op("copyLibs")).unwrap();
        graph.register(Task::no_op("jar").depends_on(["copyLibs"])).unwrap();

        let schedule = graph.schedule("jar").unwrap();
        assert_eq!(schedule.ids(), vec!["copyLibs", "jar"]);
        assert!(!schedule.contains("unrelated"));
    }

    #[test]
    fn test_ties_break_by_registration_order() {
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("c")).unwrap();
        graph.register(Task::no_op("a")).unwrap();
        graph.register(Task::no_op("b")).unwrap();
        graph
            .register(Task::no_op("all").depends_on(["b", "a", "c"]))
            .unwrap();

        let schedule = graph.schedule("all").unwrap();
        assert_eq!(schedule.ids(), vec!["c", "a", "b", "all"]);
    }

    #[test]
    fn test_diamond_appears_once() {
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("root")).unwrap();
        graph.register(Task::no_op("left").depends_on(["root"])).unwrap();
        graph.register(Task::no_op("right").depends_on(["root"])).unwrap();
        graph
            .register(Task::no_op("top").depends_on(["left", "right"]))
            .unwrap();

        let schedule = graph.schedule("top").unwrap();
        assert_eq!(schedule.entries.len(), 4);
        assert_eq!(index_of(&schedule, "root"), 0);
        assert_eq!(index_of(&schedule, "top"), 3);
    }

    #[test]
    fn test_finalizers_and_their_dependencies_are_scheduled_after() {
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("cleanJars").finalizes("jar")).unwrap();
        graph.register(Task::no_op("copyLibs")).unwrap();
        graph.register(Task::no_op("jar").depends_on(["copyLibs"])).unwrap();
        graph.register(Task::no_op("prepare")).unwrap();
        graph
            .register(
                Task::no_op("buildDocker")
                    .depends_on(["prepare", "copyLibs"])
                    .finalizes("jar"),
            )
            .unwrap();

        let schedule = graph.schedule("jar").unwrap();
        assert_eq!(schedule.role_of("jar"), Some(TaskRole::Target));
        assert_eq!(schedule.role_of("copyLibs"), Some(TaskRole::Target));
        assert_eq!(schedule.role_of("cleanJars"), Some(TaskRole::Finalizer));
        assert_eq!(schedule.role_of("buildDocker"), Some(TaskRole::Finalizer));
        assert_eq!(schedule.role_of("prepare"), Some(TaskRole::Finalizer));
        assert!(index_of(&schedule, "cleanJars") > index_of(&schedule, "jar"));
        assert!(index_of(&schedule, "buildDocker") > index_of(&schedule, "jar"));
        assert!(index_of(&schedule, "prepare") < index_of(&schedule, "buildDocker"));
    }

    #[test]
    fn test_finalizer_of_finalizer_is_scheduled() {
        let mut graph = TaskGraph::new();
        graph.register(Task::no_op("build")).unwrap();
        graph.register(Task::no_op("notify").finalizes("build")).unwrap();
        graph.register(Task::no_op("archiveLogs").finalizes("notify")).unwrap();

        let schedule = graph.schedule("build").unwrap();
        assert_eq!(schedule.ids(), vec!["build", "notify", "archiveLogs"]);
    }

    #[test]
    fn test_unknown_target() {
        let graph = TaskGraph::new();
        assert!(matches!(
            graph.schedule("buildDocker"),
            Err(ShipyardError::UnknownTask(_))
        ));
    }
}
