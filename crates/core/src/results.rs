//! Result types for pipeline operations
//!
//! This module contains the result types returned by the runner and the
//! pipeline manager, providing a centralized location for output structures.

use std::path::PathBuf;

use serde_json::{json, Value};
use shipyard_task_protocol::TaskStatus;

use crate::execution::dependencies::TaskRole;
use crate::types::ShipyardError;

/// Status of one scheduled task after a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub id: String,
    pub status: TaskStatus,
    pub role: TaskRole,
}

/// A task that failed during a run
#[derive(Debug)]
pub struct TaskFailure {
    pub task: String,
    pub error: ShipyardError,
}

/// Aggregate outcome of a pipeline run
#[derive(Debug)]
pub struct RunReport {
    pub target: String,
    /// False when the activation condition skipped the whole pipeline
    pub active: bool,
    /// Scheduled tasks in execution order
    pub tasks: Vec<TaskReport>,
    pub failures: Vec<TaskFailure>,
}

impl RunReport {
    /// Report for a run skipped by the activation condition
    pub fn inactive(target: &str) -> Self {
        Self {
            target: target.to_string(),
            active: false,
            tasks: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn status_of(&self, id: &str) -> Option<TaskStatus> {
        self.tasks.iter().find(|t| t.id == id).map(|t| t.status)
    }

    /// Tasks that were started, in execution order
    pub fn executed(&self) -> Vec<&str> {
        self.tasks
            .iter()
            .filter(|t| t.status.was_attempted())
            .map(|t| t.id.as_str())
            .collect()
    }

    pub fn to_json(&self) -> Value {
        json!({
            "target": self.target,
            "active": self.active,
            "success": self.success(),
            "tasks": self.tasks.iter().map(|t| json!({
                "id": t.id,
                "status": t.status,
                "role": t.role.as_str(),
            })).collect::<Vec<_>>(),
            "failures": self.failures.iter().map(|f| json!({
                "task": f.task,
                "error": f.error.to_string(),
            })).collect::<Vec<_>>(),
        })
    }
}

/// Information about a registered task
#[derive(Debug, Clone)]
pub struct TaskSummary {
    pub id: String,
    pub kind: &'static str,
    pub description: Option<String>,
    pub depends_on: Vec<String>,
    pub finalizes: Vec<String>,
    pub finalized_by: Vec<String>,
    pub do_last: Vec<String>,
}

/// Result of getting the dependency graph
#[derive(Debug)]
pub struct DependencyGraphResult {
    pub tasks: Vec<TaskSummary>,
    pub cycles: Vec<Vec<String>>,
}

/// Result of planning a run without executing it
#[derive(Debug)]
pub struct ExecutionPlanResult {
    pub target: String,
    pub active: bool,
    pub order: Vec<(String, TaskRole)>,
}

/// Result of listing the tasks of a pipeline
#[derive(Debug)]
pub struct TaskListResult {
    pub name: Option<String>,
    pub config_path: PathBuf,
    pub tasks: Vec<TaskSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_report_is_successful_and_empty() {
        let report = RunReport::inactive("buildDocker");
        assert!(report.success());
        assert!(!report.active);
        assert!(report.executed().is_empty());
        assert_eq!(report.to_json()["success"], true);
    }

    #[test]
    fn test_failed_report_json() {
        let report = RunReport {
            target: "buildDocker".to_string(),
            active: true,
            tasks: vec![
                TaskReport {
                    id: "copyLibs".to_string(),
                    status: TaskStatus::Failed,
                    role: TaskRole::Target,
                },
                TaskReport {
                    id: "buildDocker".to_string(),
                    status: TaskStatus::Pending,
                    role: TaskRole::Target,
                },
            ],
            failures: vec![TaskFailure {
                task: "copyLibs".to_string(),
                error: ShipyardError::ExternalCommandFailed {
                    command: "./build.sh".to_string(),
                    exit_code: 1,
                },
            }],
        };

        assert!(!report.success());
        assert_eq!(report.executed(), vec!["copyLibs"]);
        assert_eq!(report.status_of("buildDocker"), Some(TaskStatus::Pending));

        let json = report.to_json();
        assert_eq!(json["tasks"][0]["status"], "failed");
        assert_eq!(json["failures"][0]["task"], "copyLibs");
        assert!(json["failures"][0]["error"]
            .as_str()
            .unwrap()
            .contains("exit code 1"));
    }
}
