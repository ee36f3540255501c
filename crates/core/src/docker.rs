//! Docker collaborator tasks
//!
//! Each configured Docker context contributes a `<prefix>DockerImage` task
//! and all contexts share one `pushImages` task. Both are opaque to the
//! runner: they implement [`Runnable`] and shell out to the Docker CLI, the
//! image contents are never inspected here.

use std::path::{Path, PathBuf};

use shipyard_task_protocol::{Outcome, Runnable, StatusReporter};

use crate::configs::pipeline::DockerConfig;
use crate::execution::command::{CommandExecutor, CommandSpec};

pub const DEFAULT_DOCKER_BINARY: &str = "docker";
pub const PUSH_IMAGES_TASK: &str = "pushImages";

/// One image to build from a context directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DockerContext {
    pub image: String,
    pub dir: PathBuf,
    pub prefix: String,
}

impl DockerContext {
    pub fn task_id(&self) -> String {
        format!("{}DockerImage", self.prefix)
    }
}

/// Contexts from the pipeline file, with directories resolved.
pub fn docker_contexts(config: &DockerConfig, project_dir: &Path) -> Vec<DockerContext> {
    config
        .contexts
        .iter()
        .map(|context| DockerContext {
            image: context.image.clone(),
            dir: project_dir.join(&context.dir),
            prefix: context.prefix.clone(),
        })
        .collect()
}

/// `docker build -t <image> <dir>`
pub struct DockerImageTask {
    id: String,
    binary: String,
    working_dir: PathBuf,
    context: DockerContext,
}

impl DockerImageTask {
    pub fn new(binary: &str, working_dir: impl Into<PathBuf>, context: DockerContext) -> Self {
        Self {
            id: context.task_id(),
            binary: binary.to_string(),
            working_dir: working_dir.into(),
            context,
        }
    }

    fn command(&self) -> CommandSpec {
        CommandSpec::new(&self.working_dir, &self.binary).with_args([
            "build".to_string(),
            "-t".to_string(),
            self.context.image.clone(),
            self.context.dir.display().to_string(),
        ])
    }
}

impl Runnable for DockerImageTask {
    fn id(&self) -> &str {
        &self.id
    }

    fn description(&self) -> Option<String> {
        Some(format!("Build image {}", self.context.image))
    }

    fn run(&self, reporter: &mut dyn StatusReporter) -> Outcome {
        reporter.progress(&format!("Building image {}", self.context.image));
        match CommandExecutor::new(&self.id).execute(&self.command()) {
            Ok(()) => Outcome::Succeeded,
            Err(e) => Outcome::failed(e.to_string()),
        }
    }
}

/// `docker push <image>` for every context, stopping at the first failure
pub struct PushImagesTask {
    binary: String,
    working_dir: PathBuf,
    images: Vec<String>,
}

impl PushImagesTask {
    pub fn new(binary: &str, working_dir: impl Into<PathBuf>, contexts: &[DockerContext]) -> Self {
        Self {
            binary: binary.to_string(),
            working_dir: working_dir.into(),
            images: contexts.iter().map(|c| c.image.clone()).collect(),
        }
    }
}

impl Runnable for PushImagesTask {
    fn id(&self) -> &str {
        PUSH_IMAGES_TASK
    }

    fn description(&self) -> Option<String> {
        Some(format!("Push {}", self.images.join(", ")))
    }

    fn run(&self, reporter: &mut dyn StatusReporter) -> Outcome {
        let executor = CommandExecutor::new(PUSH_IMAGES_TASK);
        for image in &self.images {
            reporter.progress(&format!("Pushing image {}", image));
            let spec = CommandSpec::new(&self.working_dir, &self.binary)
                .with_args(["push", image.as_str()]);
            if let Err(e) = executor.execute(&spec) {
                return Outcome::failed(e.to_string());
            }
        }
        Outcome::Succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::pipeline::DockerContextConfig;

    struct Collect(Vec<String>);

    impl StatusReporter for Collect {
        fn progress(&mut self, message: &str) {
            self.0.push(message.to_string());
        }
    }

    fn context() -> DockerContext {
        DockerContext {
            image: "localhost:5001/cdc-agents".to_string(),
            dir: PathBuf::from("/project/docker"),
            prefix: "cdcAgents".to_string(),
        }
    }

    #[test]
    fn test_contexts_resolve_against_project_dir() {
        let config = DockerConfig {
            binary: None,
            contexts: vec![DockerContextConfig {
                image: "localhost:5001/cdc-agents".to_string(),
                dir: "docker".to_string(),
                prefix: "cdcAgents".to_string(),
            }],
        };

        let contexts = docker_contexts(&config, Path::new("/project"));
        assert_eq!(contexts, vec![context()]);
        assert_eq!(contexts[0].task_id(), "cdcAgentsDockerImage");
    }

    #[test]
    fn test_image_task_command_line() {
        let task = DockerImageTask::new("docker", "/project", context());
        assert_eq!(task.id(), "cdcAgentsDockerImage");
        assert_eq!(
            task.command().to_string(),
            "docker build -t localhost:5001/cdc-agents /project/docker"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_push_reports_each_image() {
        let dir = tempfile::tempdir().unwrap();
        let task = PushImagesTask::new("true", dir.path(), &[context()]);
        let mut collect = Collect(Vec::new());

        assert!(task.run(&mut collect).is_success());
        assert_eq!(collect.0, vec!["Pushing image localhost:5001/cdc-agents".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_build_is_a_failed_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let task = DockerImageTask::new("false", dir.path(), context());

        let outcome = task.run(&mut Collect(Vec::new()));
        assert!(outcome.failure_reason().unwrap().contains("exit code 1"));
    }
}
