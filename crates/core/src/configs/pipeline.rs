use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::activation::{DEFAULT_BUILD_TARGET_KEY, DEFAULT_ENABLE_DOCKER_KEY};
use crate::types::{ShipyardError, ShipyardResult};

/// Default name of the pipeline file inside the project directory
pub const DEFAULT_PIPELINE_FILE: &str = "shipyard.yml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum Command {
    /// Program run without arguments, e.g. `./build.sh`
    Single(String),
    /// Program followed by its arguments
    Multiple(Vec<String>),
}

impl Command {
    /// Split into program and arguments.
    pub fn program_and_args(&self) -> ShipyardResult<(String, Vec<String>)> {
        match self {
            Command::Single(program) if !program.trim().is_empty() => {
                Ok((program.trim().to_string(), Vec::new()))
            }
            Command::Multiple(parts) if !parts.is_empty() => {
                Ok((parts[0].clone(), parts[1..].to_vec()))
            }
            _ => Err(ShipyardError::Config("Empty command".to_string())),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActivationConfig {
    /// Property that enables Docker steps
    #[serde(default = "default_enable_docker_key")]
    pub enable_docker: String,
    /// Property that enables building this target
    #[serde(default = "default_build_target_key")]
    pub build_target: String,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            enable_docker: default_enable_docker_key(),
            build_target: default_build_target_key(),
        }
    }
}

fn default_enable_docker_key() -> String {
    DEFAULT_ENABLE_DOCKER_KEY.to_string()
}

fn default_build_target_key() -> String {
    DEFAULT_BUILD_TARGET_KEY.to_string()
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DockerConfig {
    /// Docker CLI to invoke, `docker` when omitted
    pub binary: Option<String>,
    pub contexts: Vec<DockerContextConfig>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DockerContextConfig {
    /// Image tag, e.g. `localhost:5001/cdc-agents`
    pub image: String,
    /// Build context directory, relative to the project directory
    pub dir: String,
    /// Prefix of the generated `<prefix>DockerImage` task
    pub prefix: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DeleteMatchingConfig {
    pub base_dir: String,
    pub pattern: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActionConfig {
    pub command: Command,
    pub working_dir: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskConfig {
    pub name: String,
    pub description: Option<String>,
    pub command: Option<Command>,
    pub working_dir: Option<String>,
    pub delete_matching: Option<DeleteMatchingConfig>,
    pub depends_on: Option<Vec<String>>,
    /// Tasks this task finalizes
    pub finalizes: Option<Vec<String>>,
    /// Tasks that finalize this task
    pub finalized_by: Option<Vec<String>>,
    pub do_last: Option<Vec<ActionConfig>>,
}

/// Additional wiring for a task registered elsewhere (e.g. a Docker task)
#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskExtensionConfig {
    pub task: String,
    pub depends_on: Option<Vec<String>>,
    pub finalized_by: Option<Vec<String>>,
    pub do_last: Option<Vec<ActionConfig>>,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub activation: ActivationConfig,
    /// Target run when none is given on the command line
    pub default_target: Option<String>,
    pub docker: Option<DockerConfig>,
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
    #[serde(default)]
    pub extend: Vec<TaskExtensionConfig>,
}

pub fn parse_pipeline_config(yaml_str: &str) -> ShipyardResult<PipelineConfig> {
    let config: PipelineConfig = serde_yaml::from_str(yaml_str)?;
    Ok(config)
}

/// JSON schema of the pipeline file
pub fn pipeline_config_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(PipelineConfig);
    serde_json::to_value(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_pipeline() {
        let config = parse_pipeline_config(
            r#"
name: cdc-agents
activation:
  enableDocker: enable-docker
  buildTarget: build-cdc-agents
defaultTarget: buildDocker
docker:
  contexts:
    - image: localhost:5001/cdc-agents
      dir: docker
      prefix: cdcAgents
tasks:
  - name: copyLibs
    command: ./build.sh
    workingDir: docker
  - name: cleanJars
    deleteMatching:
      baseDir: src/main/docker
      pattern: "*.jar"
    finalizes: [buildDocker]
  - name: buildDocker
    dependsOn: [copyLibs, cdcAgentsDockerImage, pushImages]
extend:
  - task: pushImages
    dependsOn: [copyLibs]
    doLast:
      - command: ./after-build.sh
        workingDir: docker
"#,
        )
        .unwrap();

        assert_eq!(config.name.as_deref(), Some("cdc-agents"));
        assert_eq!(config.tasks.len(), 3);
        assert_eq!(
            config.tasks[0].command,
            Some(Command::Single("./build.sh".to_string()))
        );
        assert_eq!(config.docker.as_ref().unwrap().contexts[0].prefix, "cdcAgents");
        assert_eq!(config.extend[0].task, "pushImages");
    }

    #[test]
    fn test_activation_defaults() {
        let config = parse_pipeline_config("tasks: []").unwrap();
        assert_eq!(config.activation.enable_docker, "enable-docker");
        assert_eq!(config.activation.build_target, "build-cdc-agents");
        assert!(config.docker.is_none());
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = parse_pipeline_config("tasks:\n  - name: a\n    runAfter: [b]\n").unwrap_err();
        assert!(matches!(err, ShipyardError::Yaml(_)));
    }

    #[test]
    fn test_command_with_arguments() {
        let command = Command::Multiple(vec!["docker".into(), "push".into(), "img".into()]);
        let (program, args) = command.program_and_args().unwrap();
        assert_eq!(program, "docker");
        assert_eq!(args, vec!["push".to_string(), "img".to_string()]);

        assert!(Command::Multiple(Vec::new()).program_and_args().is_err());
        assert!(Command::Single("  ".into()).program_and_args().is_err());
    }

    #[test]
    fn test_schema_mentions_tasks() {
        let schema = pipeline_config_schema();
        assert!(schema.to_string().contains("deleteMatching"));
    }
}
