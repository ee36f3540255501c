//! Activation condition and pipeline settings
//!
//! The whole pipeline is gated by two boolean flags that are read once,
//! before any task is registered. Values come from `-P key=value` properties
//! first and from `SHIPYARD_*` environment variables second; anything other
//! than a case-insensitive `true` reads as `false`.

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::info;

use crate::types::{ShipyardError, ShipyardResult};

/// Prefix for environment variables that can supply flag values
pub const ENV_PREFIX: &str = "SHIPYARD_";

/// Default property name of the Docker flag
pub const DEFAULT_ENABLE_DOCKER_KEY: &str = "enable-docker";

/// Default property name of the build-target flag
pub const DEFAULT_BUILD_TARGET_KEY: &str = "build-cdc-agents";

/// The two-flag gate in front of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivationCondition {
    pub enable_docker: bool,
    pub build_target: bool,
}

impl ActivationCondition {
    pub const fn new(enable_docker: bool, build_target: bool) -> Self {
        Self {
            enable_docker,
            build_target,
        }
    }

    pub const fn active() -> Self {
        Self::new(true, true)
    }

    pub const fn inactive() -> Self {
        Self::new(false, false)
    }

    /// The pipeline only does anything when both flags are set.
    pub const fn is_active(&self) -> bool {
        self.enable_docker && self.build_target
    }

    /// Read both flags from the given property source.
    pub fn from_properties(
        properties: &PropertySource,
        enable_docker_key: &str,
        build_target_key: &str,
    ) -> Self {
        let condition = Self::new(
            parse_flag(properties.lookup(enable_docker_key).as_deref()),
            parse_flag(properties.lookup(build_target_key).as_deref()),
        );

        info!(
            enable_docker = condition.enable_docker,
            build_target = condition.build_target,
            "{}: {}, {}: {}",
            enable_docker_key,
            condition.enable_docker,
            build_target_key,
            condition.build_target
        );

        condition
    }
}

/// Parse a flag value; unset or unparseable values are `false`.
pub fn parse_flag(value: Option<&str>) -> bool {
    value
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Environment variable consulted for a property key, e.g.
/// `enable-docker` -> `SHIPYARD_ENABLE_DOCKER`.
pub fn env_var_name(key: &str) -> String {
    let normalized: String = key
        .chars()
        .map(|c| match c {
            '-' | '.' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect();
    format!("{}{}", ENV_PREFIX, normalized)
}

/// Parse a `key=value` property assignment as given to `-P`.
pub fn parse_property_assignment(assignment: &str) -> ShipyardResult<(String, String)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(ShipyardError::Config(format!(
            "Invalid property '{}', expected key=value",
            assignment
        ))),
    }
}

/// Explicit properties layered over environment variables
#[derive(Debug, Clone, Default)]
pub struct PropertySource {
    properties: HashMap<String, String>,
    environment: HashMap<String, String>,
}

impl PropertySource {
    pub fn new(properties: HashMap<String, String>, environment: HashMap<String, String>) -> Self {
        Self {
            properties,
            environment,
        }
    }

    /// Explicit properties plus the `SHIPYARD_*` variables of this process.
    pub fn from_process_env(properties: HashMap<String, String>) -> Self {
        let environment = std::env::vars()
            .filter(|(name, _)| name.starts_with(ENV_PREFIX))
            .collect();
        Self::new(properties, environment)
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        self.properties
            .get(key)
            .or_else(|| self.environment.get(&env_var_name(key)))
            .cloned()
    }
}

/// Immutable settings handed to the runner for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Base directory for relative working directories and delete roots
    pub project_dir: PathBuf,
    pub condition: ActivationCondition,
}

impl PipelineSettings {
    pub fn new(project_dir: impl Into<PathBuf>, condition: ActivationCondition) -> Self {
        Self {
            project_dir: project_dir.into(),
            condition,
        }
    }
}
