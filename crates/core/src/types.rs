use std::path::PathBuf;

use thiserror::Error;

/// The main error type for Shipyard operations
#[derive(Debug, Error)]
pub enum ShipyardError {
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Task '{0}' is already registered")]
    DuplicateTask(String),

    #[error("Task '{0}' not found")]
    UnknownTask(String),

    #[error("Task '{task}' depends on '{dependency}' which was not registered")]
    UnknownDependency { task: String, dependency: String },

    #[error("Circular dependency detected: {0}")]
    CycleDetected(String),

    #[error("Invalid glob pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Failed to execute command '{command}': {source}")]
    CommandLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command '{command}' failed with exit code {exit_code}")]
    ExternalCommandFailed { command: String, exit_code: i32 },

    #[error("Failed to delete '{path}': {cause}", path = path.display())]
    DeleteFailed {
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },

    #[error("Task '{task}' failed: {reason}")]
    Runnable { task: String, reason: String },
}

impl ShipyardError {
    /// Whether the error is detected before any task body executes.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateTask(_)
                | Self::UnknownTask(_)
                | Self::UnknownDependency { .. }
                | Self::CycleDetected(_)
                | Self::InvalidPattern { .. }
                | Self::Config(_)
                | Self::Yaml(_)
        )
    }
}

/// Result type alias for Shipyard operations
pub type ShipyardResult<T> = Result<T, ShipyardError>;
