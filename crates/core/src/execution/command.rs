//! External command execution
//!
//! Runs external collaborator scripts (`build.sh`, `after-build.sh`, the
//! Docker CLI) with a working directory, turning a non-zero exit code into an
//! error. Commands are never retried. Child output is passed through on
//! stderr, leaving stdout to the caller's reports.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use colored::*;
use tracing::{debug, warn};

use crate::tasks::get_task_color;
use crate::types::{ShipyardError, ShipyardResult};

/// An external process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub working_dir: PathBuf,
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(working_dir: impl Into<PathBuf>, program: impl Into<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Rebase a relative working directory onto `base`.
    pub fn resolved_against(&self, base: &Path) -> Self {
        Self {
            working_dir: base.join(&self.working_dir),
            program: self.program.clone(),
            args: self.args.clone(),
        }
    }

    /// Program path as handed to the OS.
    ///
    /// A relative path with a separator (`./build.sh`, `bin/tool`) is resolved
    /// against the working directory; bare names go through `PATH`.
    pub fn resolved_program(&self) -> OsString {
        let program = Path::new(&self.program);
        let has_separator = program.components().count() > 1;
        if program.is_relative() && has_separator {
            self.working_dir.join(program).into_os_string()
        } else {
            OsString::from(&self.program)
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Unified command executor that handles common setup and execution patterns
pub struct CommandExecutor<'a> {
    task: &'a str,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(task: &'a str) -> Self {
        Self { task }
    }

    /// Execute the command, blocking until the child exits
    pub fn execute(&self, spec: &CommandSpec) -> ShipyardResult<()> {
        let mut command = Command::new(spec.resolved_program());
        command.args(&spec.args);
        command.current_dir(&spec.working_dir);
        command.stdout(Stdio::from(std::io::stderr()));
        command.env("SHIPYARD_TASK", self.task);

        debug!(
            task = self.task,
            command = %spec,
            working_dir = %spec.working_dir.display(),
            "Spawning external command"
        );

        let status = command
            .status()
            .map_err(|source| ShipyardError::CommandLaunch {
                command: spec.to_string(),
                source,
            })?;

        if !status.success() {
            // Killed by a signal has no exit code
            let exit_code = status.code().unwrap_or(-1);
            warn!(task = self.task, command = %spec, exit_code, "External command failed");
            return Err(ShipyardError::ExternalCommandFailed {
                command: spec.to_string(),
                exit_code,
            });
        }

        self.show_completion_message(spec);
        Ok(())
    }

    fn show_completion_message(&self, spec: &CommandSpec) {
        let task_color = get_task_color(self.task);
        eprintln!(
            "{} {}",
            "✓".green().bold(),
            format!("{} finished for {}", spec, self.task).color(task_color)
        );
    }
}
