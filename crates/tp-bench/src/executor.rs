//! Blocking execution of benchmark runner commands.

use std::process::{Command, Stdio};

use tp_types::{ExecutionError, TpResult};

/// Captured result of one finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs a command line to completion.
pub trait CommandExecutor {
    fn execute(&mut self, command: &str) -> TpResult<ProcessOutput>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &mut E {
    fn execute(&mut self, command: &str) -> TpResult<ProcessOutput> {
        (**self).execute(command)
    }
}

/// Executes commands with `sh -c`, so flag strings are word-split by the shell.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }

    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for ShellExecutor {
    fn execute(&mut self, command: &str) -> TpResult<ProcessOutput> {
        tracing::debug!("Running: {}", command);

        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| ExecutionError::SpawnFailed {
                command: command.to_string(),
                message: e.to_string(),
            })?;

        Ok(ProcessOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
