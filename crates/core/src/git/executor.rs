//! The executor seam between the migration pipeline and `git` subprocesses.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use super::command::GitCommand;
use crate::errors::GitError;

/// Captured result of one git invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful invocation that printed `stdout`.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed invocation with the given exit code and error output.
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// stdout followed by stderr, the way a terminal would show them.
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (_, true) => self.stdout.clone(),
            (true, false) => self.stderr.clone(),
            (false, false) => format!("{}{}", self.stdout, self.stderr),
        }
    }
}

/// Runs git commands on behalf of the pipeline.
///
/// Stages only ever talk to the repository through this trait, so tests can
/// substitute a scripted implementation.
pub trait GitExecutor: Sync {
    /// Run `command` and report how it exited. A non-zero exit is not an
    /// error at this level.
    fn execute(
        &self,
        command: &GitCommand,
    ) -> impl Future<Output = Result<CommandOutput, GitError>> + Send;

    /// Run `command`, turning a non-zero exit into
    /// [`GitError::CommandFailed`].
    fn run(
        &self,
        command: &GitCommand,
    ) -> impl Future<Output = Result<CommandOutput, GitError>> + Send {
        async move {
            let output = self.execute(command).await?;
            if !output.success() {
                let exit_code = output.exit_code.unwrap_or(-1);
                let combined = output.combined();
                warn!(exit_code, command = %command, output = %combined.trim_end(), "git command failed");
                return Err(GitError::CommandFailed {
                    command: command.to_string(),
                    exit_code,
                    output: combined,
                });
            }
            Ok(output)
        }
    }
}

/// [`GitExecutor`] spawning the real `git` binary.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    repo_dir: PathBuf,
    passthrough: bool,
}

impl ProcessExecutor {
    /// Run git inside `repo_dir`.
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
            passthrough: false,
        }
    }

    /// Let long-running commands inherit the terminal instead of capturing
    /// their output.
    pub fn with_passthrough(mut self, passthrough: bool) -> Self {
        self.passthrough = passthrough;
        self
    }

    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }
}

impl GitExecutor for ProcessExecutor {
    async fn execute(&self, command: &GitCommand) -> Result<CommandOutput, GitError> {
        if !self.repo_dir.is_dir() {
            return Err(GitError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("repository directory {} does not exist", self.repo_dir.display()),
            )));
        }

        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo_dir).args(command.args());
        for (key, value) in command.env() {
            cmd.env(key, value);
        }

        debug!(cmd = %command, "running git command");

        let inherit = self.passthrough && command.is_passthrough();
        if inherit {
            cmd.stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit());
            let status = cmd.status().await.map_err(spawn_error)?;
            return Ok(CommandOutput {
                exit_code: status.code(),
                ..CommandOutput::default()
            });
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let output = cmd.output().await.map_err(spawn_error)?;
        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

fn spawn_error(e: std::io::Error) -> GitError {
    if e.kind() == std::io::ErrorKind::NotFound {
        GitError::BinaryNotFound("git".into())
    } else {
        GitError::IoError(e)
    }
}
