// casup-aio/src/process.rs
use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use casup_common::error::{CasupError, Result};
use tokio::process::Command;
use tracing::{debug, error};

/// A single bounded run of an external program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub timeout: Duration,
    /// When set, stdout and stderr are appended to this file instead of being captured.
    pub log_file: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
            log_file: None,
        }
    }

    pub fn logging_to(mut self, log_file: impl Into<PathBuf>) -> Self {
        self.log_file = Some(log_file.into());
        self
    }

    /// Value following `flag` in the argument list, if present.
    pub fn arg_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.args.iter().any(|a| a == flag)
    }
}

/// Outcome of a program that ran to completion (successfully or not).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

/// Runs external programs. The uploader logic only talks to the client
/// through this seam.
pub trait CommandRunner {
    /// Runs the invocation to completion. Spawn failures are
    /// `CommandExecError`, exceeding the timeout is `CommandTimeout`; a
    /// non-zero exit is reported through [`CommandOutput::success`].
    fn run(&self, invocation: &Invocation) -> impl Future<Output = Result<CommandOutput>> + Send;
}

/// Runs programs as tokio child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        debug!(
            "Running command: {} {:?} (timeout: {:?})",
            invocation.program.display(),
            invocation.args,
            invocation.timeout
        );

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        cmd.kill_on_drop(true); // A timed-out child is killed when its future is dropped
        cmd.stdin(Stdio::null());

        match &invocation.log_file {
            Some(path) => {
                let log = crate::fs::open_append(path)?;
                let log_err = log.try_clone().map_err(|e| CasupError::Io(Arc::new(e)))?;
                cmd.stdout(Stdio::from(log));
                cmd.stderr(Stdio::from(log_err));
            }
            None => {
                cmd.stdout(Stdio::piped());
                cmd.stderr(Stdio::piped());
            }
        }

        let child = cmd.spawn().map_err(|e| {
            error!(
                "Failed to execute command {}: {}",
                invocation.program.display(),
                e
            );
            CasupError::CommandExecError(format!("{}: {e}", invocation.program.display()))
        })?;

        let output = match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(CasupError::Io(Arc::new(e))),
            Err(_) => {
                return Err(CasupError::CommandTimeout(
                    invocation.program.display().to_string(),
                    invocation.timeout,
                ))
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if output.status.success() {
            debug!("Command finished successfully.");
        } else {
            debug!("Command failed with status: {}", output.status);
            if !stderr.trim().is_empty() {
                debug!("Stderr:\n{}", stderr.trim());
            }
        }

        Ok(CommandOutput {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout,
            stderr,
        })
    }
}
