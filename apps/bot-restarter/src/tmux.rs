//! tmux session control.

use async_trait::async_trait;
use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum TmuxError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status:?}: {stderr}")]
    CommandFailed {
        command: String,
        status: Option<i32>,
        stderr: String,
    },
}

/// Captured result of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code; None when killed by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Runs external programs. Swapped for a recorder in tests.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput>;
}

/// Runs programs with `tokio::process`.
#[derive(Debug, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

/// One named tmux session.
pub struct TmuxSession {
    tmux_bin: String,
    name: String,
    working_dir: Option<String>,
    runner: Arc<dyn CommandRunner>,
}

impl TmuxSession {
    pub fn new(
        tmux_bin: impl Into<String>,
        name: impl Into<String>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            tmux_bin: tmux_bin.into(),
            name: name.into(),
            working_dir: None,
            runner,
        }
    }

    /// Start new sessions in `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: Option<String>) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn display(&self, args: &[String]) -> String {
        format!("{} {}", self.tmux_bin, args.join(" "))
    }

    async fn exec(&self, args: Vec<String>) -> Result<CommandOutput, TmuxError> {
        let output = self
            .runner
            .run(&self.tmux_bin, &args)
            .await
            .map_err(|source| TmuxError::Spawn {
                command: self.display(&args),
                source,
            })?;
        debug!(
            command = %self.display(&args),
            status = ?output.status,
            stdout = %output.stdout,
            "tmux finished"
        );
        Ok(output)
    }

    async fn exec_checked(&self, args: Vec<String>) -> Result<CommandOutput, TmuxError> {
        let command = self.display(&args);
        let output = self.exec(args).await?;
        if !output.success() {
            return Err(TmuxError::CommandFailed {
                command,
                status: output.status,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    /// Kill the session. Returns false if it did not exist (or could not be
    /// killed); that is expected on a first run and is not an error.
    pub async fn kill(&self) -> Result<bool, TmuxError> {
        let output = self
            .exec(vec!["kill-session".into(), "-t".into(), self.name.clone()])
            .await?;

        if output.success() {
            info!("Killed existing tmux session `{}`", self.name);
            Ok(true)
        } else {
            info!(
                "tmux session `{}` not found or not killed (first run?): {}",
                self.name, output.stderr
            );
            Ok(false)
        }
    }

    /// Create the session detached.
    pub async fn create(&self) -> Result<(), TmuxError> {
        let mut args = vec![
            "new-session".to_string(),
            "-d".to_string(),
            "-s".to_string(),
            self.name.clone(),
        ];
        if let Some(dir) = &self.working_dir {
            args.push("-c".to_string());
            args.push(dir.clone());
        }
        self.exec_checked(args).await?;
        info!("Created tmux session `{}`", self.name);
        Ok(())
    }

    /// Type `command` into the session and press Enter.
    pub async fn send_command(&self, command: &str) -> Result<(), TmuxError> {
        self.exec_checked(vec![
            "send-keys".to_string(),
            "-t".to_string(),
            self.name.clone(),
            command.to_string(),
            "Enter".to_string(),
        ])
        .await?;
        info!("Sent start command to tmux session `{}`", self.name);
        Ok(())
    }

    /// Kill, recreate and start `command` in the session.
    pub async fn restart(&self, command: &str) -> Result<(), TmuxError> {
        self.kill().await?;
        self.create().await?;
        self.send_command(command).await
    }
}

/// Records invocations and replays scripted outputs. For tests.
#[cfg(test)]
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Vec<String>>>,
    outputs: Mutex<Vec<std::io::Result<CommandOutput>>>,
}

#[cfg(test)]
impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outputs are consumed in call order; once exhausted every call succeeds.
    pub fn with_outputs(self, outputs: Vec<std::io::Result<CommandOutput>>) -> Self {
        if let Ok(mut queue) = self.outputs.lock() {
            *queue = outputs.into_iter().rev().collect();
        }
        self
    }

    /// Every recorded call as `[program, args...]`.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn ok() -> std::io::Result<CommandOutput> {
        Ok(CommandOutput {
            status: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    pub fn failed(status: i32, stderr: &str) -> std::io::Result<CommandOutput> {
        Ok(CommandOutput {
            status: Some(status),
            stdout: String::new(),
            stderr: stderr.to_string(),
        })
    }
}

#[cfg(test)]
#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> std::io::Result<CommandOutput> {
        if let Ok(mut calls) = self.calls.lock() {
            let mut call = vec![program.to_string()];
            call.extend(args.iter().cloned());
            calls.push(call);
        }
        self.outputs
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop())
            .unwrap_or_else(Self::ok)
    }
}
