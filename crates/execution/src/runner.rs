//! Code runners - execute a submission and capture what it printed.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use pychamp_core::Level;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Errors that prevent a submission from running at all.
///
/// Exceptions raised by the submitted program are not errors here; they are
/// reported in [`RunOutcome::error`].
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Nothing to run
    #[error("no code to run")]
    EmptyCode,

    /// Interpreter could not be started
    #[error("failed to start interpreter: {0}")]
    Spawn(#[source] std::io::Error),

    /// Program did not finish in time
    #[error("program did not finish within {0:?}")]
    Timeout(Duration),
}

/// Captured result of running a submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutcome {
    /// Standard output, trimmed
    pub output: String,
    /// Error message if the program failed
    pub error: Option<String>,
}

impl RunOutcome {
    /// Whether the program ran to completion without raising.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Executes submitted code for a level.
#[async_trait]
pub trait CodeRunner: Send + Sync {
    /// Run `code` as the player's attempt at `level`.
    async fn run(&self, code: &str, level: &Level) -> Result<RunOutcome, RunnerError>;
}

/// Configuration for [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Interpreter executable
    pub python: String,
    /// Wall-clock limit per run
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Runs submissions with a local Python interpreter in isolated mode.
///
/// Lines given through [`with_input`](Self::with_input) are fed to the
/// program's stdin, answering `input()` calls in order.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    config: RunnerConfig,
    input: Vec<String>,
}

impl CommandRunner {
    /// Create a runner with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration.
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    /// Lines to answer `input()` with.
    pub fn with_input(mut self, lines: Vec<String>) -> Self {
        self.input = lines;
        self
    }
}

#[async_trait]
impl CodeRunner for CommandRunner {
    async fn run(&self, code: &str, level: &Level) -> Result<RunOutcome, RunnerError> {
        if code.trim().is_empty() {
            return Err(RunnerError::EmptyCode);
        }
        debug!("Running submission for level {} with {}", level.id, self.config.python);

        let mut child = Command::new(&self.config.python)
            .arg("-I")
            .arg("-c")
            .arg(code)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(RunnerError::Spawn)?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut feed = self.input.join("\n");
            feed.push('\n');
            // The program may exit without reading its input.
            if let Err(e) = stdin.write_all(feed.as_bytes()).await {
                debug!("Program closed stdin early: {}", e);
            }
        }

        let output = match tokio::time::timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(RunnerError::Spawn)?,
            Err(_) => {
                warn!("Submission for level {} timed out", level.id);
                return Err(RunnerError::Timeout(self.config.timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let error = if output.status.success() {
            None
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // Last traceback line carries the exception and message.
            let message = stderr
                .lines()
                .rev()
                .find(|l| !l.trim().is_empty())
                .map(|l| l.trim().to_string())
                .unwrap_or_else(|| format!("exited with {}", output.status));
            Some(message)
        };

        Ok(RunOutcome {
            output: stdout,
            error,
        })
    }
}
