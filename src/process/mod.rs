//! Subprocess execution for the launch pipeline
//!
//! Two modes:
//! - captured probes (`run_captured`): argv arrays, merged output, timeout
//!   enforcement; used for version and package-list queries
//! - interactive steps (`run_interactive`): stdio inherited from the
//!   launcher, no deadline; used for the installer and the application run
//!
//! Commands are always spawned from argv arrays, never through a shell.

use crate::errors::{LaunchError, Result};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// Result of a captured subprocess run
#[derive(Debug, Clone)]
pub struct ExecOutcome {
    /// Rendered command line, for messages
    pub command: String,

    /// Combined stdout/stderr text
    pub output: String,

    /// Whether the process exited with code 0
    pub success: bool,

    /// Exit code (-1 when terminated by signal)
    pub exit_code: i32,

    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
}

impl ExecOutcome {
    fn new(command: String, output: String, exit_code: i32, started: Instant) -> Self {
        Self {
            command,
            output,
            success: exit_code == 0,
            exit_code,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// First line of output, trimmed; useful for version strings
    pub fn first_line(&self) -> &str {
        self.output.lines().next().unwrap_or("").trim()
    }
}

/// Render an argv array for error messages
pub fn render_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}

/// Run a command, capture merged output, enforce a deadline.
///
/// Spawn failures (missing executable) and timeouts are errors; a non-zero
/// exit is a normal `ExecOutcome` for the caller to interpret.
pub async fn run_captured(
    program: &str,
    args: &[String],
    cwd: Option<&Path>,
    deadline: Duration,
) -> Result<ExecOutcome> {
    let started = Instant::now();
    let rendered = render_command(program, args);

    if program.is_empty() {
        return Err(LaunchError::CommandError {
            command: rendered,
            reason: "command cannot be empty".to_string(),
        });
    }

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    match timeout(deadline, cmd.output()).await {
        Ok(Ok(output)) => {
            let stdout = String::from_utf8_lossy(&output.stdout).to_string();
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();

            let combined = if stderr.is_empty() {
                stdout
            } else if stdout.is_empty() {
                stderr
            } else {
                format!("{}\n{}", stdout.trim_end(), stderr.trim_end())
            };

            let exit_code = output.status.code().unwrap_or(-1);
            Ok(ExecOutcome::new(rendered, combined, exit_code, started))
        }
        Ok(Err(e)) => Err(LaunchError::CommandError {
            command: rendered,
            reason: e.to_string(),
        }),
        Err(_) => Err(LaunchError::CommandTimeout {
            command: rendered,
            seconds: deadline.as_secs(),
        }),
    }
}

/// Run a command with inherited stdio and wait for it, returning the exit
/// code. The install and launch steps go through here so their own output
/// and prompts reach the terminal directly.
pub async fn run_interactive(program: &str, args: &[String], cwd: Option<&Path>) -> Result<i32> {
    let rendered = render_command(program, args);

    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }

    let status = cmd.status().await.map_err(|e| LaunchError::CommandError {
        command: rendered,
        reason: e.to_string(),
    })?;

    Ok(status.code().unwrap_or(-1))
}
