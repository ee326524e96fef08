//! Shell command execution utilities.
//!
//! Switch and host queries are issued as shell commands (`ovs-ofctl`, `ip`).
//! Every execution is bounded by a timeout; a command that does not finish
//! in time is killed and reported as [`FlowError::Timeout`].
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use flowmgr_common::shell::{self, OVS_OFCTL_CMD, shellquote};
//!
//! let cmd = format!("{} show {}", OVS_OFCTL_CMD, shellquote("docker0-ovs"));
//! let result = shell::exec(&cmd, Duration::from_secs(5)).await?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{FlowError, FlowResult};

/// Path to the `ovs-ofctl` OpenFlow switch management utility.
pub const OVS_OFCTL_CMD: &str = "/usr/bin/ovs-ofctl";

/// Path to the `ip` command for interface address discovery.
pub const IP_CMD: &str = "/sbin/ip";

/// Default upper bound for a single switch or host command.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Regex for characters that need escaping in shell double-quotes.
/// Matches: $, `, ", \, and newline
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// Wraps the string in double quotes and escapes `$`, `` ` ``, `"`, `\`
/// and newline.
///
/// # Example
///
/// ```
/// use flowmgr_common::shell::shellquote;
///
/// assert_eq!(shellquote("docker0-ovs"), "\"docker0-ovs\"");
/// assert_eq!(shellquote("with$var"), "\"with\\$var\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// The stdout output, trimmed.
    pub stdout: String,
    /// The stderr output, trimmed.
    pub stderr: String,
}

impl ExecResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes a shell command through `/bin/sh -c`, bounded by `timeout`.
///
/// Returns `Ok` for any command that ran to completion, whatever its exit
/// code. Spawn failures and timeouts are errors.
pub async fn exec(cmd: &str, timeout: Duration) -> FlowResult<ExecResult> {
    tracing::debug!(command = %cmd, "Executing shell command");

    let mut command = Command::new("/bin/sh");
    command
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        Ok(output) => output.map_err(|e| FlowError::ShellExec {
            command: cmd.to_string(),
            source: e,
        })?,
        Err(_) => {
            tracing::warn!(command = %cmd, timeout_ms = timeout.as_millis() as u64, "Command timed out");
            return Err(FlowError::Timeout {
                command: cmd.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
    };

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    let result = ExecResult {
        exit_code,
        stdout,
        stderr,
    };

    if result.success() {
        tracing::trace!(command = %cmd, exit_code = exit_code, stdout = %result.stdout, "Command succeeded");
    } else {
        tracing::warn!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %result.stderr,
            "Command failed"
        );
    }

    Ok(result)
}

/// Executes a shell command and returns an error on non-zero exit.
///
/// Returns the trimmed stdout on success.
pub async fn exec_or_throw(cmd: &str, timeout: Duration) -> FlowResult<String> {
    let result = exec(cmd, timeout).await?;
    if result.success() {
        Ok(result.stdout)
    } else {
        Err(FlowError::ShellCommandFailed {
            command: cmd.to_string(),
            exit_code: result.exit_code,
            output: result.combined_output(),
        })
    }
}
