//! Claude CLI spawning.

use std::ffi::OsString;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::ClaudeError;

const CLAUDE_BIN: &str = "claude";

/// Check if Claude Code CLI is on the PATH.
///
/// Uses the `which` crate for cross-platform executable detection.
pub fn check_claude_installed() -> Result<(), ClaudeError> {
    find_claude_in(std::env::var_os("PATH"))
}

fn find_claude_in(paths: Option<OsString>) -> Result<(), ClaudeError> {
    let cwd = std::env::current_dir().map_err(|_| ClaudeError::NotInstalled)?;
    which::which_in(CLAUDE_BIN, paths, cwd)
        .map(|path| debug!("Found claude CLI at {}", path.display()))
        .map_err(|_| ClaudeError::NotInstalled)
}

/// Run Claude CLI with a prompt and return raw stdout.
///
/// Uses `-p` for the prompt and `--output-format json`. The child is killed
/// when `limit` elapses, producing `ClaudeError::Timeout`.
pub async fn run_claude(prompt: &str, limit: Duration) -> Result<String, ClaudeError> {
    let output = timeout(
        limit,
        Command::new(CLAUDE_BIN)
            .arg("-p")
            .arg(prompt)
            .arg("--output-format")
            .arg("json")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| ClaudeError::Timeout(limit.as_secs()))?
    .map_err(ClaudeError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);
        return Err(ClaudeError::NonZeroExit { code, stderr });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
