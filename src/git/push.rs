//! Branch and remote resolution, and pushing through the system `git`.
//!
//! Pushing shells out so the user's SSH agent and credential helpers apply.
//! Prompts are disabled; a push that needs interaction fails instead.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use git2::{Oid, Repository};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::PushError;

/// Where HEAD should be pushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushTarget {
    pub remote: String,
    pub branch: String,
}

/// stderr fragments that mean the remote rejected our credentials.
const AUTH_FAILURE_PATTERNS: &[&str] = &[
    "authentication failed",
    "permission denied",
    "could not read username",
    "could not read password",
    "invalid username or password",
    "terminal prompts disabled",
    "access denied",
    "the requested url returned error: 403",
];

/// Short name of the checked-out branch.
pub fn current_branch(repo: &Repository) -> Result<String, PushError> {
    let head = repo.head().map_err(PushError::Inspect)?;
    if !head.is_branch() {
        return Err(PushError::DetachedHead);
    }
    head.shorthand()
        .map(String::from)
        .ok_or(PushError::DetachedHead)
}

/// Branch plus remote: the branch's configured remote, else `origin`, else
/// the first remote.
pub fn resolve_push_target(repo: &Repository) -> Result<PushTarget, PushError> {
    let branch = current_branch(repo)?;

    let remotes = repo.remotes().map_err(PushError::Inspect)?;
    let names: Vec<&str> = remotes.iter().flatten().collect();
    if names.is_empty() {
        return Err(PushError::NoRemoteConfigured);
    }

    let configured = repo
        .config()
        .ok()
        .and_then(|c| c.get_string(&format!("branch.{}.remote", branch)).ok())
        .filter(|r| names.contains(&r.as_str()));

    let remote = configured
        .or_else(|| names.iter().find(|n| **n == "origin").map(|n| n.to_string()))
        .or_else(|| names.first().map(|n| n.to_string()))
        .ok_or(PushError::NoRemoteConfigured)?;

    Ok(PushTarget { remote, branch })
}

/// Push `target.branch` to `target.remote`.
///
/// With `lease`, the push is forced but only if the remote branch still
/// points at that commit.
pub async fn push(
    workdir: &Path,
    target: &PushTarget,
    limit: Duration,
    lease: Option<Oid>,
) -> Result<(), PushError> {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(workdir).arg("push");
    if let Some(expected) = lease {
        cmd.arg(format!("--force-with-lease=refs/heads/{}:{}", target.branch, expected));
    }
    cmd.arg(&target.remote)
        .arg(format!("refs/heads/{0}:refs/heads/{0}", target.branch))
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!("Pushing {} to {}", target.branch, target.remote);

    let output = timeout(limit, cmd.output())
        .await
        .map_err(|_| PushError::Timeout {
            remote: target.remote.clone(),
            secs: limit.as_secs(),
        })?
        .map_err(PushError::SpawnFailed)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(classify_push_failure(&target.remote, stderr));
    }

    info!("Pushed {} to {}", target.branch, target.remote);
    Ok(())
}

/// Map push stderr to an auth or network failure.
pub fn classify_push_failure(remote: &str, stderr: String) -> PushError {
    let lower = stderr.to_lowercase();
    let remote = remote.to_string();
    if AUTH_FAILURE_PATTERNS.iter().any(|p| lower.contains(p)) {
        PushError::AuthFailure { remote, stderr }
    } else {
        PushError::NetworkFailure { remote, stderr }
    }
}
