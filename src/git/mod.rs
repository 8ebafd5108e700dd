//! Local git operations: repository discovery, staging, commit and push.

pub mod commits;
pub mod push;

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::debug;

use crate::error::GitError;

pub use commits::{
    amend_head, create_commit, restore_index, snapshot_index, stage_changes, stage_path,
};
pub use push::{PushTarget, classify_push_failure, current_branch, push, resolve_push_target};

/// Open the repository containing `path`.
///
/// Any path inside a work tree is accepted. Bare repositories have no work
/// tree to commit from and are rejected like non-repositories.
pub fn open_repository(path: &Path) -> Result<Repository, GitError> {
    let repo =
        Repository::discover(path).map_err(|_| GitError::NotARepository(path.to_path_buf()))?;
    if repo.is_bare() || repo.workdir().is_none() {
        return Err(GitError::NotARepository(path.to_path_buf()));
    }
    debug!("Opened repository at {}", repo.path().display());
    Ok(repo)
}

/// Canonical work tree root of an opened repository.
pub fn workdir(repo: &Repository) -> Result<PathBuf, GitError> {
    let dir = repo
        .workdir()
        .ok_or_else(|| GitError::NotARepository(repo.path().to_path_buf()))?;
    Ok(dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf()))
}
