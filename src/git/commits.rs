//! Staging, commit creation and amend via git2.

use std::path::Path;

use git2::{ErrorCode, Index, Oid, Repository};
use tracing::debug;

use crate::commit::changeset::ChangeSet;
use crate::error::GitError;

/// Stage every path in `changes` plus `extra` (repository-relative).
///
/// Paths present in the work tree are added, missing ones are removed from
/// the index. Both sides of a rename are handled this way.
pub fn stage_changes(repo: &Repository, changes: &ChangeSet, extra: &[&str]) -> Result<(), GitError> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| GitError::NotARepository(repo.path().to_path_buf()))?;
    let mut index = repo.index().map_err(GitError::StagingFailed)?;

    for path in changes.touched_paths().into_iter().chain(extra.iter().copied()) {
        stage_one(&mut index, workdir, path)?;
    }

    index.write().map_err(GitError::StagingFailed)?;
    debug!("Staged {} paths", changes.total_files() + extra.len());
    Ok(())
}

/// Stage a single repository-relative path.
pub fn stage_path(repo: &Repository, path: &str) -> Result<(), GitError> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| GitError::NotARepository(repo.path().to_path_buf()))?;
    let mut index = repo.index().map_err(GitError::StagingFailed)?;
    stage_one(&mut index, workdir, path)?;
    index.write().map_err(GitError::StagingFailed)
}

fn stage_one(index: &mut Index, workdir: &Path, path: &str) -> Result<(), GitError> {
    let relative = Path::new(path);
    if workdir.join(relative).symlink_metadata().is_ok() {
        index.add_path(relative).map_err(GitError::StagingFailed)
    } else {
        match index.remove_path(relative) {
            Ok(()) => Ok(()),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
            Err(e) => Err(GitError::StagingFailed(e)),
        }
    }
}

/// Commit the current index on HEAD.
///
/// Handles an unborn branch (root commit). Fails with
/// [`GitError::NothingToCommit`] when the index tree equals the parent tree
/// and with [`GitError::IdentityMissing`] when no user identity is configured.
pub fn create_commit(repo: &Repository, message: &str) -> Result<Oid, GitError> {
    let mut index = repo.index().map_err(GitError::StagingFailed)?;
    let tree_id = index.write_tree().map_err(GitError::StagingFailed)?;
    let tree = repo.find_tree(tree_id).map_err(GitError::CommitFailed)?;

    let parent = match repo.head() {
        Ok(head) => Some(head.peel_to_commit().map_err(GitError::CommitFailed)?),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => None,
        Err(e) => return Err(GitError::CommitFailed(e)),
    };

    let unchanged = match &parent {
        Some(parent) => parent.tree_id() == tree_id,
        None => tree.is_empty(),
    };
    if unchanged {
        return Err(GitError::NothingToCommit);
    }

    let sig = repo.signature().map_err(GitError::IdentityMissing)?;
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(GitError::CommitFailed)?;
    debug!("Created commit {}", oid);
    Ok(oid)
}

/// Rewrite HEAD with the current index tree, keeping message and parents.
pub fn amend_head(repo: &Repository) -> Result<Oid, GitError> {
    let head = repo
        .head()
        .and_then(|h| h.peel_to_commit())
        .map_err(GitError::AmendFailed)?;

    let mut index = repo.index().map_err(GitError::AmendFailed)?;
    let tree_id = index.write_tree().map_err(GitError::AmendFailed)?;
    let tree = repo.find_tree(tree_id).map_err(GitError::AmendFailed)?;

    let oid = head
        .amend(Some("HEAD"), None, None, None, None, Some(&tree))
        .map_err(GitError::AmendFailed)?;
    debug!("Amended {} into {}", head.id(), oid);
    Ok(oid)
}

/// Tree id of the index as it stands now, for [`restore_index`].
pub fn snapshot_index(repo: &Repository) -> Result<Oid, GitError> {
    let mut index = repo.index().map_err(GitError::StagingFailed)?;
    index.write_tree().map_err(GitError::StagingFailed)
}

/// Put the index back to a tree captured by [`snapshot_index`].
pub fn restore_index(repo: &Repository, snapshot: Oid) -> Result<(), GitError> {
    let tree = repo.find_tree(snapshot).map_err(GitError::StagingFailed)?;
    let mut index = repo.index().map_err(GitError::StagingFailed)?;
    index.read_tree(&tree).map_err(GitError::StagingFailed)?;
    index.write().map_err(GitError::StagingFailed)
}
