//! Working tree diff collection and change classification using git2.

use std::collections::HashSet;

use git2::{Delta, Diff, DiffFindOptions, DiffFormat, DiffOptions, ErrorCode, Repository, Tree};
use tracing::{debug, warn};

use crate::commit::changeset::ChangeSet;
use crate::error::GitError;

/// Maximum characters for the unified diff text before truncation.
const MAX_DIFF_LENGTH: usize = 30_000;

/// Similarity (percent) above which a delete + add pair becomes a rename.
const RENAME_THRESHOLD: u16 = 50;

/// Classified changes plus the unified diff text they came from.
#[derive(Debug, Clone, Default)]
pub struct DiffSummary {
    pub changes: ChangeSet,
    /// Paths staged in the index but gone from disk that are not part of
    /// `changes` (added, then moved or removed). They must still be staged so
    /// the commit matches the work tree.
    pub stale_index_paths: Vec<String>,
    pub diff_text: String,
    pub truncated: bool,
    pub additions: usize,
    pub deletions: usize,
}

/// Resolve the HEAD tree, distinguishing empty-repo errors from real failures.
///
/// Returns `Ok(None)` for repos with no commits (unborn branch / not found),
/// `Ok(Some(tree))` for repos with a valid HEAD, or `Err(GitError::DiffFailed)`
/// for real errors (corrupt HEAD, permission issues, missing objects).
pub(crate) fn resolve_head_tree(repo: &Repository) -> Result<Option<Tree<'_>>, GitError> {
    let head_ref = match repo.head() {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            return Ok(None);
        }
        Err(e) => return Err(GitError::DiffFailed(e)),
    };

    let tree = head_ref.peel_to_tree().map_err(GitError::DiffFailed)?;
    Ok(Some(tree))
}

/// Collect every pending change in the working tree.
///
/// Merges `diff_tree_to_index` (staged) with `diff_index_to_workdir`
/// (unstaged, plus untracked files when `include_untracked` is set). With no
/// HEAD the staged side compares against the empty tree, so everything present
/// is reported as added. A clean tree yields an empty [`ChangeSet`].
pub fn collect_changes(
    repo: &Repository,
    include_untracked: bool,
) -> Result<DiffSummary, GitError> {
    let head_tree = resolve_head_tree(repo)?;

    let mut staged = repo
        .diff_tree_to_index(head_tree.as_ref(), None, None)
        .map_err(GitError::DiffFailed)?;
    detect_renames(&mut staged)?;

    let mut opts = DiffOptions::new();
    opts.include_untracked(include_untracked)
        .recurse_untracked_dirs(include_untracked)
        .show_untracked_content(include_untracked);
    let mut unstaged = repo
        .diff_index_to_workdir(None, Some(&mut opts))
        .map_err(GitError::DiffFailed)?;
    detect_renames(&mut unstaged)?;

    let mut builder = ChangeSetBuilder::default();
    classify_deltas(&staged, &mut builder);
    classify_deltas(&unstaged, &mut builder);
    let (changes, stale_index_paths) = builder.build();

    debug!(
        "Classified {} changed files ({} added, {} modified, {} deleted, {} renamed)",
        changes.total_files(),
        changes.added.len(),
        changes.modified.len(),
        changes.deleted.len(),
        changes.renamed.len()
    );

    let mut summary = DiffSummary {
        changes,
        stale_index_paths,
        ..DiffSummary::default()
    };

    append_diff_text(&staged, &mut summary);
    append_diff_text(&unstaged, &mut summary);

    Ok(summary)
}

/// Collapse delete + add pairs with enough shared content into renames.
fn detect_renames(diff: &mut Diff<'_>) -> Result<(), GitError> {
    let mut find_opts = DiffFindOptions::new();
    find_opts
        .renames(true)
        .rename_threshold(RENAME_THRESHOLD)
        .for_untracked(true);
    diff.find_similar(Some(&mut find_opts))
        .map_err(GitError::DiffFailed)
}

/// Feed every delta of a diff into the builder.
fn classify_deltas(diff: &Diff<'_>, builder: &mut ChangeSetBuilder) {
    for delta in diff.deltas() {
        let old_path = delta
            .old_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());
        let new_path = delta
            .new_file()
            .path()
            .map(|p| p.to_string_lossy().to_string());

        match (delta.status(), old_path, new_path) {
            (Delta::Renamed, Some(old), Some(new)) if old != new => builder.rename(old, new),
            (Delta::Added | Delta::Untracked | Delta::Copied, _, Some(path)) => builder.add(path),
            (Delta::Deleted, Some(path), _) => builder.delete(path),
            (Delta::Modified | Delta::Typechange | Delta::Renamed, _, Some(path)) => {
                builder.modify(path)
            }
            _ => {}
        }
    }
}

/// Accumulates deltas into a partitioned [`ChangeSet`].
///
/// The first classification of a path wins, except where a later
/// working-tree delta supersedes a staged one: an added-then-removed file
/// disappears, a modified-then-removed file becomes a deletion, and a staged
/// path that was then moved on disk becomes (or extends) a rename.
#[derive(Default)]
struct ChangeSetBuilder {
    changes: ChangeSet,
    claimed: HashSet<String>,
    stale: Vec<String>,
}

impl ChangeSetBuilder {
    fn add(&mut self, path: String) {
        if self.claimed.insert(path.clone()) {
            self.changes.added.push(path);
        }
    }

    fn modify(&mut self, path: String) {
        if self.claimed.insert(path.clone()) {
            self.changes.modified.push(path);
        }
    }

    fn delete(&mut self, path: String) {
        if self.claimed.insert(path.clone()) {
            self.changes.deleted.push(path);
            return;
        }

        if remove_path(&mut self.changes.added, &path) {
            self.stale.push(path);
        } else if remove_path(&mut self.changes.modified, &path) {
            self.changes.deleted.push(path);
        } else if let Some(pos) = self.changes.renamed.iter().position(|(_, to)| *to == path) {
            let (from, _) = self.changes.renamed.remove(pos);
            self.changes.deleted.push(from);
            self.stale.push(path);
        }
    }

    fn rename(&mut self, old: String, new: String) {
        if self.claimed.contains(&new) {
            self.delete(old);
            return;
        }
        self.claimed.insert(new.clone());

        if self.claimed.insert(old.clone()) {
            self.changes.renamed.push((old, new));
        } else if remove_path(&mut self.changes.modified, &old) {
            self.changes.renamed.push((old, new));
        } else if remove_path(&mut self.changes.added, &old) {
            self.changes.added.push(new);
            self.stale.push(old);
        } else if let Some(pair) = self.changes.renamed.iter_mut().find(|(_, to)| *to == old) {
            pair.1 = new;
            self.stale.push(old);
        } else {
            self.changes.added.push(new);
        }
    }

    /// The change set plus index-only paths that still need staging.
    fn build(self) -> (ChangeSet, Vec<String>) {
        (self.changes, self.stale)
    }
}

fn remove_path(bucket: &mut Vec<String>, path: &str) -> bool {
    match bucket.iter().position(|p| p == path) {
        Some(pos) => {
            bucket.remove(pos);
            true
        }
        None => false,
    }
}

/// Append unified diff text from a diff object, respecting the max length.
fn append_diff_text(diff: &Diff<'_>, summary: &mut DiffSummary) {
    if summary.truncated {
        return;
    }

    let text = &mut summary.diff_text;
    let additions = &mut summary.additions;
    let deletions = &mut summary.deletions;
    let truncated = &mut summary.truncated;

    if let Err(e) = diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        if *truncated {
            return true;
        }

        match line.origin() {
            '+' => *additions += 1,
            '-' => *deletions += 1,
            _ => {}
        }

        let content = std::str::from_utf8(line.content()).unwrap_or("");

        if text.len() + content.len() + 2 > MAX_DIFF_LENGTH {
            *truncated = true;
            return true;
        }

        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(content);

        true
    }) {
        warn!("Failed to collect diff text: {e}");
        *truncated = true;
    }
}
