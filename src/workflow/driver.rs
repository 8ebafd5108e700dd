//! Commit workflow orchestration.
//!
//! Order within one run is fixed: classify, synthesize, placeholder insert,
//! stage, commit, hash finalize, amend, then optionally push, push finalize,
//! amend and re-push. Git handles are opened inside synchronous helpers and
//! never live across an await point.

use std::path::{Path, PathBuf};

use git2::Oid;
use tracing::{info, warn};

use crate::changelog::{ChangelogSequencer, ChangelogSnapshot, short_hash};
use crate::claude::ClaudeSource;
use crate::commit::diff::{DiffSummary, collect_changes};
use crate::commit::synthesizer::MessageSynthesizer;
use crate::config::{Config, normalize_relative_path};
use crate::error::{GitError, PushError};
use crate::git::{self, PushTarget};

use super::lock::RepoLocks;
use super::result::{CommitResult, PreviewResult};

/// Runs the preview and commit workflows against local work trees.
pub struct CommitDriver {
    config: Config,
    synthesizer: MessageSynthesizer,
    locks: RepoLocks,
}

/// What the local half of the workflow produced.
struct LocalCommit {
    head: Oid,
    /// Short hash of the commit as first created; the changelog records this.
    entry_hash: String,
    changelog_updated: bool,
}

/// What the push half of the workflow produced.
struct PushOutcome {
    pushed: bool,
    head: Oid,
    message: String,
    error: Option<String>,
}

impl CommitDriver {
    /// Driver with the heuristic source, preceded by Claude when enabled.
    pub fn new(config: Config) -> Self {
        let mut synthesizer =
            MessageSynthesizer::heuristic_only(config.max_bullet_points, config.max_summary_lines);
        if config.ai_enabled {
            synthesizer = synthesizer.with_source(Box::new(ClaudeSource::new(
                config.claude_timeout,
                config.max_bullet_points,
                config.max_summary_lines,
            )));
        }
        Self::with_synthesizer(config, synthesizer)
    }

    pub fn with_synthesizer(mut config: Config, synthesizer: MessageSynthesizer) -> Self {
        // Must match the `/`-separated paths git reports.
        config.changelog_file = normalize_relative_path(&config.changelog_file);
        Self {
            config,
            synthesizer,
            locks: RepoLocks::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Synthesize the message for pending changes without touching anything.
    pub async fn generate_preview(&self, repo_path: &Path) -> PreviewResult {
        let diff = match self.pending_changes(repo_path) {
            Ok((_, diff)) => diff,
            Err(e) => return PreviewResult::failure(failure_message(&e), e),
        };

        if diff.changes.is_empty() {
            return PreviewResult::no_changes();
        }

        let message = self.synthesizer.synthesize(&diff).await;
        let files_changed = diff.changes.total_files();
        PreviewResult {
            success: true,
            commit_message: Some(message.render()),
            files_changed,
            message: format!("Generated commit message for {files_changed} changed file(s)"),
            error: None,
        }
    }

    /// Commit all pending changes with a changelog entry, and push when confirmed.
    pub async fn commit_and_push(&self, repo_path: &Path, confirm_push: bool) -> CommitResult {
        let workdir = match open_workdir(repo_path) {
            Ok(dir) => dir,
            Err(e) => return CommitResult::failure(failure_message(&e), e),
        };
        let _guard = self.locks.acquire(&workdir).await;

        let diff = match self.pending_changes(&workdir) {
            Ok((_, diff)) => diff,
            Err(e) => return CommitResult::failure(failure_message(&e), e),
        };
        if diff.changes.is_empty() {
            info!("No changes to commit in {}", workdir.display());
            return CommitResult::no_changes();
        }

        let message = self.synthesizer.synthesize(&diff).await.render();
        let files_changed = diff.changes.total_files();

        let local = match self.commit_locally(&workdir, &diff, &message) {
            Ok(local) => local,
            Err(e) => {
                warn!("Commit failed in {}: {}", workdir.display(), e);
                return CommitResult {
                    files_changed,
                    commit_message: Some(message),
                    ..CommitResult::failure(failure_message(&e), e)
                };
            }
        };

        let outcome = if confirm_push {
            self.push_and_finalize(&workdir, &local).await
        } else {
            PushOutcome {
                pushed: false,
                head: local.head,
                message: format!(
                    "Committed {} ({} file(s) changed)",
                    short_hash(&local.head.to_string()),
                    files_changed
                ),
                error: None,
            }
        };

        CommitResult {
            success: true,
            commit_hash: Some(outcome.head.to_string()),
            commit_message: Some(message),
            files_changed,
            pushed: outcome.pushed,
            changelog_updated: local.changelog_updated,
            message: outcome.message,
            error: outcome.error,
        }
    }

    fn changelog_path(&self) -> &str {
        &self.config.changelog_file
    }

    /// Classified changes with the changelog file itself left out.
    fn pending_changes(&self, repo_path: &Path) -> Result<(PathBuf, DiffSummary), GitError> {
        let repo = git::open_repository(repo_path)?;
        let workdir = git::workdir(&repo)?;
        let mut diff = collect_changes(&repo, self.config.include_untracked)?;
        diff.changes = diff.changes.without_path(self.changelog_path());
        diff.stale_index_paths.retain(|p| p != self.changelog_path());
        Ok((workdir, diff))
    }

    /// Placeholder, stage, commit, finalize, amend.
    fn commit_locally(
        &self,
        workdir: &Path,
        diff: &DiffSummary,
        message: &str,
    ) -> Result<LocalCommit, GitError> {
        let repo = git::open_repository(workdir)?;
        let changelog_rel = self.changelog_path();
        let sequencer = ChangelogSequencer::new(workdir.join(changelog_rel));
        let index_snapshot = git::snapshot_index(&repo)?;

        let snapshot = match sequencer.insert_placeholder(message) {
            Ok(snapshot) => {
                if !snapshot.existed() {
                    info!("Created {}", sequencer.path().display());
                }
                Some(snapshot)
            }
            Err(e) => {
                warn!("Changelog not updated: {}", e);
                None
            }
        };
        let mut extra: Vec<&str> = diff.stale_index_paths.iter().map(String::as_str).collect();
        if snapshot.is_some() {
            extra.push(changelog_rel);
        }

        let created = git::stage_changes(&repo, &diff.changes, &extra)
            .and_then(|()| git::create_commit(&repo, message));
        let oid = match created {
            Ok(oid) => oid,
            Err(e) => {
                if let Some(snapshot) = &snapshot {
                    restore_changelog(&sequencer, snapshot);
                }
                if let Err(restore_err) = git::restore_index(&repo, index_snapshot) {
                    warn!("Could not restore index after failed commit: {}", restore_err);
                }
                return Err(e);
            }
        };

        let entry_hash = short_hash(&oid.to_string());
        info!("Created commit {}", entry_hash);

        let Some(snapshot) = snapshot else {
            return Ok(LocalCommit {
                head: oid,
                entry_hash,
                changelog_updated: false,
            });
        };

        let changelog_updated = match sequencer.finalize_hash(&entry_hash) {
            Ok(()) => match amend_with_changelog(&repo, changelog_rel) {
                Ok(_) => true,
                Err(e) => {
                    warn!("Commit kept without finalized changelog entry: {}", e);
                    false
                }
            },
            Err(e) => {
                warn!("Changelog hash not finalized, removing placeholder: {}", e);
                restore_changelog(&sequencer, &snapshot);
                if let Err(e) = amend_with_changelog(&repo, changelog_rel) {
                    warn!("Could not amend placeholder out of commit: {}", e);
                }
                false
            }
        };

        let head = head_id(&repo).unwrap_or(oid);
        Ok(LocalCommit {
            head,
            entry_hash,
            changelog_updated,
        })
    }

    async fn push_and_finalize(&self, workdir: &Path, local: &LocalCommit) -> PushOutcome {
        let target = match resolve_target(workdir) {
            Ok(target) => target,
            Err(PushError::NoRemoteConfigured) => {
                info!("Push skipped: no remote configured");
                return PushOutcome {
                    pushed: false,
                    head: local.head,
                    message: format!(
                        "Committed {} locally; push skipped: {}",
                        short_hash(&local.head.to_string()),
                        PushError::NoRemoteConfigured
                    ),
                    error: None,
                };
            }
            Err(e) => return push_failed(local, e),
        };

        if let Err(e) = git::push(workdir, &target, self.config.push_timeout, None).await {
            return push_failed(local, e);
        }

        let mut head = local.head;
        if local.changelog_updated {
            if let Some(amended) = self.finalize_push(workdir, &local.entry_hash) {
                head = amended;
                if let Err(e) =
                    git::push(workdir, &target, self.config.push_timeout, Some(local.head)).await
                {
                    warn!("Pushed, but the [PUSHED] changelog amend was not pushed: {}", e);
                }
            }
        }

        PushOutcome {
            pushed: true,
            head,
            message: format!(
                "Committed {} and pushed to {}/{}",
                short_hash(&head.to_string()),
                target.remote,
                target.branch
            ),
            error: None,
        }
    }

    /// Flip the entry to `[PUSHED]` and amend it into HEAD.
    ///
    /// Returns the amended HEAD, or `None` when either step failed.
    fn finalize_push(&self, workdir: &Path, entry_hash: &str) -> Option<Oid> {
        let sequencer = ChangelogSequencer::new(workdir.join(self.changelog_path()));
        if let Err(e) = sequencer.mark_pushed(entry_hash) {
            warn!("Pushed, but changelog entry not marked pushed: {}", e);
            return None;
        }

        let amended = git::open_repository(workdir)
            .and_then(|repo| amend_with_changelog(&repo, self.changelog_path()));
        match amended {
            Ok(oid) => Some(oid),
            Err(e) => {
                warn!("Pushed, but could not amend [PUSHED] entry: {}", e);
                None
            }
        }
    }
}

fn open_workdir(repo_path: &Path) -> Result<PathBuf, GitError> {
    let repo = git::open_repository(repo_path)?;
    git::workdir(&repo)
}

fn resolve_target(workdir: &Path) -> Result<PushTarget, PushError> {
    let repo = git2::Repository::open(workdir).map_err(PushError::Inspect)?;
    git::resolve_push_target(&repo)
}

fn amend_with_changelog(repo: &git2::Repository, changelog_rel: &str) -> Result<Oid, GitError> {
    git::stage_path(repo, changelog_rel)?;
    git::amend_head(repo)
}

fn head_id(repo: &git2::Repository) -> Option<Oid> {
    repo.head().ok().and_then(|h| h.target())
}

fn restore_changelog(sequencer: &ChangelogSequencer, snapshot: &ChangelogSnapshot) {
    if let Err(e) = sequencer.restore(snapshot) {
        warn!("Could not roll back changelog: {}", e);
    }
}

fn push_failed(local: &LocalCommit, error: PushError) -> PushOutcome {
    warn!("Push failed: {}", error);
    PushOutcome {
        pushed: false,
        head: local.head,
        message: format!(
            "Committed {} locally but push failed",
            short_hash(&local.head.to_string())
        ),
        error: Some(error.to_string()),
    }
}

fn failure_message(error: &GitError) -> &'static str {
    match error {
        GitError::NotARepository(_) => "Not a git repository",
        GitError::DiffFailed(_) => "Could not read working tree changes",
        _ => "Commit failed",
    }
}
