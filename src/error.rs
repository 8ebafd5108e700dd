//! Error types for commitscribe modules using thiserror.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from local git operations (diff, stage, commit, amend).
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Not a git repository: {}", .0.display())]
    NotARepository(PathBuf),

    #[error("Failed to collect diff: {0}")]
    DiffFailed(#[source] git2::Error),

    #[error("Failed to stage changes: {0}")]
    StagingFailed(#[source] git2::Error),

    #[error("Failed to create commit: {0}")]
    CommitFailed(#[source] git2::Error),

    #[error("Nothing staged to commit: the new tree matches HEAD")]
    NothingToCommit,

    #[error("Git config error (missing user.name or user.email): {0}")]
    IdentityMissing(#[source] git2::Error),

    #[error("Failed to amend commit: {0}")]
    AmendFailed(#[source] git2::Error),
}

/// Errors from pushing to a remote.
#[derive(Error, Debug)]
pub enum PushError {
    #[error("No remote repository configured")]
    NoRemoteConfigured,

    #[error("HEAD is detached, not on any branch")]
    DetachedHead,

    #[error("Could not inspect repository before push: {0}")]
    Inspect(#[source] git2::Error),

    #[error(
        "Authentication to {remote} failed: {stderr}. Check your SSH key or credential helper."
    )]
    AuthFailure { remote: String, stderr: String },

    #[error("Push to {remote} failed: {stderr}")]
    NetworkFailure { remote: String, stderr: String },

    #[error("Push to {remote} timed out after {secs} seconds")]
    Timeout { remote: String, secs: u64 },

    #[error("Failed to spawn git: {0}")]
    SpawnFailed(#[source] std::io::Error),
}

/// Errors from changelog operations.
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Failed to read changelog: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Failed to write changelog: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("No placeholder entry found under [Unreleased]")]
    PlaceholderNotFound,

    #[error("No changelog entry found for commit {0}")]
    EntryNotFound(String),
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ClaudeError>),
}

/// Errors from a generative commit message source.
///
/// Never surfaced to callers: the synthesizer logs them and falls back.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error(transparent)]
    Claude(#[from] ClaudeError),

    #[error("Generated message is malformed: {0}")]
    Malformed(String),
}

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Errors from resolving a repository target to a local work tree.
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("Repository path does not exist: {0}")]
    PathNotFound(String),

    #[error("Failed to prepare workspace directory {}: {source}", path.display())]
    WorkspaceDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to clone {url}: {stderr}")]
    CloneFailed { url: String, stderr: String },

    #[error("Cloning {url} timed out after {secs} seconds")]
    CloneTimeout { url: String, secs: u64 },

    #[error("Failed to spawn git: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Failed to remove workspace {}: {source}", path.display())]
    CleanupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from decoding a tool call.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {source}")]
    InvalidArguments {
        tool: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Malformed tool call: {0}")]
    MalformedCall(#[source] serde_json::Error),
}
