//! commitscribe - conventional commits with a co-committed changelog.
//!
//! # Overview
//!
//! commitscribe classifies pending working-tree changes, synthesizes a
//! Conventional Commit message (heuristics, optionally preceded by the
//! Claude Code CLI), commits everything together with a CHANGELOG.md entry
//! describing that same commit, and optionally pushes.
//!
//! The workflow is exposed as two tools, `generate_commit_message` and
//! `git_commit_and_push`, through [`tools::Tools`].

pub mod changelog;
pub mod claude;
pub mod commit;
pub mod config;
pub mod error;
pub mod git;
pub mod tools;
pub mod workflow;
pub mod workspace;

// Re-export commonly used types
pub use commit::{ChangeSet, CommitMessage, CommitType};
pub use config::Config;
pub use error::{
    ChangelogError, ClaudeError, ConfigError, GenerationError, GitError, PushError, ToolError,
    WorkspaceError,
};
pub use tools::{ToolCall, Tools};
pub use workflow::{CommitDriver, CommitResult, PreviewResult};
