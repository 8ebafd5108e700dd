//! Serializable results returned by the two tools.

use serde::Serialize;

/// Outcome of `git_commit_and_push`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitResult {
    pub success: bool,
    pub commit_hash: Option<String>,
    pub commit_message: Option<String>,
    pub files_changed: usize,
    pub pushed: bool,
    pub changelog_updated: bool,
    pub message: String,
    pub error: Option<String>,
}

impl CommitResult {
    /// Hard failure: nothing was committed.
    pub fn failure(message: impl Into<String>, error: impl ToString) -> Self {
        Self {
            message: message.into(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    /// The working tree was clean.
    pub fn no_changes() -> Self {
        Self {
            message: "No changes to commit".to_string(),
            ..Self::default()
        }
    }
}

/// Outcome of `generate_commit_message`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreviewResult {
    pub success: bool,
    pub commit_message: Option<String>,
    pub files_changed: usize,
    pub message: String,
    pub error: Option<String>,
}

impl PreviewResult {
    pub fn failure(message: impl Into<String>, error: impl ToString) -> Self {
        Self {
            message: message.into(),
            error: Some(error.to_string()),
            ..Self::default()
        }
    }

    pub fn no_changes() -> Self {
        Self {
            message: "No changes to commit".to_string(),
            ..Self::default()
        }
    }
}
