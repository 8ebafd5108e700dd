//! Claude-backed commit message source.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::commit::diff::DiffSummary;
use crate::commit::message::CommitMessage;
use crate::commit::prompt::build_commit_prompt;
use crate::commit::synthesizer::MessageSource;
use crate::error::GenerationError;

use super::retry::{ClaudeExecutor, DefaultExecutor, generate_with_retry};
use super::subprocess::check_claude_installed;

/// Asks the Claude CLI for a message and parses its answer.
pub struct ClaudeSource {
    executor: Box<dyn ClaudeExecutor>,
    max_bullets: usize,
    max_summary_lines: usize,
    check_installed: bool,
}

impl ClaudeSource {
    /// Source backed by the real CLI.
    pub fn new(timeout: Duration, max_bullets: usize, max_summary_lines: usize) -> Self {
        Self {
            executor: Box::new(DefaultExecutor { timeout }),
            max_bullets,
            max_summary_lines,
            check_installed: true,
        }
    }

    /// Source backed by an arbitrary executor; skips the PATH lookup.
    pub fn with_executor(
        executor: Box<dyn ClaudeExecutor>,
        max_bullets: usize,
        max_summary_lines: usize,
    ) -> Self {
        Self {
            executor,
            max_bullets,
            max_summary_lines,
            check_installed: false,
        }
    }
}

#[async_trait]
impl MessageSource for ClaudeSource {
    fn name(&self) -> &'static str {
        "claude"
    }

    async fn generate(&self, diff: &DiffSummary) -> Result<CommitMessage, GenerationError> {
        if self.check_installed {
            check_claude_installed()?;
        }

        let prompt = build_commit_prompt(diff, self.max_bullets, self.max_summary_lines);
        debug!("Commit prompt length: {} chars", prompt.len());

        let text = generate_with_retry(&prompt, self.executor.as_ref()).await?;
        let message = CommitMessage::parse(&text).map_err(GenerationError::Malformed)?;

        Ok(message.clamp(self.max_bullets, self.max_summary_lines))
    }
}
