//! Ordered message sources behind a uniform fallback boundary.

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::commit::diff::DiffSummary;
use crate::commit::heuristic;
use crate::commit::keywords::detect_topics;
use crate::commit::message::CommitMessage;
use crate::error::GenerationError;

/// A strategy that proposes a commit message for a diff.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn generate(&self, diff: &DiffSummary) -> Result<CommitMessage, GenerationError>;
}

/// Deterministic path-shape source. Always succeeds.
pub struct HeuristicSource {
    max_bullets: usize,
    max_summary_lines: usize,
}

impl HeuristicSource {
    pub fn new(max_bullets: usize, max_summary_lines: usize) -> Self {
        Self {
            max_bullets,
            max_summary_lines,
        }
    }

    pub fn synthesize(&self, diff: &DiffSummary) -> CommitMessage {
        let topics = detect_topics(&diff.diff_text);
        heuristic::synthesize(&diff.changes, &topics, self.max_bullets, self.max_summary_lines)
    }
}

#[async_trait]
impl MessageSource for HeuristicSource {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    async fn generate(&self, diff: &DiffSummary) -> Result<CommitMessage, GenerationError> {
        Ok(self.synthesize(diff))
    }
}

/// Tries each fallible source in order, then the heuristic.
pub struct MessageSynthesizer {
    sources: Vec<Box<dyn MessageSource>>,
    heuristic: HeuristicSource,
    max_bullets: usize,
    max_summary_lines: usize,
}

impl MessageSynthesizer {
    /// A synthesizer that only uses the heuristic.
    pub fn heuristic_only(max_bullets: usize, max_summary_lines: usize) -> Self {
        Self {
            sources: Vec::new(),
            heuristic: HeuristicSource::new(max_bullets, max_summary_lines),
            max_bullets,
            max_summary_lines,
        }
    }

    /// Put `source` ahead of the heuristic, after any source already added.
    pub fn with_source(mut self, source: Box<dyn MessageSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Produce a message. Source failures are logged and skipped.
    pub async fn synthesize(&self, diff: &DiffSummary) -> CommitMessage {
        for source in &self.sources {
            match source.generate(diff).await {
                Ok(message) => {
                    debug!("Commit message produced by {} source", source.name());
                    return message.clamp(self.max_bullets, self.max_summary_lines);
                }
                Err(e) => {
                    warn!("{} message source failed, falling back: {}", source.name(), e);
                }
            }
        }

        debug!("Commit message produced by heuristic source");
        self.heuristic.synthesize(diff)
    }
}
