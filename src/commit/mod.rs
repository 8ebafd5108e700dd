//! Change classification and commit message synthesis.

pub mod changeset;
pub mod diff;
pub mod heuristic;
pub mod keywords;
pub mod message;
pub mod prompt;
pub mod rules;
pub mod synthesizer;

pub use changeset::ChangeSet;
pub use diff::{DiffSummary, collect_changes};
pub use keywords::detect_topics;
pub use message::CommitMessage;
pub use prompt::build_commit_prompt;
pub use rules::{CommitType, detect_commit_type, extract_scope};
pub use synthesizer::{HeuristicSource, MessageSource, MessageSynthesizer};
