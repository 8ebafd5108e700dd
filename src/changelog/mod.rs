//! Changelog entries co-committed with the change they describe.

pub mod format;
pub mod parser;
pub mod sequencer;

pub use format::{ChangelogEntry, EntryStatus, PLACEHOLDER_HASH, short_hash};
pub use parser::{EntryHeading, entry_headings};
pub use sequencer::{ChangelogSequencer, ChangelogSnapshot};
