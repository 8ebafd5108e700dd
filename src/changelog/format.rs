//! Changelog entry formatting.

use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;

/// Header written when the changelog file does not exist yet.
pub const CHANGELOG_HEADER: &str = "# Changelog\n\nAll notable changes to this project will be documented in this file.\n\n## [Unreleased]\n\n";

/// Section marker new entries are inserted under.
pub const UNRELEASED_MARKER: &str = "## [Unreleased]";

/// Hash recorded until the real commit exists.
pub const PLACEHOLDER_HASH: &str = "0000000";

/// Length of the abbreviated commit hash in entry headings.
pub const SHORT_HASH_LEN: usize = 7;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Whether the entry's commit has reached a remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntryStatus {
    Local,
    Pushed,
}

impl EntryStatus {
    pub fn marker(&self) -> &'static str {
        match self {
            Self::Local => "[LOCAL]",
            Self::Pushed => "[PUSHED]",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// One commit's record in the changelog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangelogEntry {
    pub timestamp: NaiveDateTime,
    pub short_hash: String,
    pub status: EntryStatus,
    /// Rendered commit message.
    pub message: String,
}

impl ChangelogEntry {
    /// A `[LOCAL]` entry stamped now, carrying the placeholder hash.
    pub fn placeholder(message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            short_hash: PLACEHOLDER_HASH.to_string(),
            status: EntryStatus::Local,
            message: message.into(),
        }
    }

    /// `### <timestamp> - <hash> [STATUS]`
    pub fn heading(&self) -> String {
        format_heading(&self.timestamp, &self.short_hash, self.status)
    }

    /// Heading, blank line, message. No trailing newline.
    pub fn render(&self) -> String {
        format!("{}\n\n{}", self.heading(), self.message.trim_end())
    }
}

pub fn format_heading(timestamp: &NaiveDateTime, short_hash: &str, status: EntryStatus) -> String {
    format!(
        "### {} - {} {}",
        timestamp.format(TIMESTAMP_FORMAT),
        short_hash,
        status
    )
}

/// First [`SHORT_HASH_LEN`] characters of a hex object id.
pub fn short_hash(full: &str) -> String {
    full.chars().take(SHORT_HASH_LEN).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fixed_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .unwrap()
            .and_hms_opt(9, 5, 7)
            .unwrap()
    }

    #[test]
    fn test_heading_format() {
        assert_eq!(
            format_heading(&fixed_time(), "abc1234", EntryStatus::Pushed),
            "### 2025-03-14 09:05:07 - abc1234 [PUSHED]"
        );
    }

    #[test]
    fn test_placeholder_entry_renders() {
        let mut entry = ChangelogEntry::placeholder("feat: Add login\n\n- Add src/login.py\n");
        entry.timestamp = fixed_time();
        assert_eq!(
            entry.render(),
            "### 2025-03-14 09:05:07 - 0000000 [LOCAL]\n\nfeat: Add login\n\n- Add src/login.py"
        );
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash("0123456789abcdef"), "0123456");
        assert_eq!(short_hash("abc"), "abc");
    }
}
