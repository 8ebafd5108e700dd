//! Text-level changelog edits: entry insertion and heading rewrites.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex_lite::Regex;

use crate::error::ChangelogError;

use super::format::{
    CHANGELOG_HEADER, ChangelogEntry, EntryStatus, PLACEHOLDER_HASH, TIMESTAMP_FORMAT,
    UNRELEASED_MARKER, format_heading,
};

static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^### (\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}) - ([0-9a-fA-F]{7}) \[(LOCAL|PUSHED)\]\s*$")
        .expect("valid heading regex")
});

/// An entry heading found in changelog text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHeading {
    pub timestamp: NaiveDateTime,
    pub short_hash: String,
    pub status: EntryStatus,
}

pub fn parse_heading(line: &str) -> Option<EntryHeading> {
    let caps = HEADING_RE.captures(line)?;
    let timestamp = NaiveDateTime::parse_from_str(caps.get(1)?.as_str(), TIMESTAMP_FORMAT).ok()?;
    let status = match caps.get(3)?.as_str() {
        "PUSHED" => EntryStatus::Pushed,
        _ => EntryStatus::Local,
    };
    Some(EntryHeading {
        timestamp,
        short_hash: caps.get(2)?.as_str().to_string(),
        status,
    })
}

/// All entry headings in file order (newest first for a well-formed file).
pub fn entry_headings(content: &str) -> Vec<EntryHeading> {
    content.lines().filter_map(parse_heading).collect()
}

/// Insert `entry` directly under the `[Unreleased]` marker.
///
/// `existing` of `None` (or blank) starts from the standard header. When the
/// marker is missing it is appended at the end of the file first.
pub fn insert_entry(existing: Option<&str>, entry: &ChangelogEntry) -> String {
    let base = match existing {
        Some(content) if !content.trim().is_empty() => content.to_string(),
        _ => CHANGELOG_HEADER.to_string(),
    };
    let rendered = entry.render();

    match base.split_once(UNRELEASED_MARKER) {
        Some((before, after)) => {
            let rest = after.trim_start_matches(['\n', '\r']);
            let mut out = format!("{before}{UNRELEASED_MARKER}\n\n{rendered}\n");
            if !rest.is_empty() {
                out.push('\n');
                out.push_str(rest);
            }
            out
        }
        None => format!(
            "{}\n\n{UNRELEASED_MARKER}\n\n{rendered}\n",
            base.trim_end_matches(['\n', '\r'])
        ),
    }
}

/// Replace the placeholder hash on the first placeholder entry under the marker.
pub fn finalize_placeholder(content: &str, short_hash: &str) -> Result<String, ChangelogError> {
    let start = marker_offset(content).ok_or(ChangelogError::PlaceholderNotFound)?;
    rewrite_first_heading(content, start, |heading| {
        (heading.short_hash == PLACEHOLDER_HASH && heading.status == EntryStatus::Local)
            .then(|| format_heading(&heading.timestamp, short_hash, EntryStatus::Local))
    })
    .ok_or(ChangelogError::PlaceholderNotFound)
}

/// Flip the `[LOCAL]` entry carrying `short_hash` to `[PUSHED]`.
pub fn mark_entry_pushed(content: &str, short_hash: &str) -> Result<String, ChangelogError> {
    rewrite_first_heading(content, 0, |heading| {
        (heading.short_hash.eq_ignore_ascii_case(short_hash) && heading.status == EntryStatus::Local)
            .then(|| format_heading(&heading.timestamp, &heading.short_hash, EntryStatus::Pushed))
    })
    .ok_or_else(|| ChangelogError::EntryNotFound(short_hash.to_string()))
}

fn marker_offset(content: &str) -> Option<usize> {
    content.find(UNRELEASED_MARKER)
}

/// Rewrite the first heading at or after byte `start` for which `rewrite`
/// returns a new line. Line endings are preserved.
fn rewrite_first_heading<F>(content: &str, start: usize, mut rewrite: F) -> Option<String>
where
    F: FnMut(&EntryHeading) -> Option<String>,
{
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if line_start < start {
            continue;
        }

        let body = line.trim_end_matches(['\n', '\r']);
        let Some(heading) = parse_heading(body) else {
            continue;
        };
        if let Some(new_line) = rewrite(&heading) {
            let ending = &line[body.len()..];
            let mut out = String::with_capacity(content.len());
            out.push_str(&content[..line_start]);
            out.push_str(&new_line);
            out.push_str(ending);
            out.push_str(&content[offset..]);
            return Some(out);
        }
    }
    None
}
