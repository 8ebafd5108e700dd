//! Conventional commit message model: rendering, parsing, clamping.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;

use crate::commit::rules::CommitType;

/// Maximum characters per summary line.
pub const MAX_SUMMARY_LINE_CHARS: usize = 72;

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?i)(feat|fix|docs|style|refactor|test|chore)(?:\(([^()]*)\))?!?:\s*(.*)$")
        .expect("valid header regex")
});

/// A structured Conventional Commit message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitMessage {
    pub commit_type: CommitType,
    pub scope: Option<String>,
    /// One or two physical lines.
    pub summary: String,
    pub bullets: Vec<String>,
}

impl CommitMessage {
    /// Render as `type(scope): summary`, a blank line, then `- bullet` lines.
    pub fn render(&self) -> String {
        let mut out = match &self.scope {
            Some(scope) => format!("{}({}): {}", self.commit_type, scope, self.summary),
            None => format!("{}: {}", self.commit_type, self.summary),
        };

        if !self.bullets.is_empty() {
            out.push_str("\n\n");
            let lines: Vec<String> = self.bullets.iter().map(|b| format!("- {b}")).collect();
            out.push_str(&lines.join("\n"));
        }

        out
    }

    /// Read a rendered message back.
    ///
    /// The first line must be a conventional header with one of the seven
    /// known types. Non-bullet lines before the first blank line continue the
    /// summary; `-` or `*` lines anywhere after it become bullets. Other body
    /// text is ignored.
    pub fn parse(text: &str) -> Result<Self, String> {
        let text = strip_code_fence(text);
        let mut lines = text.lines();

        let header = lines
            .by_ref()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| "empty message".to_string())?;

        let caps = HEADER_RE
            .captures(header)
            .ok_or_else(|| format!("not a conventional commit header: {header}"))?;

        let commit_type: CommitType = caps
            .get(1)
            .map(|m| m.as_str())
            .unwrap_or_default()
            .parse()?;
        let scope = caps
            .get(2)
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty());
        let first_summary = caps.get(3).map(|m| m.as_str().trim()).unwrap_or_default();
        if first_summary.is_empty() {
            return Err("commit summary is empty".to_string());
        }

        let mut summary_lines = vec![first_summary.to_string()];
        let mut bullets = Vec::new();
        let mut in_summary = true;

        for line in lines {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                in_summary = false;
                continue;
            }
            if let Some(bullet) = trimmed
                .strip_prefix("- ")
                .or_else(|| trimmed.strip_prefix("* "))
            {
                in_summary = false;
                let bullet = bullet.trim();
                if !bullet.is_empty() {
                    bullets.push(bullet.to_string());
                }
            } else if in_summary {
                summary_lines.push(trimmed.to_string());
            }
        }

        Ok(Self {
            commit_type,
            scope,
            summary: summary_lines.join("\n"),
            bullets,
        })
    }

    /// Enforce the bullet and summary caps.
    pub fn clamp(mut self, max_bullets: usize, max_summary_lines: usize) -> Self {
        self.bullets.truncate(max_bullets);
        self.summary = clamp_summary(&self.summary, max_summary_lines);
        self
    }
}

/// Wrap a summary to [`MAX_SUMMARY_LINE_CHARS`] and keep at most `max_lines` lines.
pub fn clamp_summary(summary: &str, max_lines: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    for raw in summary.lines() {
        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }
        lines.extend(wrap_line(raw, MAX_SUMMARY_LINE_CHARS));
        if lines.len() >= max_lines {
            break;
        }
    }
    lines.truncate(max_lines.max(1));
    lines.join("\n")
}

fn wrap_line(line: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();

    for word in line.split_whitespace() {
        let word = truncate_chars(word, width);
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string on the opening fence line.
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}
