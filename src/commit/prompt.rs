//! Prompt construction for generated commit messages.

use crate::commit::diff::DiffSummary;

/// Maximum length for sanitized diff text.
const MAX_DIFF_SANITIZED_LENGTH: usize = 30_000;

/// Phrases stripped from diff text before it reaches the model.
const INJECTION_PATTERNS: &[&str] = &[
    "ignore previous instructions",
    "ignore all previous instructions",
    "disregard previous instructions",
    "forget your instructions",
    "you are now",
    "new instructions:",
    "system prompt",
];

/// Build the prompt asking for a Conventional Commit message.
///
/// The model is asked for plain text in the same layout the heuristic
/// renders, so its answer can be parsed back into a `CommitMessage`.
pub fn build_commit_prompt(diff: &DiffSummary, max_bullets: usize, max_summary_lines: usize) -> String {
    let changes = &diff.changes;
    let mut files: Vec<String> = Vec::with_capacity(changes.total_files());
    files.extend(changes.added.iter().map(|p| format!("- {p} (added)")));
    files.extend(changes.deleted.iter().map(|p| format!("- {p} (deleted)")));
    files.extend(
        changes
            .renamed
            .iter()
            .map(|(old, new)| format!("- {old} -> {new} (renamed)")),
    );
    files.extend(changes.modified.iter().map(|p| format!("- {p} (modified)")));
    let files_section = files.join("\n");

    let sanitized_diff = sanitize_diff(&diff.diff_text, MAX_DIFF_SANITIZED_LENGTH);

    let truncation_note = if diff.truncated {
        "\n\nNote: The diff was truncated due to size. Focus on the visible changes."
    } else {
        ""
    };

    format!(
        r#"You are generating a Git commit message following the Conventional Commits specification.

## Changed Files ({additions} additions, {deletions} deletions)
{files_section}

## Diff
```
{sanitized_diff}
```{truncation_note}

## Rules (STRICT)
- First line: `type(scope): summary` or `type: summary` when no single component dominates
- Type: exactly one of feat, fix, docs, style, refactor, test, chore
- Scope: the primary directory or module affected, lowercase, optional
- Summary: imperative mood ("Add", "Fix", "Update"), at most {max_summary_lines} lines of at most 72 characters
- Then one blank line, then at most {max_bullets} bullet lines starting with "- "
- Bullets list additions first, then removals, renames and updates

## Output Format
Respond with ONLY the commit message text (no markdown fences, no explanation)."#,
        additions = diff.additions,
        deletions = diff.deletions,
    )
}

/// Sanitize diff text for inclusion in a prompt.
///
/// Removes control characters and ANSI escapes, filters known injection
/// phrases and collapses long blank runs. Markdown headers are kept since
/// diff context can legitimately contain `##`.
pub fn sanitize_diff(text: &str, max_len: usize) -> String {
    let mut result = remove_ansi_escapes(text);
    result = remove_control_chars(&result);
    result = filter_injection_patterns(&result);
    result = normalize_whitespace(&result);

    if result.len() > max_len {
        let mut end = max_len;
        while end > 0 && !result.is_char_boundary(end) {
            end -= 1;
        }
        result.truncate(end);
    }

    result
}

fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect()
}

fn remove_ansi_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            // CSI sequences end at the first byte in '@'..='~'.
            for next in chars.by_ref() {
                if ('@'..='~').contains(&next) {
                    break;
                }
            }
            continue;
        }
        out.push(c);
    }
    out
}

fn filter_injection_patterns(text: &str) -> String {
    let mut result = text.to_string();
    for pattern in INJECTION_PATTERNS {
        loop {
            let lower = result.to_lowercase();
            // Lowercasing can shift byte offsets for non-ASCII text; only
            // splice when the match lands on the same boundaries.
            let Some(idx) = lower.find(pattern) else {
                break;
            };
            let end = idx + pattern.len();
            if lower.len() != result.len()
                || !result.is_char_boundary(idx)
                || !result.is_char_boundary(end)
            {
                result = lower.replace(pattern, "[filtered]");
                break;
            }
            result.replace_range(idx..end, "[filtered]");
        }
    }
    result
}

fn normalize_whitespace(text: &str) -> String {
    let mut out = Vec::new();
    let mut blank_run = 0;
    for line in text.lines() {
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 2 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push(line.trim_end());
    }
    out.join("\n")
}
