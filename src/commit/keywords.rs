//! Topic detection over the changed lines of a unified diff.
//!
//! A static table maps topics to trigger words. Only `+`/`-` lines count,
//! and words match whole (after splitting identifiers on `_` and other
//! non-alphanumerics), so `login_token` hits `authentication` but
//! `catalog` does not hit `logging`.

use std::collections::HashSet;

/// Topics reported for one diff at most.
pub const MAX_TOPICS: usize = 3;

/// Topic that marks a change as a bug fix.
pub const BUG_FIX_TOPIC: &str = "bug fix";

/// One row of the topic table.
pub struct TopicRule {
    pub topic: &'static str,
    pub terms: &'static [&'static str],
}

/// Evaluated top to bottom; earlier rows win when more than [`MAX_TOPICS`] match.
pub static TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        topic: "caching",
        terms: &["cache", "cached", "caching", "ttl", "evict"],
    },
    TopicRule {
        topic: "authentication",
        terms: &["auth", "token", "credential", "login", "password"],
    },
    TopicRule {
        topic: "logging",
        terms: &["log", "logger", "logging"],
    },
    TopicRule {
        topic: "configuration",
        terms: &["config", "setting", "settings", "option", "options"],
    },
    TopicRule {
        topic: "error handling",
        terms: &["error", "exception", "try", "catch", "raise"],
    },
    TopicRule {
        topic: "testing",
        terms: &["test", "assert", "mock", "fixture"],
    },
    TopicRule {
        topic: "documentation",
        terms: &["doc", "docs", "readme", "comment"],
    },
    TopicRule {
        topic: "API",
        terms: &["endpoint", "route", "api", "request", "response"],
    },
    TopicRule {
        topic: "database",
        terms: &["db", "database", "query", "sql"],
    },
    TopicRule {
        topic: "performance",
        terms: &["optimize", "performance", "speed", "fast"],
    },
    TopicRule {
        topic: "security",
        terms: &["security", "secure", "vulnerability", "sanitize"],
    },
    TopicRule {
        topic: "validation",
        terms: &["validate", "validation", "check", "verify"],
    },
    TopicRule {
        topic: "refactoring",
        terms: &["refactor", "restructure", "reorganize"],
    },
    TopicRule {
        topic: BUG_FIX_TOPIC,
        terms: &["fix", "bug", "issue", "problem", "resolve"],
    },
];

/// Topics touched by the diff, in table order, at most [`MAX_TOPICS`].
pub fn detect_topics(diff_text: &str) -> Vec<&'static str> {
    let words = changed_words(diff_text);
    if words.is_empty() {
        return Vec::new();
    }

    TOPIC_RULES
        .iter()
        .filter(|rule| rule.terms.iter().any(|t| words.contains(*t)))
        .map(|rule| rule.topic)
        .take(MAX_TOPICS)
        .collect()
}

/// Lowercased words from added and removed lines, file headers excluded.
fn changed_words(diff_text: &str) -> HashSet<String> {
    diff_text
        .lines()
        .filter(|line| {
            (line.starts_with('+') && !line.starts_with("+++"))
                || (line.starts_with('-') && !line.starts_with("---"))
        })
        .flat_map(|line| line[1..].split(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_topics_in_table_order() {
        let diff = "+++ b/src/store.py\n+def evict(key):\n+    log.info(\"cache miss\")\n";
        assert_eq!(detect_topics(diff), vec!["caching", "logging"]);
    }

    #[test]
    fn test_ignores_context_and_headers() {
        let diff = "diff --git a/cache.py b/cache.py\n--- a/cache.py\n+++ b/cache.py\n@@ -1 +1 @@\n x = cache\n+y = 2\n";
        assert!(detect_topics(diff).is_empty());
    }

    #[test]
    fn test_whole_words_only() {
        assert!(detect_topics("+let catalog = dialog;\n").is_empty());
        assert_eq!(detect_topics("+let login_token = 1;\n"), vec!["authentication"]);
    }

    #[test]
    fn test_removed_lines_count() {
        assert_eq!(detect_topics("-    # TODO fix this bug\n"), vec![BUG_FIX_TOPIC]);
    }

    #[test]
    fn test_capped_at_max_topics() {
        let diff = "+cache token log config error test\n";
        let topics = detect_topics(diff);
        assert_eq!(topics.len(), MAX_TOPICS);
        assert_eq!(topics, vec!["caching", "authentication", "logging"]);
    }

    #[test]
    fn test_empty_diff() {
        assert!(detect_topics("").is_empty());
    }
}
