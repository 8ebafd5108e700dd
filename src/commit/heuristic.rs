//! Deterministic message synthesis from path shape and diff topics.

use std::path::Path;

use crate::commit::changeset::ChangeSet;
use crate::commit::keywords::BUG_FIX_TOPIC;
use crate::commit::message::CommitMessage;
use crate::commit::rules::{CommitType, detect_commit_type, extract_scope, touches_dependencies};

/// Build a commit message from a changeset and the topics its diff touches.
/// Never fails.
pub fn synthesize(
    changes: &ChangeSet,
    topics: &[&str],
    max_bullets: usize,
    max_summary_lines: usize,
) -> CommitMessage {
    let commit_type = refine_type(detect_commit_type(changes), topics);
    CommitMessage {
        commit_type,
        scope: extract_scope(changes),
        summary: summary_for(commit_type, changes, topics),
        bullets: bullets_for(changes, max_bullets),
    }
    .clamp(max_bullets, max_summary_lines)
}

/// One bullet per change: additions, deletions, renames, modifications.
pub fn bullets_for(changes: &ChangeSet, max: usize) -> Vec<String> {
    changes
        .added
        .iter()
        .map(|p| format!("Add {p}"))
        .chain(changes.deleted.iter().map(|p| format!("Remove {p}")))
        .chain(
            changes
                .renamed
                .iter()
                .map(|(old, new)| format!("Rename {old} to {new}")),
        )
        .chain(changes.modified.iter().map(|p| format!("Update {p}")))
        .take(max)
        .collect()
}

/// Edits to existing code that talk about bugs are fixes, not refactors.
pub fn refine_type(commit_type: CommitType, topics: &[&str]) -> CommitType {
    if commit_type == CommitType::Refactor && topics.contains(&BUG_FIX_TOPIC) {
        CommitType::Fix
    } else {
        commit_type
    }
}

/// Imperative summary phrase for the winning type.
pub fn summary_for(commit_type: CommitType, changes: &ChangeSet, topics: &[&str]) -> String {
    let total = changes.total_files();
    match commit_type {
        CommitType::Feat if !topics.is_empty() => {
            format!("Implement {}", join_topics(topics, None))
        }
        CommitType::Fix if topics.iter().any(|t| *t != BUG_FIX_TOPIC) => {
            format!("Fix {}", join_topics(topics, Some(BUG_FIX_TOPIC)))
        }
        CommitType::Docs if single_path(changes).is_none() && !topics.is_empty() => {
            match other_topic(topics, "documentation") {
                Some(topic) => format!("Update documentation for {topic}"),
                None => "Update documentation".to_string(),
            }
        }
        CommitType::Refactor if topics.iter().any(|t| *t != "refactoring") => {
            format!("Refactor {}", join_topics(topics, Some("refactoring")))
        }
        CommitType::Test => match other_topic(topics, "testing") {
            Some(topic) => format!("Add tests for {topic}"),
            None => "Update tests".to_string(),
        },
        CommitType::Feat => match changes.added.as_slice() {
            [] => "Add new functionality".to_string(),
            [only] => format!("Add {}", readable_stem(only)),
            [first, rest @ ..] => format!("Add {} and {} more", readable_stem(first), rest.len()),
        },
        CommitType::Fix => format!("Fix issues in {total} file{}", plural(total)),
        CommitType::Docs => match single_path(changes) {
            Some(path) => format!("Update {} documentation", readable_stem(path)),
            None => "Update documentation".to_string(),
        },
        CommitType::Style => "Update styles".to_string(),
        CommitType::Refactor => match changes.modified.as_slice() {
            [] => format!("Refactor {total} file{}", plural(total)),
            [only] => format!("Refactor {}", readable_stem(only)),
            [first, second, ..] => format!(
                "Refactor {} and {}",
                readable_stem(first),
                readable_stem(second)
            ),
        },
        CommitType::Chore if touches_dependencies(changes) => "Update dependencies".to_string(),
        CommitType::Chore => match topics.first() {
            Some(topic) => format!("Update {topic}"),
            None => "Update configuration".to_string(),
        },
    }
}

/// First two topics joined with "and", skipping `except`.
fn join_topics(topics: &[&str], except: Option<&str>) -> String {
    topics
        .iter()
        .filter(|t| Some(**t) != except)
        .take(2)
        .copied()
        .collect::<Vec<_>>()
        .join(" and ")
}

fn other_topic<'a>(topics: &[&'a str], except: &str) -> Option<&'a str> {
    topics.iter().copied().find(|t| *t != except)
}

fn single_path(changes: &ChangeSet) -> Option<&str> {
    if changes.total_files() != 1 {
        return None;
    }
    changes
        .added
        .first()
        .or(changes.modified.first())
        .or(changes.deleted.first())
        .map(String::as_str)
        .or(changes.renamed.first().map(|(_, new)| new.as_str()))
}

/// File stem with `_` and `-` read as spaces.
fn readable_stem(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    stem.replace(['_', '-'], " ")
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MAX_BULLET_POINTS, MAX_SUMMARY_LINES};

    fn synth(changes: &ChangeSet) -> CommitMessage {
        synthesize(changes, &[], MAX_BULLET_POINTS, MAX_SUMMARY_LINES)
    }

    #[test]
    fn test_single_new_source_file() {
        let changes = ChangeSet {
            added: vec!["src/feature.py".to_string()],
            ..ChangeSet::default()
        };
        let message = synth(&changes);
        assert_eq!(message.commit_type, CommitType::Feat);
        assert_eq!(message.scope, None);
        assert_eq!(message.summary, "Add feature");
        assert_eq!(message.bullets, vec!["Add src/feature.py"]);
        assert_eq!(message.render(), "feat: Add feature\n\n- Add src/feature.py");
    }

    #[test]
    fn test_feature_plus_readme_is_feat() {
        let changes = ChangeSet {
            added: vec!["src/auth.py".to_string(), "README.md".to_string()],
            ..ChangeSet::default()
        };
        let message = synth(&changes);
        assert_eq!(message.commit_type, CommitType::Feat);
        assert_eq!(message.summary, "Add auth and 1 more");
    }

    #[test]
    fn test_readme_modification() {
        let changes = ChangeSet {
            modified: vec!["README.md".to_string()],
            ..ChangeSet::default()
        };
        let message = synth(&changes);
        assert_eq!(message.commit_type, CommitType::Docs);
        assert_eq!(message.summary, "Update README documentation");
        assert_eq!(message.bullets, vec!["Update README.md"]);
    }

    #[test]
    fn test_rename_bullet() {
        let changes = ChangeSet {
            renamed: vec![("old_util.py".to_string(), "new_util.py".to_string())],
            ..ChangeSet::default()
        };
        let message = synth(&changes);
        assert_eq!(message.bullets, vec!["Rename old_util.py to new_util.py"]);
    }

    #[test]
    fn test_bullets_capped_with_additions_first() {
        let changes = ChangeSet {
            modified: vec!["m1.rs".to_string(), "m2.rs".to_string()],
            added: (0..4).map(|i| format!("a{i}.rs")).collect(),
            deleted: vec!["d1.rs".to_string(), "d2.rs".to_string()],
            renamed: vec![("r_old.rs".to_string(), "r_new.rs".to_string())],
        };
        let bullets = synth(&changes).bullets;
        assert_eq!(
            bullets,
            vec!["Add a0.rs", "Add a1.rs", "Add a2.rs", "Add a3.rs", "Remove d1.rs"]
        );
    }

    #[test]
    fn test_bullet_order_across_buckets() {
        let changes = ChangeSet {
            modified: vec!["m.rs".to_string()],
            added: vec!["a.rs".to_string()],
            deleted: vec!["d.rs".to_string()],
            renamed: vec![("o.rs".to_string(), "n.rs".to_string())],
        };
        assert_eq!(
            bullets_for(&changes, 5),
            vec!["Add a.rs", "Remove d.rs", "Rename o.rs to n.rs", "Update m.rs"]
        );
    }

    #[test]
    fn test_summary_stays_within_two_lines() {
        let changes = ChangeSet {
            added: (0..200)
                .map(|i| format!("src/{}_{i}.py", "very_long_module_name".repeat(5)))
                .collect(),
            ..ChangeSet::default()
        };
        let message = synth(&changes);
        assert!(message.summary.lines().count() <= MAX_SUMMARY_LINES);
        assert!(message.render().lines().next().is_some());
    }

    #[test]
    fn test_refactor_summaries() {
        let two = ChangeSet {
            modified: vec!["src/my_engine.rs".to_string(), "src/parser-core.rs".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(summary_for(CommitType::Refactor, &two, &[]), "Refactor my engine and parser core");

        let none = ChangeSet {
            deleted: vec!["a.rs".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(summary_for(CommitType::Refactor, &none, &[]), "Refactor 1 file");
    }

    #[test]
    fn test_chore_summaries() {
        let deps = ChangeSet {
            modified: vec!["Cargo.toml".to_string(), "Cargo.lock".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(synth(&deps).summary, "Update dependencies");

        let config = ChangeSet {
            modified: vec![".github/ci.yml".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(synth(&config).summary, "Update configuration");
    }

    #[test]
    fn test_fix_summary_pluralizes() {
        let one = ChangeSet {
            modified: vec!["a.rs".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(summary_for(CommitType::Fix, &one, &[]), "Fix issues in 1 file");
    }

    #[test]
    fn test_feat_without_additions() {
        let changes = ChangeSet {
            deleted: vec!["scripts/old.sh".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(synth(&changes).summary, "Add new functionality");
    }

    #[test]
    fn test_topics_enrich_feat_summary() {
        let changes = ChangeSet {
            added: vec!["src/store.py".to_string()],
            ..ChangeSet::default()
        };
        let message = synthesize(&changes, &["caching", "logging"], 5, 2);
        assert_eq!(message.commit_type, CommitType::Feat);
        assert_eq!(message.summary, "Implement caching and logging");
    }

    #[test]
    fn test_bug_topic_turns_refactor_into_fix() {
        let changes = ChangeSet {
            modified: vec!["src/parser.rs".to_string()],
            ..ChangeSet::default()
        };
        let message = synthesize(&changes, &["validation", BUG_FIX_TOPIC], 5, 2);
        assert_eq!(message.commit_type, CommitType::Fix);
        assert_eq!(message.summary, "Fix validation");

        let bare = synthesize(&changes, &[BUG_FIX_TOPIC], 5, 2);
        assert_eq!(bare.commit_type, CommitType::Fix);
        assert_eq!(bare.summary, "Fix issues in 1 file");
    }

    #[test]
    fn test_bug_topic_does_not_override_feat() {
        let changes = ChangeSet {
            added: vec!["src/new.rs".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(refine_type(CommitType::Feat, &[BUG_FIX_TOPIC]), CommitType::Feat);
        assert_eq!(synthesize(&changes, &[BUG_FIX_TOPIC], 5, 2).commit_type, CommitType::Feat);
    }

    #[test]
    fn test_refactor_and_test_topic_phrases() {
        let modified = ChangeSet {
            modified: vec!["src/db.rs".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(
            summary_for(CommitType::Refactor, &modified, &["database", "refactoring", "API"]),
            "Refactor database and API"
        );
        assert_eq!(
            summary_for(CommitType::Refactor, &modified, &["refactoring"]),
            "Refactor db"
        );

        let tests = ChangeSet {
            added: vec!["tests/auth_test.rs".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(
            summary_for(CommitType::Test, &tests, &["authentication", "testing"]),
            "Add tests for authentication"
        );
        assert_eq!(summary_for(CommitType::Test, &tests, &["testing"]), "Update tests");
    }

    #[test]
    fn test_single_doc_file_keeps_file_phrase() {
        let changes = ChangeSet {
            modified: vec!["README.md".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(
            summary_for(CommitType::Docs, &changes, &["API"]),
            "Update README documentation"
        );

        let two = ChangeSet {
            modified: vec!["docs/a.md".to_string(), "docs/b.md".to_string()],
            ..ChangeSet::default()
        };
        assert_eq!(
            summary_for(CommitType::Docs, &two, &["documentation", "API"]),
            "Update documentation for API"
        );
    }
}
