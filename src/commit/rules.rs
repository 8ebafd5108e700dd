//! Path-shape rules for commit type and scope detection.
//!
//! Type detection is a static rule table: every changed path is tested
//! against the rules in order and contributes the type of the first rule it
//! matches. The type with the most candidates wins; ties go to the
//! [`CommitType`] priority order.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::commit::changeset::ChangeSet;

/// Conventional commit types, declared in priority order (highest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Test,
    Chore,
}

impl CommitType {
    pub const ALL: [CommitType; 7] = [
        CommitType::Feat,
        CommitType::Fix,
        CommitType::Docs,
        CommitType::Style,
        CommitType::Refactor,
        CommitType::Test,
        CommitType::Chore,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Docs => "docs",
            Self::Style => "style",
            Self::Refactor => "refactor",
            Self::Test => "test",
            Self::Chore => "chore",
        }
    }
}

impl fmt::Display for CommitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feat" => Ok(Self::Feat),
            "fix" => Ok(Self::Fix),
            "docs" => Ok(Self::Docs),
            "style" => Ok(Self::Style),
            "refactor" => Ok(Self::Refactor),
            "test" => Ok(Self::Test),
            "chore" => Ok(Self::Chore),
            _ => Err(format!("Unknown commit type: {}", s)),
        }
    }
}

/// How a path entered the changeset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
}

/// A changed path as seen by the rules.
#[derive(Debug, Clone, Copy)]
pub struct PathChange<'a> {
    pub path: &'a str,
    pub kind: ChangeKind,
}

impl<'a> PathChange<'a> {
    fn segments(&self) -> Vec<&'a str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }

    /// Directory segments only, the file name excluded.
    fn dirs(&self) -> Vec<&'a str> {
        let mut segments = self.segments();
        segments.pop();
        segments
    }

    fn file_name(&self) -> &'a str {
        self.path.rsplit('/').next().unwrap_or(self.path)
    }

    fn extension(&self) -> Option<String> {
        Path::new(self.file_name())
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }
}

/// One row of the type table.
pub struct TypeRule {
    pub name: &'static str,
    pub commit_type: CommitType,
    pub matches: fn(&PathChange<'_>) -> bool,
}

const TEST_DIRS: &[&str] = &["test", "tests", "__tests__"];
const DOC_EXTENSIONS: &[&str] = &["md", "rst"];
const STYLE_EXTENSIONS: &[&str] = &["css", "scss", "sass", "less"];
const STYLE_DIRS: &[&str] = &["style", "styles"];
const MANIFEST_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "lock", "ini", "cfg"];
const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "package-lock.json",
    "composer.json",
    "setup.py",
    "makefile",
    "dockerfile",
    ".gitignore",
    ".editorconfig",
    "go.mod",
    "go.sum",
];
/// Manifests whose change means dependencies moved.
const DEPENDENCY_FILES: &[&str] = &[
    "cargo.toml",
    "cargo.lock",
    "package.json",
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "pyproject.toml",
    "poetry.lock",
    "requirements.txt",
    "go.mod",
    "go.sum",
    "gemfile.lock",
];
const SOURCE_ROOTS: &[&str] = &["src", "lib", "app"];

fn is_test_path(change: &PathChange<'_>) -> bool {
    change.dirs().iter().any(|d| TEST_DIRS.contains(d))
}

fn is_docs_path(change: &PathChange<'_>) -> bool {
    let name = change.file_name().to_uppercase();
    name.starts_with("README")
        || name.starts_with("CHANGELOG")
        || change.dirs().contains(&"docs")
        || change
            .extension()
            .is_some_and(|e| DOC_EXTENSIONS.contains(&e.as_str()))
}

fn is_style_path(change: &PathChange<'_>) -> bool {
    change
        .extension()
        .is_some_and(|e| STYLE_EXTENSIONS.contains(&e.as_str()))
        || change.dirs().iter().any(|d| STYLE_DIRS.contains(d))
}

fn is_manifest_path(change: &PathChange<'_>) -> bool {
    let name = change.file_name().to_lowercase();
    MANIFEST_FILES.contains(&name.as_str())
        || DEPENDENCY_FILES.contains(&name.as_str())
        || change
            .extension()
            .is_some_and(|e| MANIFEST_EXTENSIONS.contains(&e.as_str()))
}

fn is_new_source_path(change: &PathChange<'_>) -> bool {
    change.kind == ChangeKind::Added
        && change
            .dirs()
            .first()
            .is_some_and(|root| SOURCE_ROOTS.contains(root))
}

fn is_plain_modification(change: &PathChange<'_>) -> bool {
    change.kind == ChangeKind::Modified
}

/// The type table, evaluated top to bottom; paths matching nothing count as `feat`.
pub static TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        name: "test directory",
        commit_type: CommitType::Test,
        matches: is_test_path,
    },
    TypeRule {
        name: "documentation",
        commit_type: CommitType::Docs,
        matches: is_docs_path,
    },
    TypeRule {
        name: "stylesheet",
        commit_type: CommitType::Style,
        matches: is_style_path,
    },
    TypeRule {
        name: "manifest or config",
        commit_type: CommitType::Chore,
        matches: is_manifest_path,
    },
    TypeRule {
        name: "new source file",
        commit_type: CommitType::Feat,
        matches: is_new_source_path,
    },
    TypeRule {
        name: "modification",
        commit_type: CommitType::Refactor,
        matches: is_plain_modification,
    },
];

const DEFAULT_TYPE: CommitType = CommitType::Feat;

/// Flatten a changeset into rule inputs, in bucket order.
///
/// Renames are represented by their new path.
pub fn path_changes(changes: &ChangeSet) -> Vec<PathChange<'_>> {
    let mut out = Vec::with_capacity(changes.total_files());
    out.extend(changes.added.iter().map(|p| PathChange {
        path: p,
        kind: ChangeKind::Added,
    }));
    out.extend(changes.deleted.iter().map(|p| PathChange {
        path: p,
        kind: ChangeKind::Deleted,
    }));
    out.extend(changes.renamed.iter().map(|(_, new)| PathChange {
        path: new,
        kind: ChangeKind::Renamed,
    }));
    out.extend(changes.modified.iter().map(|p| PathChange {
        path: p,
        kind: ChangeKind::Modified,
    }));
    out
}

/// Candidate type for a single path.
pub fn candidate_type(change: &PathChange<'_>) -> CommitType {
    match TYPE_RULES.iter().find(|rule| (rule.matches)(change)) {
        Some(rule) => {
            debug!("{} matched rule '{}' -> {}", change.path, rule.name, rule.commit_type);
            rule.commit_type
        }
        None => DEFAULT_TYPE,
    }
}

/// Pick the winning commit type for a changeset.
pub fn detect_commit_type(changes: &ChangeSet) -> CommitType {
    let mut tally: HashMap<CommitType, usize> = HashMap::new();
    for change in path_changes(changes) {
        *tally.entry(candidate_type(&change)).or_default() += 1;
    }

    // ALL is in priority order, so the first type reaching the max count wins ties.
    let max = tally.values().copied().max().unwrap_or(0);
    if max == 0 {
        return DEFAULT_TYPE;
    }
    CommitType::ALL
        .into_iter()
        .find(|t| tally.get(t).copied().unwrap_or(0) == max)
        .unwrap_or(DEFAULT_TYPE)
}

/// Whether any changed path is a dependency manifest.
pub fn touches_dependencies(changes: &ChangeSet) -> bool {
    path_changes(changes).iter().any(|c| {
        DEPENDENCY_FILES.contains(&c.file_name().to_lowercase().as_str())
    })
}

/// Derive a scope from the directory structure of the changed paths.
///
/// Each path contributes the first directory after an optional `src`/`lib`/
/// `app` root. A unanimous or strictly most frequent segment becomes the
/// scope; a tie or no contributing path means no scope.
pub fn extract_scope(changes: &ChangeSet) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();

    for change in path_changes(changes) {
        let Some(segment) = scope_segment(&change) else {
            continue;
        };
        match counts.iter_mut().find(|(s, _)| *s == segment) {
            Some((_, n)) => *n += 1,
            None => counts.push((segment, 1)),
        }
    }

    let max = counts.iter().map(|(_, n)| *n).max()?;
    let mut leaders = counts.iter().filter(|(_, n)| *n == max);
    let (winner, _) = leaders.next()?;
    if leaders.next().is_some() {
        return None;
    }

    Some(normalize_scope(winner))
}

fn scope_segment<'a>(change: &PathChange<'a>) -> Option<&'a str> {
    let dirs = change.dirs();
    let mut dirs = dirs.as_slice();
    if let Some(first) = dirs.first()
        && SOURCE_ROOTS.contains(first)
    {
        dirs = &dirs[1..];
    }
    dirs.first().copied()
}

fn normalize_scope(segment: &str) -> String {
    segment.replace(['_', ' '], "-").to_lowercase()
}
