//! Classified snapshot of working-tree changes.

use serde::Serialize;

/// Working-tree differences relative to the last commit.
///
/// Each path lives in exactly one bucket; both sides of a rename are owned
/// by the `renamed` bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSet {
    pub modified: Vec<String>,
    pub added: Vec<String>,
    pub deleted: Vec<String>,
    pub renamed: Vec<(String, String)>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.modified.is_empty()
            && self.added.is_empty()
            && self.deleted.is_empty()
            && self.renamed.is_empty()
    }

    /// Number of files touched; a rename counts once.
    pub fn total_files(&self) -> usize {
        self.modified.len() + self.added.len() + self.deleted.len() + self.renamed.len()
    }

    /// Copy of this changeset with `path` dropped from every bucket.
    pub fn without_path(&self, path: &str) -> ChangeSet {
        ChangeSet {
            modified: self.modified.iter().filter(|p| *p != path).cloned().collect(),
            added: self.added.iter().filter(|p| *p != path).cloned().collect(),
            deleted: self.deleted.iter().filter(|p| *p != path).cloned().collect(),
            renamed: self
                .renamed
                .iter()
                .filter(|(old, new)| old != path && new != path)
                .cloned()
                .collect(),
        }
    }

    /// Every path that ends up in the new tree or leaves it, rename sides included.
    pub fn touched_paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = Vec::with_capacity(self.total_files());
        paths.extend(self.added.iter().map(String::as_str));
        paths.extend(self.deleted.iter().map(String::as_str));
        for (old, new) in &self.renamed {
            paths.push(old);
            paths.push(new);
        }
        paths.extend(self.modified.iter().map(String::as_str));
        paths
    }
}
