//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::Path;

use git2::{Commit, IndexAddOption, Oid, Repository};
use tempfile::TempDir;

use commitscribe::changelog::{EntryHeading, entry_headings};
use commitscribe::{CommitDriver, Config};

pub const CHANGELOG: &str = "CHANGELOG.md";

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Empty repository with a committer identity configured.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        {
            let mut config = repo.config().expect("Failed to open repo config");
            config.set_str("user.name", "Test User").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }
        Self { dir, repo }
    }

    /// Repository with one commit containing `files`.
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let test_repo = Self::new();
        for (path, content) in files {
            test_repo.write_file(path, content);
        }
        test_repo.commit_all("initial commit");
        test_repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn path_str(&self) -> String {
        self.path().to_string_lossy().into_owned()
    }

    pub fn write_file(&self, rel: &str, content: &str) {
        let full = self.path().join(rel);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(full, content).expect("Failed to write file");
    }

    pub fn remove_file(&self, rel: &str) {
        std::fs::remove_file(self.path().join(rel)).expect("Failed to remove file");
    }

    /// Stage everything in the work tree and commit it. Returns the commit OID.
    pub fn commit_all(&self, message: &str) -> Oid {
        let mut index = self.repo.index().expect("Failed to get index");
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .expect("Failed to add files");
        index
            .update_all(["*"].iter(), None)
            .expect("Failed to update index");
        index.write().expect("Failed to write index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");
        let sig = self.repo.signature().expect("Failed to create signature");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// The index as currently on disk.
    pub fn index(&self) -> git2::Index {
        let mut index = self.repo.index().expect("Failed to get index");
        index.read(true).expect("Failed to reload index");
        index
    }

    /// Stage one path as it is in the work tree.
    pub fn stage(&self, rel: &str) {
        let mut index = self.index();
        index.add_path(Path::new(rel)).expect("Failed to stage path");
        index.write().expect("Failed to write index");
    }

    /// Content of `rel` as staged in the index.
    pub fn staged_content(&self, rel: &str) -> Option<Vec<u8>> {
        let entry = self.index().get_path(Path::new(rel), 0)?;
        let blob = self.repo.find_blob(entry.id).ok()?;
        Some(blob.content().to_vec())
    }

    pub fn head(&self) -> Commit<'_> {
        self.repo
            .head()
            .expect("No HEAD")
            .peel_to_commit()
            .expect("HEAD is not a commit")
    }

    pub fn head_id(&self) -> Oid {
        self.head().id()
    }

    pub fn head_branch(&self) -> String {
        self.repo
            .head()
            .expect("No HEAD")
            .shorthand()
            .expect("Branch name is not UTF-8")
            .to_string()
    }

    /// Number of commits reachable from HEAD (0 for an unborn branch).
    pub fn commit_count(&self) -> usize {
        if self.repo.head().is_err() {
            return 0;
        }
        let mut walk = self.repo.revwalk().expect("Failed to create revwalk");
        walk.push_head().expect("Failed to push HEAD");
        walk.count()
    }

    /// Changelog in the work tree.
    pub fn changelog(&self) -> Option<String> {
        std::fs::read_to_string(self.path().join(CHANGELOG)).ok()
    }

    /// Changelog as committed in HEAD.
    pub fn committed_changelog(&self) -> Option<String> {
        let tree = self.head().tree().ok()?;
        let entry = tree.get_path(Path::new(CHANGELOG)).ok()?;
        let blob = entry.to_object(&self.repo).ok()?.peel_to_blob().ok()?;
        Some(String::from_utf8_lossy(blob.content()).into_owned())
    }

    pub fn committed_headings(&self) -> Vec<EntryHeading> {
        self.committed_changelog()
            .map(|content| entry_headings(&content))
            .unwrap_or_default()
    }

    /// Resolve an abbreviated hash to a commit.
    pub fn find_commit_by_prefix(&self, short: &str) -> Commit<'_> {
        self.repo
            .revparse_single(short)
            .expect("Short hash does not resolve")
            .peel_to_commit()
            .expect("Short hash is not a commit")
    }

    /// Attach a fresh bare repository as `name`. The returned dir owns it.
    pub fn add_bare_remote(&self, name: &str) -> TempDir {
        let remote_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Repository::init_bare(remote_dir.path()).expect("Failed to init bare repo");
        let url = remote_dir.path().to_string_lossy().into_owned();
        self.repo
            .remote(name, &url)
            .expect("Failed to add remote");
        remote_dir
    }

    /// Attach a remote whose URL points at nothing.
    pub fn add_unreachable_remote(&self, name: &str) {
        let missing = self.path().join("no-such-remote.git");
        self.repo
            .remote(name, &missing.to_string_lossy())
            .expect("Failed to add remote");
    }
}

/// Driver on default settings (heuristic messages only).
pub fn heuristic_driver() -> CommitDriver {
    CommitDriver::new(Config::default())
}
