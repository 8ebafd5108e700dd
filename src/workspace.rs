//! Resolve a repository target (local path or remote URL) to a work tree.
//!
//! Remote URLs are cloned with the system `git` into
//! `<workspace_dir>/<repo id>`, where the id is the first 16 hex characters
//! of the URL's SHA-256. An existing clone is reused after a fast-forward pull.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::WorkspaceError;

const REPO_ID_LEN: usize = 16;
const URL_SCHEMES: &[&str] = &["http://", "https://", "ssh://", "git://", "file://"];

/// Clone-or-reuse manager for remote repositories.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    network_timeout: Duration,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, network_timeout: Duration) -> Self {
        Self {
            root: root.into(),
            network_timeout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local work tree for `target`.
    ///
    /// URLs are cloned or refreshed; anything else must be an existing path.
    pub async fn resolve(&self, target: &str) -> Result<PathBuf, WorkspaceError> {
        if is_remote_url(target) {
            return self.clone_or_reuse(target).await;
        }

        let path = PathBuf::from(target);
        if !path.exists() {
            return Err(WorkspaceError::PathNotFound(target.to_string()));
        }
        Ok(path)
    }

    /// Where `url` is (or would be) cloned.
    pub fn clone_path(&self, url: &str) -> PathBuf {
        self.root.join(repo_id(url))
    }

    /// Delete the clone of `url`. Missing clones are not an error.
    pub fn cleanup(&self, url: &str) -> Result<bool, WorkspaceError> {
        let path = self.clone_path(url);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(&path).map_err(|source| WorkspaceError::CleanupFailed {
            path: path.clone(),
            source,
        })?;
        info!("Removed workspace {}", path.display());
        Ok(true)
    }

    async fn clone_or_reuse(&self, url: &str) -> Result<PathBuf, WorkspaceError> {
        let path = self.clone_path(url);

        if path.join(".git").exists() {
            debug!("Reusing clone of {} at {}", url, path.display());
            if let Err(e) = self.pull(&path, url).await {
                warn!("Could not refresh {}: {}", path.display(), e);
            }
            return Ok(path);
        }

        std::fs::create_dir_all(&self.root).map_err(|source| WorkspaceError::WorkspaceDir {
            path: self.root.clone(),
            source,
        })?;

        info!("Cloning {} into {}", url, path.display());
        let mut cmd = Command::new("git");
        cmd.arg("clone").arg(url).arg(&path);
        if let Err(e) = self.run(cmd, url).await {
            // Leave no half-written clone behind to be mistaken for a reusable one.
            match std::fs::remove_dir_all(&path) {
                Err(cleanup) if cleanup.kind() != std::io::ErrorKind::NotFound => {
                    warn!("Could not remove partial clone {}: {}", path.display(), cleanup);
                }
                _ => {}
            }
            return Err(e);
        }
        Ok(path)
    }

    async fn pull(&self, path: &Path, url: &str) -> Result<(), WorkspaceError> {
        let mut cmd = Command::new("git");
        cmd.arg("-C").arg(path).arg("pull").arg("--ff-only");
        self.run(cmd, url).await
    }

    async fn run(&self, mut cmd: Command, url: &str) -> Result<(), WorkspaceError> {
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = timeout(self.network_timeout, cmd.output())
            .await
            .map_err(|_| WorkspaceError::CloneTimeout {
                url: url.to_string(),
                secs: self.network_timeout.as_secs(),
            })?
            .map_err(WorkspaceError::SpawnFailed)?;

        if !output.status.success() {
            return Err(WorkspaceError::CloneFailed {
                url: url.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

/// Whether `target` names a remote rather than a local path.
pub fn is_remote_url(target: &str) -> bool {
    if URL_SCHEMES.iter().any(|s| target.starts_with(s)) {
        return true;
    }
    // scp-like `user@host:path`
    match (target.find('@'), target.find(':')) {
        (Some(at), Some(colon)) => at > 0 && colon > at + 1 && !target[..colon].contains('/'),
        _ => false,
    }
}

/// Filesystem-safe id for a URL.
pub fn repo_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(REPO_ID_LEN);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Repository;
    use tempfile::TempDir;

    #[test]
    fn test_is_remote_url() {
        assert!(is_remote_url("https://github.com/user/repo.git"));
        assert!(is_remote_url("ssh://git@host/repo.git"));
        assert!(is_remote_url("git@github.com:user/repo.git"));
        assert!(is_remote_url("file:///srv/repo.git"));
        assert!(!is_remote_url("."));
        assert!(!is_remote_url("/home/user/project"));
        assert!(!is_remote_url("./dir/with@sign:colon"));
    }

    #[test]
    fn test_repo_id_is_stable_and_short() {
        let a = repo_id("https://github.com/user/repo.git");
        assert_eq!(a.len(), REPO_ID_LEN);
        assert_eq!(a, repo_id("https://github.com/user/repo.git"));
        assert_ne!(a, repo_id("https://github.com/user/other.git"));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_resolve_local_path() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path().join("ws"), Duration::from_secs(30));
        let target = dir.path().to_str().unwrap();
        assert_eq!(workspace.resolve(target).await.unwrap(), dir.path());
    }

    #[tokio::test]
    async fn test_resolve_missing_path() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path().join("ws"), Duration::from_secs(30));
        let missing = dir.path().join("missing");
        assert!(matches!(
            workspace.resolve(missing.to_str().unwrap()).await,
            Err(WorkspaceError::PathNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clone_reuse_and_cleanup() {
        let origin = TempDir::new().unwrap();
        {
            let repo = Repository::init(origin.path()).unwrap();
            let sig = git2::Signature::now("Test", "test@example.com").unwrap();
            std::fs::write(origin.path().join("README.md"), "hi").unwrap();
            let mut index = repo.index().unwrap();
            index.add_path(Path::new("README.md")).unwrap();
            index.write().unwrap();
            let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
            repo.commit(Some("HEAD"), &sig, &sig, "init", &tree, &[])
                .unwrap();
        }
        let url = format!("file://{}", origin.path().display());

        let ws_dir = TempDir::new().unwrap();
        let workspace = Workspace::new(ws_dir.path().join("ws"), Duration::from_secs(60));

        let cloned = workspace.resolve(&url).await.unwrap();
        assert_eq!(cloned, workspace.clone_path(&url));
        assert!(cloned.join("README.md").exists());

        let reused = workspace.resolve(&url).await.unwrap();
        assert_eq!(reused, cloned);

        assert!(workspace.cleanup(&url).unwrap());
        assert!(!cloned.exists());
        assert!(!workspace.cleanup(&url).unwrap());
    }

    #[tokio::test]
    async fn test_clone_failure_reports_stderr() {
        let dir = TempDir::new().unwrap();
        let workspace = Workspace::new(dir.path().join("ws"), Duration::from_secs(30));
        let url = format!("file://{}", dir.path().join("nope.git").display());

        let result = workspace.resolve(&url).await;
        assert!(matches!(result, Err(WorkspaceError::CloneFailed { .. })));
        assert!(!workspace.clone_path(&url).exists());
    }
}
