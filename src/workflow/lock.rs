//! Per-repository serialization of commit workflows.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per canonical work tree path.
#[derive(Debug, Default)]
pub struct RepoLocks {
    locks: Mutex<HashMap<PathBuf, Arc<AsyncMutex<()>>>>,
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to the work tree at `path`.
    pub async fn acquire(&self, path: &Path) -> OwnedMutexGuard<()> {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        let lock = {
            // A poisoned map only means another task panicked mid-insert.
            let mut locks = match self.locks.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            locks.entry(key).or_default().clone()
        };
        lock.lock_owned().await
    }
}
