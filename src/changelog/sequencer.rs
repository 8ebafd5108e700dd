//! File-level changelog state transitions for one commit workflow run.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::ChangelogError;

use super::format::ChangelogEntry;
use super::parser::{finalize_placeholder, insert_entry, mark_entry_pushed};

/// File content captured before the placeholder insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogSnapshot {
    previous: Option<String>,
}

impl ChangelogSnapshot {
    /// Whether the file existed before this run touched it.
    pub fn existed(&self) -> bool {
        self.previous.is_some()
    }
}

/// Drives the placeholder, hash-finalize and push-finalize steps.
#[derive(Debug, Clone)]
pub struct ChangelogSequencer {
    path: PathBuf,
}

impl ChangelogSequencer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert a `[LOCAL]` placeholder entry for `message`, creating the file
    /// with its header when absent.
    pub fn insert_placeholder(&self, message: &str) -> Result<ChangelogSnapshot, ChangelogError> {
        let previous = self.read()?;
        let entry = ChangelogEntry::placeholder(message);
        let content = insert_entry(previous.as_deref(), &entry);
        self.write(&content)?;
        debug!("Inserted placeholder entry into {}", self.path.display());
        Ok(ChangelogSnapshot { previous })
    }

    /// Write the real short hash into the placeholder entry.
    pub fn finalize_hash(&self, short_hash: &str) -> Result<(), ChangelogError> {
        let content = self.read()?.ok_or(ChangelogError::PlaceholderNotFound)?;
        let updated = finalize_placeholder(&content, short_hash)?;
        self.write(&updated)?;
        debug!("Finalized changelog entry {}", short_hash);
        Ok(())
    }

    /// Flip the entry for `short_hash` to `[PUSHED]`.
    pub fn mark_pushed(&self, short_hash: &str) -> Result<(), ChangelogError> {
        let content = self
            .read()?
            .ok_or_else(|| ChangelogError::EntryNotFound(short_hash.to_string()))?;
        let updated = mark_entry_pushed(&content, short_hash)?;
        self.write(&updated)?;
        debug!("Marked changelog entry {} as pushed", short_hash);
        Ok(())
    }

    /// Put the file back the way `snapshot` found it.
    pub fn restore(&self, snapshot: &ChangelogSnapshot) -> Result<(), ChangelogError> {
        match &snapshot.previous {
            Some(content) => self.write(content),
            None => match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(ChangelogError::WriteFailed(e)),
            },
        }
    }

    fn read(&self) -> Result<Option<String>, ChangelogError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ChangelogError::ReadFailed(e)),
        }
    }

    /// Write through a temp file in the same directory, then rename over.
    fn write(&self, content: &str) -> Result<(), ChangelogError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(ChangelogError::WriteFailed)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(ChangelogError::WriteFailed)?;
        // The temp file is created owner-only; the renamed result must not be.
        if let Some(permissions) = self.target_permissions()? {
            tmp.as_file()
                .set_permissions(permissions)
                .map_err(ChangelogError::WriteFailed)?;
        }
        tmp.write_all(content.as_bytes())
            .map_err(ChangelogError::WriteFailed)?;
        tmp.as_file()
            .sync_all()
            .map_err(ChangelogError::WriteFailed)?;
        tmp.persist(&self.path)
            .map_err(|e| ChangelogError::WriteFailed(e.error))?;
        Ok(())
    }

    /// Permissions of the existing file, or the usual 0644 for a new one.
    fn target_permissions(&self) -> Result<Option<fs::Permissions>, ChangelogError> {
        match fs::metadata(&self.path) {
            Ok(meta) => Ok(Some(meta.permissions())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(default_permissions()),
            Err(e) => Err(ChangelogError::ReadFailed(e)),
        }
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::format::{EntryStatus, PLACEHOLDER_HASH};
    use crate::changelog::parser::entry_headings;
    use tempfile::TempDir;

    fn setup() -> (TempDir, ChangelogSequencer) {
        let dir = TempDir::new().unwrap();
        let sequencer = ChangelogSequencer::new(dir.path().join("CHANGELOG.md"));
        (dir, sequencer)
    }

    fn content(sequencer: &ChangelogSequencer) -> String {
        fs::read_to_string(sequencer.path()).unwrap()
    }

    #[test]
    fn test_full_lifecycle() {
        let (_dir, sequencer) = setup();

        let snapshot = sequencer.insert_placeholder("feat: Add a").unwrap();
        assert!(!snapshot.existed());
        assert!(content(&sequencer).starts_with("# Changelog\n"));
        assert_eq!(entry_headings(&content(&sequencer))[0].short_hash, PLACEHOLDER_HASH);

        sequencer.finalize_hash("1a2b3c4").unwrap();
        let heading = &entry_headings(&content(&sequencer))[0];
        assert_eq!(heading.short_hash, "1a2b3c4");
        assert_eq!(heading.status, EntryStatus::Local);

        sequencer.mark_pushed("1a2b3c4").unwrap();
        assert_eq!(entry_headings(&content(&sequencer))[0].status, EntryStatus::Pushed);
    }

    #[test]
    fn test_restore_removes_new_file() {
        let (_dir, sequencer) = setup();
        let snapshot = sequencer.insert_placeholder("feat: Add a").unwrap();
        sequencer.restore(&snapshot).unwrap();
        assert!(!sequencer.path().exists());
    }

    #[test]
    fn test_restore_rewrites_previous_content() {
        let (_dir, sequencer) = setup();
        fs::write(sequencer.path(), "# Changelog\n\n## [Unreleased]\n\n").unwrap();

        let snapshot = sequencer.insert_placeholder("docs: Update").unwrap();
        assert!(snapshot.existed());
        sequencer.restore(&snapshot).unwrap();
        assert_eq!(content(&sequencer), "# Changelog\n\n## [Unreleased]\n\n");
    }

    #[test]
    fn test_finalize_without_file_fails() {
        let (_dir, sequencer) = setup();
        assert!(matches!(
            sequencer.finalize_hash("1234567"),
            Err(ChangelogError::PlaceholderNotFound)
        ));
    }

    #[test]
    fn test_nested_changelog_path_created() {
        let dir = TempDir::new().unwrap();
        let sequencer = ChangelogSequencer::new(dir.path().join("docs").join("HISTORY.md"));
        sequencer.insert_placeholder("chore: Tidy").unwrap();
        assert!(dir.path().join("docs/HISTORY.md").exists());
    }

    #[test]
    #[cfg(unix)]
    fn test_rewrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, sequencer) = setup();
        fs::write(sequencer.path(), "# Changelog\n\n## [Unreleased]\n\n").unwrap();
        fs::set_permissions(sequencer.path(), fs::Permissions::from_mode(0o664)).unwrap();

        sequencer.insert_placeholder("feat: Add a").unwrap();
        sequencer.finalize_hash("1a2b3c4").unwrap();

        let mode = fs::metadata(sequencer.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o664);
    }

    #[test]
    #[cfg(unix)]
    fn test_new_file_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, sequencer) = setup();
        sequencer.insert_placeholder("feat: Add a").unwrap();

        let mode = fs::metadata(sequencer.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    #[cfg(unix)]
    fn test_unwritable_directory_is_write_error() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, sequencer) = setup();
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();

        let result = sequencer.insert_placeholder("feat: Add a");

        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();
        // Root ignores directory permissions, so only assert when it bit.
        if let Err(e) = result {
            assert!(matches!(e, ChangelogError::WriteFailed(_)));
        }
    }
}
