//! Runtime configuration loaded from `COMMITSCRIBE_*` environment variables.

use std::env;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Hard cap on bullet points in a synthesized message.
pub const MAX_BULLET_POINTS: usize = 5;

/// Hard cap on physical lines in a commit summary.
pub const MAX_SUMMARY_LINES: usize = 2;

const DEFAULT_CHANGELOG_FILE: &str = "CHANGELOG.md";
const DEFAULT_CLAUDE_TIMEOUT_SECS: u64 = 60;
const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 60;

/// Settings shared by every workflow invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub default_repo_path: String,
    pub max_bullet_points: usize,
    pub max_summary_lines: usize,
    /// Changelog location, relative to the work tree root.
    pub changelog_file: String,
    /// Where remote repositories are cloned.
    pub workspace_dir: PathBuf,
    /// Include untracked files as additions.
    pub include_untracked: bool,
    /// Try the Claude CLI before the heuristic message source.
    pub ai_enabled: bool,
    pub claude_timeout: Duration,
    pub push_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_repo_path: ".".to_string(),
            max_bullet_points: MAX_BULLET_POINTS,
            max_summary_lines: MAX_SUMMARY_LINES,
            changelog_file: DEFAULT_CHANGELOG_FILE.to_string(),
            workspace_dir: env::temp_dir().join("commitscribe-workspaces"),
            include_untracked: true,
            ai_enabled: false,
            claude_timeout: Duration::from_secs(DEFAULT_CLAUDE_TIMEOUT_SECS),
            push_timeout: Duration::from_secs(DEFAULT_PUSH_TIMEOUT_SECS),
        }
    }
}

impl Config {
    /// Build a config from defaults overridden by environment variables.
    ///
    /// Unset or empty variables keep their default. Values that fail to parse
    /// or fall outside their allowed range are rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut config = Self {
            default_repo_path: read_string("COMMITSCRIBE_DEFAULT_REPO_PATH")
                .unwrap_or(defaults.default_repo_path),
            max_bullet_points: read_parsed("COMMITSCRIBE_MAX_BULLET_POINTS")?
                .unwrap_or(defaults.max_bullet_points),
            max_summary_lines: read_parsed("COMMITSCRIBE_MAX_SUMMARY_LINES")?
                .unwrap_or(defaults.max_summary_lines),
            changelog_file: read_string("COMMITSCRIBE_CHANGELOG_FILE")
                .unwrap_or(defaults.changelog_file),
            workspace_dir: read_string("COMMITSCRIBE_WORKSPACE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.workspace_dir),
            include_untracked: read_bool("COMMITSCRIBE_INCLUDE_UNTRACKED")?
                .unwrap_or(defaults.include_untracked),
            ai_enabled: read_bool("COMMITSCRIBE_ENABLE_AI")?.unwrap_or(defaults.ai_enabled),
            claude_timeout: read_parsed("COMMITSCRIBE_CLAUDE_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.claude_timeout),
            push_timeout: read_parsed("COMMITSCRIBE_PUSH_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.push_timeout),
        };

        config.validate()?;
        config.changelog_file = normalize_relative_path(&config.changelog_file);
        Ok(config)
    }

    /// Check range constraints on every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_BULLET_POINTS).contains(&self.max_bullet_points) {
            return Err(ConfigError::InvalidValue {
                key: "COMMITSCRIBE_MAX_BULLET_POINTS",
                value: self.max_bullet_points.to_string(),
                reason: format!("must be between 1 and {MAX_BULLET_POINTS}"),
            });
        }

        if !(1..=MAX_SUMMARY_LINES).contains(&self.max_summary_lines) {
            return Err(ConfigError::InvalidValue {
                key: "COMMITSCRIBE_MAX_SUMMARY_LINES",
                value: self.max_summary_lines.to_string(),
                reason: format!("must be between 1 and {MAX_SUMMARY_LINES}"),
            });
        }

        let changelog = Path::new(&self.changelog_file);
        let escapes = changelog
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if normalize_relative_path(&self.changelog_file).is_empty()
            || changelog.is_absolute()
            || escapes
        {
            return Err(ConfigError::InvalidValue {
                key: "COMMITSCRIBE_CHANGELOG_FILE",
                value: self.changelog_file.clone(),
                reason: "must be a non-empty path relative to the repository root".to_string(),
            });
        }

        if self.claude_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "COMMITSCRIBE_CLAUDE_TIMEOUT",
                value: "0".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        if self.push_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "COMMITSCRIBE_PUSH_TIMEOUT",
                value: "0".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }

        Ok(())
    }
}

/// Repository-relative path in the form git reports it: `/`-separated, no
/// `.` segments.
pub fn normalize_relative_path(path: &str) -> String {
    Path::new(path.trim())
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn read_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn read_parsed<T: std::str::FromStr>(key: &'static str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match read_string(key) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value,
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

fn read_bool(key: &'static str) -> Result<Option<bool>, ConfigError> {
    match read_string(key) {
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(Some(true)),
            "0" | "false" | "no" | "off" => Ok(Some(false)),
            _ => Err(ConfigError::InvalidValue {
                key,
                value,
                reason: "expected true/false".to_string(),
            }),
        },
        None => Ok(None),
    }
}
