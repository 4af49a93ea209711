//! Mirror configuration
//!
//! One explicit struct carries every setting a run needs; nothing is read
//! from process-wide state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mirror_fs::ConfigStore;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::cancel::CancelMode;
use crate::rules::Rule;
use crate::task::Task;

/// How much of a run the per-task lock covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockScope {
    /// Held while both trees are fetched, released before materializing
    TreeFetch,
    /// Held for the whole run
    #[default]
    FullRun,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `trace`, `debug`, `info`, `warn` or `error`
    pub level: String,
    /// Job log files older than this are pruned
    pub retention_days: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            retention_days: 30,
        }
    }
}

/// Top-level configuration, loaded from TOML, JSON or YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Local mount point of the remote drive; copy and symlink sources live here
    pub source_mount: PathBuf,
    /// Prefix written in front of the path inside `.strm` files
    #[serde(default)]
    pub strm_prefix: String,
    /// Directory for lock files and job logs
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    /// Rules applied to tasks that declare none
    #[serde(default)]
    pub default_rules: Vec<Rule>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub lock_scope: LockScope,
    #[serde(default = "default_lock_timeout_secs")]
    pub lock_timeout_secs: u64,
    #[serde(default)]
    pub cancel_mode: CancelMode,
    /// Report planned actions without touching the mirror
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

fn default_state_dir() -> PathBuf {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join("drive-mirror"))
        .unwrap_or_else(|| PathBuf::from(".mirror"))
}

fn default_lock_timeout_secs() -> u64 {
    30
}

impl MirrorConfig {
    /// Configuration with defaults for everything but the source mount.
    pub fn new(source_mount: impl Into<PathBuf>) -> Self {
        Self {
            source_mount: source_mount.into(),
            strm_prefix: String::new(),
            state_dir: default_state_dir(),
            default_rules: Vec::new(),
            logging: LoggingConfig::default(),
            lock_scope: LockScope::default(),
            lock_timeout_secs: default_lock_timeout_secs(),
            cancel_mode: CancelMode::default(),
            dry_run: false,
            tasks: Vec::new(),
        }
    }

    /// Load from a file; the format follows the extension.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(ConfigStore::new().load(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        Ok(ConfigStore::new().save(path, self)?)
    }

    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    pub fn with_strm_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.strm_prefix = prefix.into();
        self
    }

    /// Lock file guarding runs of `task`.
    pub fn lock_path(&self, task: &str) -> PathBuf {
        self.state_dir.join("locks").join(format!("{}.lock", file_stem(task)))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.state_dir.join("logs")
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_secs(self.lock_timeout_secs)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(u64::from(self.logging.retention_days) * 24 * 60 * 60)
    }
}

/// Task names may contain characters that are not valid in file names.
pub(crate) fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
