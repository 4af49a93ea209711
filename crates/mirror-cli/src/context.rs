//! Loaded configuration shared by every command

use std::path::{Path, PathBuf};

use mirror_core::{ExportFileSource, MirrorConfig, TaskStore};

use crate::error::{CliError, Result};

pub struct Workspace {
    pub config: MirrorConfig,
    listing: Option<PathBuf>,
}

impl Workspace {
    /// Load the configuration file, failing with a hint if it is missing.
    pub fn load(config_path: &Path, listing: Option<PathBuf>) -> Result<Self> {
        if !config_path.exists() {
            return Err(CliError::user(format!(
                "Configuration file not found: {} (pass --config or set MIRROR_CONFIG)",
                config_path.display()
            )));
        }
        let config = MirrorConfig::load(config_path)?;
        tracing::debug!(path = %config_path.display(), tasks = config.tasks.len(), "Loaded configuration");
        Ok(Self { config, listing })
    }

    /// Register every configured task, validating its rules.
    pub fn store(&self) -> Result<TaskStore> {
        Ok(TaskStore::from_config(&self.config)?)
    }

    /// The remote listing the trees are built from.
    pub fn remote(&self) -> Result<ExportFileSource> {
        let listing = self.listing.as_ref().ok_or_else(|| {
            CliError::user("No remote listing given (pass --listing or set MIRROR_LISTING)")
        })?;
        Ok(ExportFileSource::new(listing))
    }
}
