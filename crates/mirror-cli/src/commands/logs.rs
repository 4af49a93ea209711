//! Log retention command

use std::time::SystemTime;

use colored::Colorize;

use mirror_core::prune_logs;

use crate::context::Workspace;
use crate::error::Result;

/// Delete job logs older than `logging.retention_days`.
pub fn run_prune_logs(workspace: &Workspace) -> Result<()> {
    let config = &workspace.config;
    let removed = prune_logs(&config.log_dir(), config.retention(), SystemTime::now())?;

    if removed.is_empty() {
        println!(
            "{} No logs older than {} days.",
            "OK".green().bold(),
            config.logging.retention_days
        );
        return Ok(());
    }

    for id in &removed {
        println!("   {} {}", "-".red(), id);
    }
    println!("{} Removed {} log(s).", "OK".green().bold(), removed.len());
    Ok(())
}
