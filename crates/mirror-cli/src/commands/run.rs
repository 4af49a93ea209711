//! Run command implementation
//!
//! One pass over every enabled task, optionally repeated on an interval.

use std::thread;
use std::time::{Duration, SystemTime};

use colored::Colorize;

use mirror_core::{JobStatus, Scheduler, TracingSink, prune_logs};

use super::sync::print_job;
use crate::context::Workspace;
use crate::error::{CliError, Result};

/// Run every enabled task, then sleep `interval` seconds and repeat.
///
/// Without an interval this is a single pass that fails if any job failed.
pub fn run_all(workspace: &Workspace, interval: Option<u64>) -> Result<()> {
    let store = workspace.store()?;
    let remote = workspace.remote()?;
    let config = &workspace.config;
    let sink = TracingSink;
    let scheduler = Scheduler::new(config, &store, &remote, &sink);

    loop {
        println!("{} Running enabled tasks...", "=>".blue().bold());
        let jobs = scheduler.run_enabled();
        if jobs.is_empty() {
            println!("{} No enabled tasks.", "WARN".yellow().bold());
        }

        for job in &jobs {
            print_job(job);
            if let Err(e) = job.write_log(&config.log_dir()) {
                tracing::warn!(job = %job.id, error = %e, "Could not write job log");
            }
        }

        if let Err(e) = prune_logs(&config.log_dir(), config.retention(), SystemTime::now()) {
            tracing::warn!(error = %e, "Log pruning failed");
        }

        let failed = jobs.iter().filter(|job| job.status == JobStatus::Failed).count();
        match interval {
            Some(seconds) => {
                tracing::info!(seconds, failed, "Pass finished, waiting for the next one");
                thread::sleep(Duration::from_secs(seconds));
            }
            None if failed > 0 => {
                return Err(CliError::user(format!("{} job(s) failed", failed)));
            }
            None => return Ok(()),
        }
    }
}
