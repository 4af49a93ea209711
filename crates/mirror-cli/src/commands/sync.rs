//! Sync command implementation

use std::sync::Arc;

use colored::Colorize;

use mirror_core::{
    FanoutSink, FileSink, Job, JobContext, JobStatus, TracingSink,
};

use crate::context::Workspace;
use crate::error::{CliError, Result};

/// Reconcile one task and report the finished job.
///
/// The job log streams to `<state_dir>/logs/<job-id>.log` while it runs.
pub fn run_sync(workspace: &Workspace, task_name: &str, dry_run: bool, json: bool) -> Result<()> {
    let store = workspace.store()?;
    let task = store.require(task_name)?;
    let remote = workspace.remote()?;

    let mut config = workspace.config.clone();
    config.dry_run |= dry_run;

    if !json {
        let verb = if config.dry_run { "Previewing" } else { "Syncing" };
        println!("{} {} {}...", "=>".blue().bold(), verb, task.name.cyan());
    }

    let mut job = Job::new(Arc::clone(task));
    let file = FileSink::create(&config.log_dir(), &job.id)?;
    let log_path = file.path().to_path_buf();
    let sink = FanoutSink::new()
        .with(Arc::new(TracingSink))
        .with(Arc::new(file));

    job.run(&JobContext::new(&config, &remote, &sink));

    if json {
        println!("{}", serde_json::to_string_pretty(&job)?);
    } else {
        print_job(&job);
        println!("   Log: {}", log_path.display().to_string().dimmed());
    }

    match job.status {
        JobStatus::Failed => Err(CliError::user(format!("Job {} failed", job.id))),
        _ => Ok(()),
    }
}

/// Print a finished job: status, counts, then any per-item failures.
pub(crate) fn print_job(job: &Job) {
    let status = match job.status {
        JobStatus::Completed if job.result.errors == 0 => "OK".green().bold(),
        JobStatus::Completed => "PARTIAL".yellow().bold(),
        JobStatus::Cancelled => "CANCELLED".yellow().bold(),
        _ => "FAILED".red().bold(),
    };
    println!("{} {}", status, job.summary());

    for failure in &job.failures {
        println!("   {} {}", "!".red(), failure);
    }
    if job.status == JobStatus::Failed
        && let Some(reason) = job.logs.iter().rev().find(|line| line.contains("Job failed"))
    {
        println!("   {} {}", "!".red(), reason);
    }
}
