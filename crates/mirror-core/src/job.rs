//! One reconciliation run of a task
//!
//! A job moves `pending -> running -> completed | failed | cancelled` and
//! never leaves a terminal state. Re-running a task means creating a new job.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use mirror_fs::DirLock;
use serde::Serialize;

use crate::cancel::CancelToken;
use crate::config::{LockScope, MirrorConfig, file_stem};
use crate::diff::diff;
use crate::materialize::{MaterializeReport, Materializer};
use crate::sink::{LogEvent, LogLevel, LogSink};
use crate::task::Task;
use crate::tree::{RemoteSource, build_local_tree, build_remote_tree};
use crate::Result;

/// Lifecycle state of a [`Job`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Aggregate counts for a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JobResult {
    pub materialized: usize,
    pub deleted: usize,
    pub errors: usize,
}

impl From<&MaterializeReport> for JobResult {
    fn from(report: &MaterializeReport) -> Self {
        Self {
            materialized: report.materialized,
            deleted: report.deleted,
            errors: report.errors,
        }
    }
}

/// Collaborators a job needs for one run
pub struct JobContext<'a> {
    pub config: &'a MirrorConfig,
    pub remote: &'a dyn RemoteSource,
    pub sink: &'a dyn LogSink,
    pub cancel: CancelToken,
}

impl<'a> JobContext<'a> {
    pub fn new(config: &'a MirrorConfig, remote: &'a dyn RemoteSource, sink: &'a dyn LogSink) -> Self {
        Self {
            config,
            remote,
            sink,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// A single run of a task, owned and mutated only by itself
#[derive(Debug, Serialize)]
pub struct Job {
    pub id: String,
    pub task_name: String,
    #[serde(skip)]
    task: Arc<Task>,
    pub status: JobStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub logs: Vec<String>,
    pub result: JobResult,
    /// Per-item failures from the last materialize pass
    pub failures: Vec<String>,
}

impl Job {
    pub fn new(task: Arc<Task>) -> Self {
        let id = format!("{}-{}", task.name, Utc::now().format("%Y%m%d%H%M%S%3f"));
        Self {
            id,
            task_name: task.name.clone(),
            task,
            status: JobStatus::Pending,
            start_time: None,
            end_time: None,
            logs: Vec::new(),
            result: JobResult::default(),
            failures: Vec::new(),
        }
    }

    /// Run the reconciliation once and return the terminal status.
    ///
    /// Tree-building and rule errors fail the job; per-item materialize
    /// failures only show up in `result.errors`.
    pub fn run(&mut self, ctx: &JobContext<'_>) -> JobStatus {
        if self.status != JobStatus::Pending {
            tracing::warn!(job = %self.id, status = %self.status, "Job already ran");
            return self.status;
        }

        let recorder = Recorder::new(ctx.sink);
        self.status = JobStatus::Running;
        self.start_time = Some(Utc::now());
        recorder.emit(LogEvent::info(format!(
            "Job {} started: {} -> {}",
            self.id,
            self.task.source_path,
            self.task.target_path.display()
        )));

        let outcome = self.execute(ctx, &recorder);
        self.end_time = Some(Utc::now());

        match outcome {
            Ok(report) => {
                self.result = JobResult::from(&report);
                self.failures = report
                    .failures
                    .iter()
                    .map(|f| format!("{} {}: {}", f.kind, f.path, f.message))
                    .collect();
                self.status = if report.cancelled {
                    JobStatus::Cancelled
                } else {
                    JobStatus::Completed
                };
                recorder.emit(LogEvent::info(self.summary()));
            }
            Err(e) => {
                self.status = JobStatus::Failed;
                recorder.emit(LogEvent::error(format!("Job failed: {}", e)));
                recorder.emit(LogEvent::info(self.summary()));
            }
        }

        self.logs.extend(recorder.into_lines());
        tracing::info!(job = %self.id, status = %self.status, "Job finished");
        self.status
    }

    fn execute(&self, ctx: &JobContext<'_>, sink: &dyn LogSink) -> Result<MaterializeReport> {
        let resolver = self.task.resolver()?;

        let mut lock = Some(DirLock::acquire(
            ctx.config.lock_path(&self.task.name),
            ctx.config.lock_timeout(),
        )?);

        let source = build_remote_tree(ctx.remote, &self.task.source_path)?;
        let target = build_local_tree(&self.task.target_path)?;
        if ctx.config.lock_scope == LockScope::TreeFetch {
            lock.take();
        }

        let plan = diff(&source, &target, &resolver);
        sink.emit(LogEvent::info(format!(
            "Remote has {} entries, mirror has {}: {} to add, {} to delete",
            source.len(),
            target.len(),
            plan.added.len(),
            plan.deleted.len()
        )));

        let report = Materializer::new(&resolver, ctx.config, sink)
            .with_cancel(ctx.cancel.clone(), ctx.config.cancel_mode)
            .apply(&plan, &self.task.target_path);

        drop(lock);
        Ok(report)
    }

    /// Mark a job that never got to run as failed.
    pub(crate) fn abandon(&mut self, reason: &str, sink: &dyn LogSink) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Failed;
        self.end_time = Some(Utc::now());
        let event = LogEvent::error(format!("Job failed: {}", reason));
        self.logs.push(event.line());
        sink.emit(event);
    }

    /// Write the collected log lines to `<dir>/<job-id>.log`.
    pub fn write_log(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.log", file_stem(&self.id)));
        let mut content = self.logs.join("\n");
        content.push('\n');
        mirror_fs::io::write_text(&path, &content)?;
        Ok(path)
    }

    /// Human-readable one-line outcome.
    pub fn summary(&self) -> String {
        let elapsed = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                format!(" in {:.3}s", (end - start).num_milliseconds() as f64 / 1000.0)
            }
            _ => String::new(),
        };
        format!(
            "Job {} {}{}: {} materialized, {} deleted, {} errors",
            self.id,
            self.status,
            elapsed,
            self.result.materialized,
            self.result.deleted,
            self.result.errors
        )
    }
}

/// Forwards to the caller's sink and keeps a copy for the job log
struct Recorder<'a> {
    inner: &'a dyn LogSink,
    lines: Mutex<Vec<String>>,
}

impl<'a> Recorder<'a> {
    fn new(inner: &'a dyn LogSink) -> Self {
        Self {
            inner,
            lines: Mutex::new(Vec::new()),
        }
    }

    fn into_lines(self) -> Vec<String> {
        self.lines.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LogSink for Recorder<'_> {
    fn emit(&self, event: LogEvent) {
        if event.level >= LogLevel::Info {
            self.lines
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event.line());
        }
        self.inner.emit(event);
    }
}
