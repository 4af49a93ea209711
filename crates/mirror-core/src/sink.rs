//! Structured progress events and the sinks that receive them
//!
//! The engine never owns a delivery channel. It calls [`LogSink::emit`] once
//! per state transition and once per materialize action; what happens to the
//! event afterwards is up to the sink.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::file_stem;
use crate::Result;

/// Severity of a [`LogEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// One progress or diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

impl LogEvent {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Info, message)
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Warn, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(LogLevel::Error, message)
    }

    /// Single-line rendering used in job logs and log files.
    pub fn line(&self) -> String {
        format!(
            "{} {:<5} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S%.3f"),
            self.level,
            self.message
        )
    }
}

/// Receiver of engine events.
///
/// Delivery is fire-and-forget: `emit` returns nothing and a sink that
/// cannot deliver drops the event.
pub trait LogSink: Send + Sync {
    fn emit(&self, event: LogEvent);
}

impl<T: LogSink + ?Sized> LogSink for Arc<T> {
    fn emit(&self, event: LogEvent) {
        (**self).emit(event);
    }
}

impl<T: LogSink + ?Sized> LogSink for &T {
    fn emit(&self, event: LogEvent) {
        (**self).emit(event);
    }
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, event: LogEvent) {
        match event.level {
            LogLevel::Debug => tracing::debug!(target: "mirror::job", "{}", event.message),
            LogLevel::Info => tracing::info!(target: "mirror::job", "{}", event.message),
            LogLevel::Warn => tracing::warn!(target: "mirror::job", "{}", event.message),
            LogLevel::Error => tracing::error!(target: "mirror::job", "{}", event.message),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<LogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, event: LogEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// Appends events to `<dir>/<job-id>.log`
#[derive(Debug)]
pub struct FileSink {
    file: Mutex<File>,
    path: PathBuf,
}

impl FileSink {
    pub fn create(dir: &Path, job_id: &str) -> Result<Self> {
        fs::create_dir_all(dir).map_err(|e| mirror_fs::Error::io(dir, e))?;
        let path = dir.join(format!("{}.log", file_stem(job_id)));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| mirror_fs::Error::io(&path, e))?;
        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn emit(&self, event: LogEvent) {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(file, "{}", event.line()) {
            tracing::warn!(path = %self.path.display(), error = %e, "Dropped log event");
        }
    }
}

/// Delivers every event to each inner sink
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl LogSink for FanoutSink {
    fn emit(&self, event: LogEvent) {
        for sink in &self.sinks {
            sink.emit(event.clone());
        }
    }
}

/// Delete job log files in `dir` last modified more than `retention` before `now`.
///
/// Returns the ids of the jobs whose logs were removed. A missing directory
/// has nothing to prune.
pub fn prune_logs(dir: &Path, retention: Duration, now: SystemTime) -> Result<Vec<String>> {
    let mut removed = Vec::new();
    if !dir.exists() {
        return Ok(removed);
    }

    let cutoff = now.checked_sub(retention).unwrap_or(SystemTime::UNIX_EPOCH);
    let entries = fs::read_dir(dir).map_err(|e| mirror_fs::Error::io(dir, e))?;

    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }
        let metadata = entry.metadata()?;
        if !metadata.is_file() || metadata.modified()? >= cutoff {
            continue;
        }
        fs::remove_file(&path).map_err(|e| mirror_fs::Error::io(&path, e))?;
        if let Some(stem) = path.file_stem() {
            removed.push(stem.to_string_lossy().into_owned());
        }
    }

    removed.sort();
    tracing::info!(dir = %dir.display(), removed = removed.len(), "Pruned job logs");
    Ok(removed)
}
