//! Applies a diff to the local mirror
//!
//! Additions run before deletions. Every action is isolated: a failure is
//! recorded in the report and the batch moves on to the next item.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use mirror_fs::path::entry_exists;
use mirror_fs::{NormalizedPath, RobustnessConfig};
use serde::{Deserialize, Serialize};

use crate::cancel::{CancelMode, CancelToken};
use crate::config::MirrorConfig;
use crate::diff::DiffResult;
use crate::error::{Error, MaterializeKind};
use crate::rules::{Method, RuleResolver, STRM_SUFFIX};
use crate::sink::{LogEvent, LogLevel, LogSink};

/// A single action that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFailure {
    pub kind: MaterializeKind,
    pub path: String,
    pub message: String,
}

/// Outcome of one [`Materializer::apply`] call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterializeReport {
    /// Items written (or, in a dry run, planned)
    pub materialized: usize,
    /// Mirror entries removed
    pub deleted: usize,
    /// Items that failed
    pub errors: usize,
    pub failures: Vec<ItemFailure>,
    /// Human-readable description of each action taken
    pub actions: Vec<String>,
    /// The run stopped early on a cancellation request
    pub cancelled: bool,
}

impl MaterializeReport {
    fn record_failure(&mut self, error: &Error) {
        self.errors += 1;
        if let Error::Materialize { kind, path, source } = error {
            self.failures.push(ItemFailure {
                kind: *kind,
                path: path.clone(),
                message: source.to_string(),
            });
        }
    }
}

/// Writes mirrored entries under a mount root
pub struct Materializer<'a> {
    resolver: &'a RuleResolver,
    source_root: PathBuf,
    strm_prefix: String,
    dry_run: bool,
    robustness: RobustnessConfig,
    sink: &'a dyn LogSink,
    cancel: CancelToken,
    cancel_mode: CancelMode,
}

impl<'a> Materializer<'a> {
    pub fn new(resolver: &'a RuleResolver, config: &MirrorConfig, sink: &'a dyn LogSink) -> Self {
        Self {
            resolver,
            source_root: absolute(&config.source_mount),
            strm_prefix: config.strm_prefix.clone(),
            dry_run: config.dry_run,
            robustness: RobustnessConfig::default(),
            sink,
            cancel: CancelToken::new(),
            cancel_mode: config.cancel_mode,
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken, mode: CancelMode) -> Self {
        self.cancel = cancel;
        self.cancel_mode = mode;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply `diff` under `mount_root`: every addition, then every deletion.
    pub fn apply(&self, diff: &DiffResult, mount_root: &Path) -> MaterializeReport {
        let mut report = MaterializeReport::default();

        for path in &diff.added {
            if self.cancel_mode == CancelMode::Immediate && self.cancel.is_cancelled() {
                return self.stop(report);
            }
            let method = self.resolver.resolve(path);
            match self.add(path, method, mount_root) {
                Ok(Some(action)) => {
                    report.materialized += 1;
                    self.emit(LogLevel::Info, &action);
                    report.actions.push(action);
                }
                Ok(None) => {}
                Err(e) => self.fail(&mut report, &e),
            }
        }

        for path in &diff.deleted {
            if self.cancel.is_cancelled() {
                return self.stop(report);
            }
            match self.delete(path, mount_root) {
                Ok(Some(action)) => {
                    report.deleted += 1;
                    self.emit(LogLevel::Info, &action);
                    report.actions.push(action);
                }
                Ok(None) => {}
                Err(e) => self.fail(&mut report, &e),
            }
        }

        report
    }

    fn add(&self, path: &NormalizedPath, method: Method, mount_root: &Path) -> Result<Option<String>, Error> {
        match method {
            Method::Ignore => Ok(None),
            Method::Copy => self.copy(path, mount_root).map(Some),
            Method::Symlink => self.symlink(path, mount_root).map(Some),
            Method::Strm => self.strm(path, mount_root).map(Some),
            Method::Virtual => self.placeholder(path, mount_root).map(Some),
        }
    }

    fn copy(&self, path: &NormalizedPath, mount_root: &Path) -> Result<String, Error> {
        let source = path.under(&self.source_root);
        let target = path.under(mount_root);
        if self.dry_run {
            return Ok(format!("[dry-run] Would copy {}", path));
        }
        ensure_parent(&target, MaterializeKind::Copy, path)?;
        let bytes = fs::copy(&source, &target)
            .map_err(|e| Error::materialize(MaterializeKind::Copy, path.as_str(), e))?;
        tracing::debug!(path = %path, bytes, "Copied");
        Ok(format!("Copied {} ({} bytes)", path, bytes))
    }

    fn symlink(&self, path: &NormalizedPath, mount_root: &Path) -> Result<String, Error> {
        let source = path.under(&self.source_root);
        let target = path.under(mount_root);
        if self.dry_run {
            return Ok(format!("[dry-run] Would link {}", path));
        }
        if entry_exists(&target) {
            return Err(Error::materialize(
                MaterializeKind::Symlink,
                path.as_str(),
                io::Error::new(io::ErrorKind::AlreadyExists, "mirrored path already exists"),
            ));
        }
        ensure_parent(&target, MaterializeKind::Symlink, path)?;
        create_symlink(&source, &target)
            .map_err(|e| Error::materialize(MaterializeKind::Symlink, path.as_str(), e))?;
        Ok(format!("Linked {} -> {}", path, source.display()))
    }

    fn strm(&self, path: &NormalizedPath, mount_root: &Path) -> Result<String, Error> {
        let mirrored = path.with_suffix(STRM_SUFFIX);
        if self.dry_run {
            return Ok(format!("[dry-run] Would write {}", mirrored));
        }
        let target = mirrored.under(mount_root);
        let content = format!("{}{}", self.strm_prefix, path);
        mirror_fs::io::write_atomic(&target, content.as_bytes(), self.robustness)
            .map_err(|e| Error::materialize(MaterializeKind::Strm, mirrored.as_str(), into_io(e)))?;
        Ok(format!("Wrote {}", mirrored))
    }

    fn placeholder(&self, path: &NormalizedPath, mount_root: &Path) -> Result<String, Error> {
        let target = path.under(mount_root);
        if self.dry_run {
            return Ok(format!("[dry-run] Would create placeholder {}", path));
        }
        ensure_parent(&target, MaterializeKind::Virtual, path)?;
        File::create(&target)
            .map_err(|e| Error::materialize(MaterializeKind::Virtual, path.as_str(), e))?;
        Ok(format!("Created placeholder {}", path))
    }

    fn delete(&self, path: &NormalizedPath, mount_root: &Path) -> Result<Option<String>, Error> {
        let target = path.under(mount_root);
        let parent_present = target.parent().is_none_or(Path::exists);
        if !parent_present || !entry_exists(&target) {
            tracing::debug!(path = %path, "Already absent, nothing to delete");
            return Ok(None);
        }
        if self.dry_run {
            return Ok(Some(format!("[dry-run] Would delete {}", path)));
        }
        fs::remove_file(&target)
            .map_err(|e| Error::materialize(MaterializeKind::Delete, path.as_str(), e))?;
        Ok(Some(format!("Deleted {}", path)))
    }

    fn fail(&self, report: &mut MaterializeReport, error: &Error) {
        tracing::warn!(error = %error, "Materialize action failed");
        self.emit(LogLevel::Error, &error.to_string());
        report.record_failure(error);
    }

    fn stop(&self, mut report: MaterializeReport) -> MaterializeReport {
        self.emit(LogLevel::Warn, "Cancellation requested, remaining actions skipped");
        report.cancelled = true;
        report
    }

    fn emit(&self, level: LogLevel, message: &str) {
        self.sink.emit(LogEvent::new(level, message));
    }
}

fn ensure_parent(target: &Path, kind: MaterializeKind, path: &NormalizedPath) -> Result<(), Error> {
    match target.parent() {
        Some(parent) => fs::create_dir_all(parent)
            .map_err(|e| Error::materialize(kind, path.as_str(), e)),
        None => Ok(()),
    }
}

#[cfg(unix)]
fn create_symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, target)
}

#[cfg(windows)]
fn create_symlink(source: &Path, target: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, target)
}

#[cfg(not(any(unix, windows)))]
fn create_symlink(_source: &Path, _target: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported on this platform"))
}

/// Symlink targets must not depend on the working directory of the run.
fn absolute(path: &Path) -> PathBuf {
    match NormalizedPath::new(path).canonicalize() {
        Ok(resolved) => resolved,
        Err(_) => std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf()),
    }
}

fn into_io(error: mirror_fs::Error) -> io::Error {
    match error {
        mirror_fs::Error::Io { source, .. } => source,
        other => io::Error::other(other.to_string()),
    }
}
