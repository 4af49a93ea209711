//! Tree reconciliation and materialization engine for the drive mirror
//!
//! Mirrors a remote directory listing onto a local root, materializing each
//! file according to a per-extension rule:
//!
//! - **Rules**: ordered extension tables resolved to a [`Method`]
//! - **Trees**: path sets built from the remote export stream and the local mirror
//! - **Diff**: method-aware additions and deletions between the two trees
//! - **Materializer**: copy, symlink, `.strm` pointer, placeholder and delete actions
//! - **Job**: one run of a task with lifecycle state, timing and logs
//!
//! # Architecture
//!
//! ```text
//!          Scheduler
//!              |
//!             Job ---------------> LogSink
//!        /     |      \
//!  RemoteSource  local walk  RuleResolver
//!        \     |      /
//!            diff
//!              |
//!        Materializer
//!              |
//!          mirror-fs
//! ```

pub mod cancel;
pub mod config;
pub mod diff;
pub mod error;
pub mod job;
pub mod materialize;
pub mod rules;
pub mod scheduler;
pub mod sink;
pub mod task;
pub mod tree;

pub use cancel::{CancelMode, CancelToken};
pub use config::{LockScope, LoggingConfig, MirrorConfig};
pub use diff::{DiffResult, diff};
pub use error::{ConfigurationError, Error, MaterializeKind, Result};
pub use job::{Job, JobContext, JobResult, JobStatus};
pub use materialize::{ItemFailure, MaterializeReport, Materializer};
pub use rules::{Method, Rule, RuleResolver, STRM_SUFFIX};
pub use scheduler::Scheduler;
pub use sink::{FanoutSink, FileSink, LogEvent, LogLevel, LogSink, MemorySink, TracingSink, prune_logs};
pub use task::{Task, TaskStore};
pub use tree::{
    EntryStream, ExportFileSource, PathSet, RemoteEntry, RemoteSource, build_local_tree,
    build_remote_tree,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_errors_are_fatal_and_item_errors_are_not() {
        let config = Error::from(ConfigurationError::UnknownTask {
            name: "movies".into(),
        });
        let item = Error::materialize(
            MaterializeKind::Copy,
            "a.mp4",
            std::io::Error::other("disk full"),
        );

        assert!(config.is_fatal());
        assert!(!item.is_fatal());
        assert_eq!(item.to_string(), "copy failed for a.mp4: disk full");
    }
}
