//! Runs jobs for registered tasks
//!
//! Trigger timing (cron, webhooks) belongs to the caller; this only turns
//! "run now" into one job per task, tasks in parallel.

use std::sync::Arc;
use std::thread;

use crate::cancel::CancelToken;
use crate::config::MirrorConfig;
use crate::job::{Job, JobContext};
use crate::sink::LogSink;
use crate::task::{Task, TaskStore};
use crate::tree::RemoteSource;
use crate::Result;

pub struct Scheduler<'a> {
    config: &'a MirrorConfig,
    store: &'a TaskStore,
    remote: &'a dyn RemoteSource,
    sink: &'a dyn LogSink,
    cancel: CancelToken,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        config: &'a MirrorConfig,
        store: &'a TaskStore,
        remote: &'a dyn RemoteSource,
        sink: &'a dyn LogSink,
    ) -> Self {
        Self {
            config,
            store,
            remote,
            sink,
            cancel: CancelToken::new(),
        }
    }

    /// Token that cancels every job started by this scheduler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    fn context(&self) -> JobContext<'a> {
        JobContext::new(self.config, self.remote, self.sink).with_cancel(self.cancel.clone())
    }

    /// Run one job for the named task.
    pub fn run_task(&self, name: &str) -> Result<Job> {
        let task = self.store.require(name)?;
        let mut job = Job::new(task.clone());
        job.run(&self.context());
        Ok(job)
    }

    /// Run one job per enabled task and return them in task order.
    ///
    /// Each task owns its own mirror root, so jobs for different tasks run
    /// concurrently without sharing locks.
    pub fn run_enabled(&self) -> Vec<Job> {
        let tasks: Vec<Arc<Task>> = self.store.enabled().cloned().collect();
        thread::scope(|scope| {
            let handles: Vec<_> = tasks
                .iter()
                .map(|task| {
                    let task = Arc::clone(task);
                    let ctx = self.context();
                    scope.spawn(move || {
                        let mut job = Job::new(task);
                        job.run(&ctx);
                        job
                    })
                })
                .collect();

            handles
                .into_iter()
                .zip(&tasks)
                .map(|(handle, task)| {
                    handle.join().unwrap_or_else(|_| {
                        let mut job = Job::new(Arc::clone(task));
                        job.abandon("worker thread panicked", self.sink);
                        job
                    })
                })
                .collect()
        })
    }
}
