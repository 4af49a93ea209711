//! Task descriptors and the validated task store

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::MirrorConfig;
use crate::error::ConfigurationError;
use crate::rules::{Rule, RuleResolver};

/// One remote directory mirrored into one local root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task name
    pub name: String,
    /// Remote directory to list
    pub source_path: String,
    /// Local mirror root
    pub target_path: PathBuf,
    /// Ordered rule table; the first rule claiming an extension wins
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

impl Task {
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<String>,
        target_path: impl Into<PathBuf>,
        rules: Vec<Rule>,
    ) -> Self {
        Self {
            name: name.into(),
            source_path: source_path.into(),
            target_path: target_path.into(),
            rules,
            enabled: true,
        }
    }

    /// Build the rule resolver, validating the rule table.
    pub fn resolver(&self) -> Result<RuleResolver, ConfigurationError> {
        RuleResolver::new(&self.rules)
    }
}

/// Registered tasks, validated once at load
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    tasks: Vec<Arc<Task>>,
}

impl TaskStore {
    /// Register `tasks`, filling empty rule tables from `default_rules`.
    ///
    /// # Errors
    ///
    /// Rejects duplicate task names and conflicting extension mappings.
    pub fn new(tasks: Vec<Task>, default_rules: &[Rule]) -> Result<Self, ConfigurationError> {
        let mut store = Self::default();
        for task in tasks {
            store.register(task, default_rules)?;
        }
        Ok(store)
    }

    /// Register the tasks declared in a configuration file.
    pub fn from_config(config: &MirrorConfig) -> Result<Self, ConfigurationError> {
        Self::new(config.tasks.clone(), &config.default_rules)
    }

    /// Add one task to the store.
    pub fn register(&mut self, mut task: Task, default_rules: &[Rule]) -> Result<Arc<Task>, ConfigurationError> {
        if self.get(&task.name).is_some() {
            return Err(ConfigurationError::DuplicateTask { name: task.name });
        }
        if task.rules.is_empty() {
            task.rules = default_rules.to_vec();
        }
        RuleResolver::validate(&task.rules)?;

        let task = Arc::new(task);
        self.tasks.push(Arc::clone(&task));
        Ok(task)
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Task>> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Look up a task, failing with `UnknownTask`.
    pub fn require(&self, name: &str) -> Result<&Arc<Task>, ConfigurationError> {
        self.get(name).ok_or_else(|| ConfigurationError::UnknownTask {
            name: name.to_string(),
        })
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Arc<Task>> {
        self.tasks.iter().filter(|t| t.enabled)
    }

    pub fn all(&self) -> &[Arc<Task>] {
        &self.tasks
    }
}
