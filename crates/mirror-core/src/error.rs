//! Error types for mirror-core

use std::path::PathBuf;

use crate::rules::Method;

/// Result type for mirror-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Problems found while registering tasks, before any run starts
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// One extension is claimed by two rules with different methods
    #[error("Extension {extension} is mapped to both {first} and {second}")]
    DuplicateExtensionMapping {
        extension: String,
        first: Method,
        second: Method,
    },

    /// An extension entry that cannot match any file name
    #[error("Rule {rule} lists invalid extension {extension:?}")]
    InvalidExtension { rule: String, extension: String },

    /// Two tasks share a name
    #[error("Task {name} is defined more than once")]
    DuplicateTask { name: String },

    /// A task name that is not registered
    #[error("Unknown task: {name}")]
    UnknownTask { name: String },
}

/// The side effect that failed for a single mirrored item
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializeKind {
    Copy,
    Symlink,
    Strm,
    Virtual,
    Delete,
}

impl std::fmt::Display for MaterializeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Copy => "copy",
            Self::Symlink => "symlink",
            Self::Strm => "strm",
            Self::Virtual => "virtual",
            Self::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Errors that can occur in mirror-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid task or rule definitions
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The remote listing could not be fetched or broke mid-stream
    #[error("Remote listing failed: {message}")]
    RemoteListing { message: String },

    /// A remote entry arrived before its parent
    #[error("Remote entry {name} ({key}) arrived before its parent {parent_key}")]
    OutOfOrderEntry {
        key: String,
        parent_key: String,
        name: String,
    },

    /// The local mirror could not be walked
    #[error("Failed to walk local mirror at {path}: {source}")]
    LocalWalk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single materialize action failed
    #[error("{kind} failed for {path}: {source}")]
    Materialize {
        kind: MaterializeKind,
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Transparent wrappers for underlying crate errors
    /// Filesystem error from mirror-fs
    #[error(transparent)]
    Fs(#[from] mirror_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteListing {
            message: message.into(),
        }
    }

    pub fn materialize(kind: MaterializeKind, path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Materialize {
            kind,
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts a whole run.
    ///
    /// Per-item materialize failures are counted and the batch continues;
    /// everything else fails the job.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Materialize { .. })
    }
}
