//! Filesystem primitives for the drive mirror
//!
//! Provides slash-normalized relative paths, atomic locked writes,
//! format-agnostic config loading and advisory directory locks.

pub mod config;
pub mod error;
pub mod io;
pub mod lock;
pub mod path;

pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use lock::DirLock;
pub use path::NormalizedPath;
