//! Command implementations for mirror-cli

pub mod diff;
pub mod logs;
pub mod run;
pub mod sync;
pub mod validate;

pub use diff::run_diff;
pub use logs::run_prune_logs;
pub use run::run_all;
pub use sync::run_sync;
pub use validate::run_validate;
