//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Drive Mirror - Keep a local mirror of a remote drive in sync
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (TOML, JSON or YAML)
    #[arg(short, long, global = true, env = "MIRROR_CONFIG", default_value = "mirror.toml")]
    pub config: PathBuf,

    /// Remote listing export: a JSON-lines file, or a directory of them named per root
    #[arg(short, long, global = true, env = "MIRROR_LISTING")]
    pub listing: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Check the configuration and every task's rules
    Validate,

    /// Preview what a sync of one task would change
    Diff {
        /// Task name
        task: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Reconcile one task now
    Sync {
        /// Task name
        task: String,

        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output the finished job as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every enabled task
    ///
    /// Examples:
    ///   mirror run                 # One pass over all enabled tasks
    ///   mirror run --interval 600  # Repeat every ten minutes
    Run {
        /// Seconds to wait between passes; runs once when omitted
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Delete job logs older than the configured retention
    PruneLogs,
}
