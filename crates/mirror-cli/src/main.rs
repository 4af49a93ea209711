//! Drive Mirror CLI
//!
//! Reconciles local mirrors of a remote drive from the command line.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands};
use context::Workspace;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("{} Drive Mirror CLI", "mirror".green().bold());
        println!();
        println!("Run {} for available commands.", "mirror --help".cyan());
        return Ok(());
    };

    let workspace = Workspace::load(&cli.config, cli.listing)?;
    init_tracing(cli.verbose, &workspace.config.logging.level);

    execute_command(command, &workspace)
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(verbose: bool, configured: &str) {
    let level = if verbose { "debug" } else { configured };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("{}: tracing subscriber already set", "warning".yellow());
    }
    tracing::debug!("Verbose mode enabled");
}

fn execute_command(cmd: Commands, workspace: &Workspace) -> Result<()> {
    match cmd {
        Commands::Validate => commands::run_validate(workspace),
        Commands::Diff { task, json } => commands::run_diff(workspace, &task, json),
        Commands::Sync {
            task,
            dry_run,
            json,
        } => commands::run_sync(workspace, &task, dry_run, json),
        Commands::Run { interval } => commands::run_all(workspace, interval),
        Commands::PruneLogs => commands::run_prune_logs(workspace),
    }
}
