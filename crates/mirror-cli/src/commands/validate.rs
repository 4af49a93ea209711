//! Validate command implementation

use colored::Colorize;

use crate::context::Workspace;
use crate::error::Result;

/// Check that every task registers and print what would run.
pub fn run_validate(workspace: &Workspace) -> Result<()> {
    println!("{} Validating configuration...", "=>".blue().bold());

    let store = workspace.store()?;
    let config = &workspace.config;

    if !config.source_mount.is_dir() {
        println!(
            "{} Source mount {} is not a directory; copy and symlink rules will fail",
            "WARN".yellow().bold(),
            config.source_mount.display()
        );
    }

    if store.all().is_empty() {
        println!("{} No tasks configured.", "WARN".yellow().bold());
        return Ok(());
    }

    for task in store.all() {
        let state = if task.enabled {
            "enabled".green()
        } else {
            "disabled".dimmed()
        };
        println!(
            "   {} {} ({}): {} -> {} [{} rules]",
            "+".green(),
            task.name.cyan(),
            state,
            task.source_path,
            task.target_path.display(),
            task.rules.len()
        );
    }

    println!();
    println!(
        "{} {} task(s) valid.",
        "OK".green().bold(),
        store.all().len()
    );
    Ok(())
}
