//! Diff command implementation
//!
//! Previews what a sync would change without touching the mirror.

use colored::Colorize;
use serde_json::json;

use mirror_core::{Method, build_local_tree, build_remote_tree, diff};

use crate::context::Workspace;
use crate::error::Result;

/// Run the diff command
pub fn run_diff(workspace: &Workspace, task_name: &str, json: bool) -> Result<()> {
    let store = workspace.store()?;
    let task = store.require(task_name)?;
    let remote = workspace.remote()?;
    let resolver = task.resolver()?;

    let source = build_remote_tree(&remote, &task.source_path)?;
    let target = build_local_tree(&task.target_path)?;
    let plan = diff(&source, &target, &resolver);

    if json {
        let json_output = json!({
            "task": task.name,
            "has_changes": !plan.is_empty(),
            "added": plan.added.iter()
                .map(|path| json!({
                    "path": path,
                    "method": resolver.resolve(path),
                }))
                .collect::<Vec<_>>(),
            "deleted": plan.deleted,
        });
        println!("{}", serde_json::to_string_pretty(&json_output)?);
        return Ok(());
    }

    if plan.is_empty() {
        println!(
            "{} No changes needed. {} is in sync.",
            "OK".green().bold(),
            task.name.cyan()
        );
        return Ok(());
    }

    println!(
        "{} {} ({} -> {})",
        "Diff".blue().bold(),
        task.name.yellow(),
        task.source_path,
        task.target_path.display()
    );
    println!();
    for path in &plan.added {
        let method = resolver.resolve(path);
        let shown = match method {
            Method::Strm => format!("{}.strm", path),
            _ => path.to_string(),
        };
        println!("  {} {} ({})", "+".green(), shown.green(), method.as_str().dimmed());
    }
    for path in &plan.deleted {
        println!("  {} {}", "-".red(), path.as_str().red());
    }
    println!();
    println!(
        "{} to add, {} to delete. Run {} to apply.",
        plan.added.len(),
        plan.deleted.len(),
        format!("mirror sync {}", task.name).cyan()
    );
    Ok(())
}
