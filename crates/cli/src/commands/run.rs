use anyhow::Result;
use colored::*;
use shipyard_core::pipeline_manager::PipelineManager;
use shipyard_task_protocol::TaskStatus;

pub fn execute(manager: &PipelineManager, target: Option<&str>, json: bool) -> Result<()> {
    let target = manager.resolve_target(target)?;
    if !json {
        println!("{} {}", "Running task".bold(), target.cyan());
        println!();
    }

    let report = manager
        .run(&target)
        .map_err(|e| anyhow::anyhow!("Failed to run task: {}", e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report.to_json())?);
    } else if !report.active {
        println!(
            "{} {}",
            "Skipped:".yellow().bold(),
            "activation flags are not set, nothing was executed".yellow()
        );
        return Ok(());
    } else {
        println!();
        for task in &report.tasks {
            let marker = match task.status {
                TaskStatus::Succeeded => "✓".green().bold(),
                TaskStatus::Failed => "✗".red().bold(),
                _ => "-".dimmed(),
            };
            println!("  {} {} {}", marker, task.id, format!("({})", task.status).dimmed());
        }
    }

    if !report.success() {
        let failed = report
            .failures
            .iter()
            .map(|f| format!("{}: {}", f.task, f.error))
            .collect::<Vec<_>>()
            .join("; ");
        anyhow::bail!("Pipeline failed: {}", failed);
    }

    if !json {
        println!();
        println!(
            "{} {}",
            "✓".green().bold(),
            "All tasks completed successfully!".green().bold()
        );
    }

    Ok(())
}
