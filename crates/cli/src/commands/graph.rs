use anyhow::Result;
use colored::*;
use shipyard_core::pipeline_manager::PipelineManager;

pub fn execute(manager: &PipelineManager) -> Result<()> {
    println!("{}", "Task Dependency Graph:".bold().underline());

    let result = manager
        .graph()
        .map_err(|e| anyhow::anyhow!("Failed to get dependency graph: {}", e))?;

    if !result.cycles.is_empty() {
        let cycles_description = result
            .cycles
            .iter()
            .map(|cycle| {
                let mut path = cycle.clone();
                if let Some(first) = path.first().cloned() {
                    path.push(first);
                }
                path.join(" -> ")
            })
            .collect::<Vec<_>>()
            .join("; ");

        println!(
            "{} {}",
            "Warning:".yellow().bold(),
            format!("Circular dependencies detected: {}", cycles_description).yellow()
        );
    }

    for task in &result.tasks {
        println!("{} {}", task.id.blue().bold(), format!("[{}]", task.kind).dimmed());

        if !task.depends_on.is_empty() {
            println!("  {} {}", "depends on:".dimmed(), task.depends_on.join(", "));
        } else {
            println!("  {}", "no dependencies".dimmed());
        }
        if !task.finalized_by.is_empty() {
            println!("  {} {}", "finalized by:".dimmed(), task.finalized_by.join(", "));
        }
        if !task.do_last.is_empty() {
            println!("  {} {}", "then:".dimmed(), task.do_last.join("; "));
        }
        println!();
    }

    Ok(())
}
