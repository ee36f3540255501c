use anyhow::Result;
use colored::*;
use shipyard_core::execution::TaskRole;
use shipyard_core::pipeline_manager::PipelineManager;

pub fn execute(manager: &PipelineManager, target: Option<&str>) -> Result<()> {
    let target = manager.resolve_target(target)?;
    println!("{} {}", "Execution plan for".bold(), target.cyan());

    let plan = manager
        .plan(&target)
        .map_err(|e| anyhow::anyhow!("Failed to get execution plan: {}", e))?;

    if !plan.active {
        println!(
            "{}",
            "(inactive: a run would skip every task below)".yellow()
        );
    }

    println!("\n{}:", "Execution order".bold());
    for (i, (id, role)) in plan.order.iter().enumerate() {
        match role {
            TaskRole::Target => println!("  {}. {}", i + 1, id),
            TaskRole::Finalizer => println!("  {}. {} {}", i + 1, id, "[finalizer]".dimmed()),
        }
    }

    Ok(())
}
