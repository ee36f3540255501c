use anyhow::Result;
use colored::*;
use shipyard_core::pipeline_manager::PipelineManager;

pub fn execute(manager: &PipelineManager) -> Result<()> {
    let result = manager.list_tasks()?;

    let heading = match &result.name {
        Some(name) => format!("Tasks of {}", name),
        None => "Tasks".to_string(),
    };
    println!("{}", heading.bold().underline());
    println!("  {}", result.config_path.display().to_string().dimmed());

    if result.tasks.is_empty() {
        println!("  {}", "No tasks found".dimmed());
        return Ok(());
    }

    for task in &result.tasks {
        let kind = format!("[{}]", task.kind);
        match &task.description {
            Some(description) => println!(
                "{} {} {}",
                task.id.blue().bold(),
                kind.green(),
                description.dimmed()
            ),
            None => println!("{} {}", task.id.blue().bold(), kind.green()),
        }
    }

    Ok(())
}
