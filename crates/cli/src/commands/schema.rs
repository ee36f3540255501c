use anyhow::Result;
use shipyard_core::configs::pipeline::pipeline_config_schema;

pub fn execute() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&pipeline_config_schema())?);
    Ok(())
}
