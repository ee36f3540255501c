use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use shipyard_core::activation::parse_property_assignment;
use shipyard_core::pipeline_manager::{PipelineManager, PipelineManagerConfig};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

/// Shipyard - A conditional build-pipeline orchestrator
#[derive(Parser)]
#[command(name = "shipyard")]
#[command(about = "Run conditional build pipelines with dependency and finalizer wiring")]
#[command(version)]
struct Cli {
    /// Project directory that relative paths resolve against
    #[arg(short = 'C', long, default_value = ".")]
    project_dir: PathBuf,

    /// Pipeline file (defaults to <project-dir>/shipyard.yml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set a property, e.g. -P enable-docker=true
    #[arg(short = 'P', long = "property", value_parser = parse_property, global = true)]
    properties: Vec<(String, String)>,

    /// Log at debug level unless SHIPYARD_LOG is set
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the tasks of the pipeline
    List,
    /// Show the execution order for a target without running it
    Plan {
        /// Task to plan (defaults to the pipeline's defaultTarget)
        target: Option<String>,
    },
    /// Run a target and everything it depends on
    Run {
        /// Task to run (defaults to the pipeline's defaultTarget)
        target: Option<String>,
        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the task dependency graph
    Graph,
    /// Print the JSON schema of the pipeline file
    Schema,
}

fn parse_property(assignment: &str) -> Result<(String, String), String> {
    parse_property_assignment(assignment).map_err(|e| e.to_string())
}

fn init_logging(verbose: u8) {
    let default_directive = if verbose > 0 { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SHIPYARD_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Commands::Schema = cli.command {
        return commands::schema::execute();
    }

    // Flags are read once, here, before any task is registered
    let manager = PipelineManager::new(PipelineManagerConfig {
        project_dir: cli.project_dir,
        config_path: cli.config,
        properties: cli.properties.into_iter().collect::<HashMap<_, _>>(),
    })
    .map_err(|e| anyhow::anyhow!("Failed to load pipeline: {}", e))?;
    debug!(config = %manager.config_path.display(), "Loaded pipeline");

    // Execute command (CLI layer only handles presentation)
    match cli.command {
        Commands::List => commands::list::execute(&manager),
        Commands::Plan { target } => commands::plan::execute(&manager, target.as_deref()),
        Commands::Run { target, json } => commands::run::execute(&manager, target.as_deref(), json),
        Commands::Graph => commands::graph::execute(&manager),
        Commands::Schema => commands::schema::execute(),
    }
}
