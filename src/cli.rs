use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskbind::config::HumanDuration;

#[derive(Parser, Debug)]
#[command(name = "taskbind")]
#[command(about = "Task binding registry and dispatcher", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the effective configuration as TOML
    Config(ConfigArgs),
    /// Register the sample order handlers and dispatch to them
    Demo(DemoArgs),
}

#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Configuration file (defaults to $TASKBIND_CONFIG or config/taskbind.toml)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DemoArgs {
    /// Configuration file (defaults to $TASKBIND_CONFIG or config/taskbind.toml)
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Per-unit deadline for the slow export fan-out, e.g. `50ms`
    #[arg(long, default_value = "50ms")]
    pub timeout: HumanDuration,

    /// How long the export handler sleeps
    #[arg(long, default_value = "500ms")]
    pub export_delay: HumanDuration,
}
