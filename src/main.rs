mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use std::path::PathBuf;
use std::sync::Arc;
use taskbind::Dispatcher;
use taskbind::config::Config;
use taskbind::demo::{self, AuditService, OrderService};
use taskbind::observability::init_tracing;

fn load_config(path: Option<PathBuf>) -> Result<Config, taskbind::config::ConfigError> {
    match path {
        Some(path) => Config::load_from_path(path),
        None => Config::load(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => {
            let config = load_config(args.path)?;
            init_tracing(&config.telemetry);
            print!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Demo(args) => {
            let config = load_config(args.path)?;
            init_tracing(&config.telemetry);

            let dispatcher = Dispatcher::from_config(&config);
            let orders = Arc::new(OrderService::default());
            demo::install(
                &dispatcher,
                &orders,
                &Arc::new(AuditService),
                args.export_delay.as_duration(),
            );

            let report = demo::run(&dispatcher, Some(args.timeout.as_duration())).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            tracing::info!(metrics = ?dispatcher.metrics().snapshot(), "Demo finished");
        }
    }

    Ok(())
}
