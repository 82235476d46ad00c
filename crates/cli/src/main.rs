mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use verdict_core::config::load_dotenv;
use verdict_core::EngineConfig;

use crate::cli::{CliArgs, Command};

fn main() -> Result<()> {
    load_dotenv();
    let mut config = EngineConfig::from_env();

    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    if let Some(dir) = args.criteria_dir {
        config.criteria_dir = dir;
    }
    config.log_summary();

    match &args.command {
        Command::Evaluate { criteria_id, subject } => {
            commands::evaluate(&config, criteria_id, subject, args.pretty)
        }
        Command::Batch { criteria_id, subjects } => {
            commands::batch(&config, criteria_id, subjects, args.pretty)
        }
        Command::Validate { file } => commands::validate(file, args.pretty),
        Command::List => commands::list(&config, args.pretty),
        Command::Watch { criteria_id, subject } => {
            commands::watch(&config, criteria_id, subject, args.pretty)
        }
    }
}
