//! Vehicles Prep - Main Entry Point

use clap::Parser;
use colored::*;
use vehicles_prep::cli::{cmd_info, cmd_normalize, cmd_preview, Cli, Commands};
use vehicles_prep::ListingsError;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vehicles_prep=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Normalize { data, output, config, global_fallback } => {
            cmd_normalize(&data, &output, config.as_deref(), global_fallback)
        }
        Commands::Info { data, config } => cmd_info(&data, config.as_deref()),
        Commands::Preview { data, rows } => cmd_preview(&data, rows),
    };

    // Without data nothing downstream can run: report and stop.
    if let Err(err) = &result {
        if let Some(ListingsError::SourceUnavailable { path, reason }) = err.downcast_ref::<ListingsError>() {
            eprintln!();
            eprintln!("  {} could not read '{}': {}", "error".red().bold(), path, reason);
            eprintln!("  make sure the data file exists and is readable");
            std::process::exit(1);
        }
    }

    result
}
