//! OSSHUB CLI - Main entry point

use clap::Parser;
use osshub_cli::{Cli, Commands};
use osshub_common::logging::{init_logging, LogConfig, LogLevel, LogOutput};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // .env must be loaded before clap reads DATABASE_URL
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let log_config = LogConfig::builder()
        .level(level)
        .output(LogOutput::Console)
        .log_file_prefix("osshub-cli")
        .build();

    // Environment variables take precedence; the CLI works without logging
    let log_config = log_config.merge_env().unwrap_or_default();
    let _guard = init_logging(&log_config).ok();

    let result = match &cli.command {
        Commands::Audit { command } => {
            osshub_cli::commands::audit::run(command, &cli.database_url).await
        },
    };

    if let Err(e) = result {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
