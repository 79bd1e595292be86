//! OSSHUB Gateway CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Read-only tooling for operators of the gateway:
//!
//! - **Audit viewer**: show the most recent boundary calls (`osshub audit show`)

pub mod commands;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use osshub_server::{audit::DEFAULT_AUDIT_QUERY_LIMIT, config::DEFAULT_DATABASE_URL};

/// OSSHUB gateway operator tools
#[derive(Parser, Debug)]
#[command(name = "osshub")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Audit database URL
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL, global = true)]
    pub database_url: String,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect the audit log
    Audit {
        #[command(subcommand)]
        command: AuditCommand,
    },
}

/// Audit log subcommands
#[derive(Subcommand, Debug)]
pub enum AuditCommand {
    /// Show recent audit logs, newest first
    Show {
        /// Number of records to show
        #[arg(short, long, default_value_t = DEFAULT_AUDIT_QUERY_LIMIT)]
        limit: i64,
    },
}
