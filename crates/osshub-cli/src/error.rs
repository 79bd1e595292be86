//! Error types for the OSSHUB CLI
//!
//! Messages are user-facing and say what to check next.

use osshub_server::ServerError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Could not reach or query the audit database
    #[error("Database error: {0}. Check DATABASE_URL and that the gateway migrations have run.")]
    Database(#[from] sqlx::Error),

    /// The audit store rejected the query
    #[error("Audit store error: {0}")]
    Audit(#[from] ServerError),

    /// Invalid command-line input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
