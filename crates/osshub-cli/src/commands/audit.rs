//! `osshub audit` command implementation
//!
//! Prints the most recent rows of `audit_logs` as a table.

use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use osshub_server::audit::{AuditLog, AuditStore, PgAuditStore, MAX_AUDIT_QUERY_LIMIT};
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::debug;

use crate::error::{CliError, Result};
use crate::AuditCommand;

/// Longest user agent shown before truncation
const USER_AGENT_WIDTH: usize = 30;

const NOT_AVAILABLE: &str = "N/A";

const HEADERS: [&str; 8] = [
    "ID",
    "Endpoint",
    "Method",
    "Direction",
    "IP",
    "User Agent",
    "Status",
    "Created At",
];

/// Execute audit command
pub async fn run(command: &AuditCommand, database_url: &str) -> Result<()> {
    match command {
        AuditCommand::Show { limit } => show(database_url, *limit).await,
    }
}

async fn show(database_url: &str, limit: i64) -> Result<()> {
    if !(1..=MAX_AUDIT_QUERY_LIMIT).contains(&limit) {
        return Err(CliError::InvalidArgument(format!(
            "--limit must be between 1 and {}, got {}",
            MAX_AUDIT_QUERY_LIMIT, limit
        )));
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url)
        .await?;

    let store = PgAuditStore::new(pool);
    let logs = store.recent(limit).await?;
    debug!(count = logs.len(), limit, "Fetched audit logs");

    if logs.is_empty() {
        println!("{}", "No audit logs found.".green());
        return Ok(());
    }

    println!("{}", render_table(&logs));
    println!(
        "{}",
        format!("Showing {} most recent audit logs.", logs.len()).green()
    );

    Ok(())
}

/// Build the table for a slice of rows, in the order given
pub fn render_table(logs: &[AuditLog]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(HEADERS.to_vec());

    for log in logs {
        table.add_row(row_cells(log));
    }

    table
}

/// One table row; missing values render as `N/A`
pub fn row_cells(log: &AuditLog) -> Vec<String> {
    let or_na = |value: Option<&str>| value.unwrap_or(NOT_AVAILABLE).to_string();

    vec![
        log.id.to_string(),
        or_na(log.endpoint.as_deref()),
        or_na(log.method.as_deref()),
        or_na(log.direction.as_deref()),
        or_na(log.request_header("x-forwarded-for").as_deref()),
        truncate_user_agent(log.request_header("user-agent").as_deref().unwrap_or(NOT_AVAILABLE)),
        or_na(log.status_code.as_deref()),
        log.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ]
}

fn truncate_user_agent(user_agent: &str) -> String {
    if user_agent.chars().count() <= USER_AGENT_WIDTH {
        return user_agent.to_string();
    }
    let cut: String = user_agent.chars().take(USER_AGENT_WIDTH).collect();
    format!("{}...", cut)
}
