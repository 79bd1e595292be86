//! Database connection management

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::audit::{AuditStore, MemoryAuditStore, PgAuditStore};
use crate::config::{AuditBackend, Config, DatabaseConfig};
use crate::error::ServerResult;

/// Create a connection pool
pub async fn create_pool(config: &DatabaseConfig) -> ServerResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Database connection pool created"
    );

    Ok(pool)
}

/// Apply pending migrations for `audit_logs`
pub async fn run_migrations(pool: &PgPool) -> ServerResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations completed");
    Ok(())
}

/// Open the configured audit store, migrating Postgres on the way
pub async fn open_audit_store(config: &Config) -> ServerResult<Arc<dyn AuditStore>> {
    match config.audit.store {
        AuditBackend::Postgres => {
            let pool = create_pool(&config.database).await?;
            run_migrations(&pool).await?;
            Ok(Arc::new(PgAuditStore::new(pool)))
        },
        AuditBackend::Memory => {
            tracing::warn!("Using in-memory audit store; audit rows are lost on restart");
            Ok(Arc::new(MemoryAuditStore::new()))
        },
    }
}
