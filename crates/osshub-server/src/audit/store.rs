//! Audit persistence
//!
//! The store is append-only: rows are inserted once and only ever read back
//! by the viewer. Concurrent inserts need no coordination beyond what the
//! backing store provides.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::models::{clamp_limit, AuditLog, NewAuditEntry};
use crate::error::ServerResult;

/// Storage backend for audit rows (dependency injection seam)
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Insert one row and return it with its id and creation timestamp
    async fn insert(&self, entry: NewAuditEntry) -> ServerResult<AuditLog>;

    /// Most recent rows first, at most `limit` of them
    async fn recent(&self, limit: i64) -> ServerResult<Vec<AuditLog>>;
}

/// PostgreSQL-backed audit store
#[derive(Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn insert(&self, entry: NewAuditEntry) -> ServerResult<AuditLog> {
        let record = sqlx::query_as::<_, AuditLog>(
            r#"
            INSERT INTO audit_logs (
                triggered_by, endpoint, method, status_code, jenis,
                req_header, req_body, res_header, res_body
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, triggered_by, endpoint, method, status_code, jenis,
                      req_header, req_body, res_header, res_body, created_at
            "#,
        )
        .bind(&entry.triggered_by)
        .bind(&entry.endpoint)
        .bind(&entry.method)
        .bind(&entry.status_code)
        .bind(entry.direction.as_str())
        .bind(&entry.request_headers)
        .bind(&entry.request_body)
        .bind(&entry.response_headers)
        .bind(&entry.response_body)
        .fetch_one(&self.pool)
        .await?;

        debug!(
            audit_id = record.id,
            direction = %entry.direction,
            endpoint = %entry.endpoint,
            "Created audit log entry"
        );

        Ok(record)
    }

    async fn recent(&self, limit: i64) -> ServerResult<Vec<AuditLog>> {
        let records = sqlx::query_as::<_, AuditLog>(
            r#"
            SELECT id, triggered_by, endpoint, method, status_code, jenis,
                   req_header, req_body, res_header, res_body, created_at
            FROM audit_logs
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = records.len(), "Queried recent audit logs");

        Ok(records)
    }
}
