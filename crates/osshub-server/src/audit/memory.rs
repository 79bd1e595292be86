//! In-memory audit store for tests and dry runs

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;

use super::models::{clamp_limit, AuditLog, NewAuditEntry};
use super::store::AuditStore;
use crate::error::{ServerError, ServerResult};

/// Volatile audit store; rows live as long as the process
#[derive(Default)]
pub struct MemoryAuditStore {
    rows: Mutex<Vec<AuditLog>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all rows in insertion order
    pub fn entries(&self) -> Vec<AuditLog> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn insert(&self, entry: NewAuditEntry) -> ServerResult<AuditLog> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|e| ServerError::AuditStore(format!("Audit store lock poisoned: {}", e)))?;

        let record = AuditLog {
            id: rows.len() as i64 + 1,
            triggered_by: Some(entry.triggered_by),
            endpoint: Some(entry.endpoint),
            method: Some(entry.method),
            status_code: entry.status_code,
            direction: Some(entry.direction.as_str().to_string()),
            request_headers: entry.request_headers,
            request_body: entry.request_body,
            response_headers: entry.response_headers,
            response_body: Some(entry.response_body),
            created_at: Utc::now(),
        };
        rows.push(record.clone());

        Ok(record)
    }

    async fn recent(&self, limit: i64) -> ServerResult<Vec<AuditLog>> {
        let rows = self
            .rows
            .lock()
            .map_err(|e| ServerError::AuditStore(format!("Audit store lock poisoned: {}", e)))?;

        Ok(rows
            .iter()
            .rev()
            .take(clamp_limit(limit) as usize)
            .cloned()
            .collect())
    }
}
