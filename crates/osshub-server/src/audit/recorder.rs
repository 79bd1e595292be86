//! One audit row per boundary call

use std::sync::Arc;
use tracing::{error, info};

use super::models::{AuditLog, NewAuditEntry};
use super::store::AuditStore;
use crate::config::AuditFailurePolicy;
use crate::error::ServerResult;

/// Persists audit entries; shared by the relay and the inbound receiver
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
    policy: AuditFailurePolicy,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>, policy: AuditFailurePolicy) -> Self {
        Self { store, policy }
    }

    /// Insert exactly one row; store failures are returned to the caller
    pub async fn record(&self, entry: NewAuditEntry) -> ServerResult<AuditLog> {
        self.store.insert(entry).await
    }

    /// Record a boundary call, applying the configured failure policy
    ///
    /// Under [`AuditFailurePolicy::Strict`] a store failure is returned so
    /// the caller can fail the request; under
    /// [`AuditFailurePolicy::BestEffort`] it is logged and swallowed.
    pub async fn record_call(&self, entry: NewAuditEntry) -> ServerResult<()> {
        let endpoint = entry.endpoint.clone();
        let direction = entry.direction;

        match self.record(entry).await {
            Ok(log) => {
                info!(
                    audit_id = log.id,
                    direction = %direction,
                    endpoint = %endpoint,
                    status = log.status_code.as_deref().unwrap_or("-"),
                    "Boundary call audited"
                );
                Ok(())
            },
            Err(e) => match self.policy {
                AuditFailurePolicy::Strict => {
                    error!(error = %e, endpoint = %endpoint, "Failed to write audit log, failing request");
                    Err(e)
                },
                AuditFailurePolicy::BestEffort => {
                    error!(error = %e, endpoint = %endpoint, "Failed to write audit log, continuing unaudited");
                    Ok(())
                },
            },
        }
    }
}
