//! Audit logging module
//!
//! Every call crossing the gateway/hub boundary, in either direction,
//! produces exactly one row in `audit_logs`. Rows are immutable once
//! written.
//!
//! # Architecture
//!
//! - [`NewAuditEntry`] describes a call; builder presets exist for both
//!   directions
//! - [`AuditStore`] is the persistence seam, implemented by
//!   [`PgAuditStore`] and [`MemoryAuditStore`]
//! - [`AuditRecorder`] is what the relay and the inbound receiver talk to;
//!   it applies the configured failure policy
//!
//! Secrets are masked by the callers (see [`crate::redaction`]) before an
//! entry is built; the recorder persists what it is given.
//!
//! # Example
//!
//! ```no_run
//! use osshub_server::audit::{AuditRecorder, NewAuditEntry, PgAuditStore};
//! use osshub_server::config::AuditFailurePolicy;
//! use sqlx::PgPool;
//! use std::sync::Arc;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let recorder = AuditRecorder::new(
//!     Arc::new(PgAuditStore::new(pool)),
//!     AuditFailurePolicy::Strict,
//! );
//!
//! let entry = NewAuditEntry::outbound()
//!     .endpoint("https://hub.example.go.id/api/health")
//!     .method("GET")
//!     .status_code(200)
//!     .response_body(r#"{"status":"up"}"#)
//!     .try_build()?;
//!
//! let row = recorder.record(entry).await?;
//! println!("Created audit log: {}", row.id);
//! # Ok(())
//! # }
//! ```

mod memory;
mod models;
mod recorder;
mod store;

pub use memory::MemoryAuditStore;
pub use models::{
    clamp_limit, headers_to_json, string_map_to_json, AuditEntryBuilder, AuditLog,
    NewAuditEntry, DEFAULT_AUDIT_QUERY_LIMIT, MAX_AUDIT_QUERY_LIMIT,
};
pub use recorder::AuditRecorder;
pub use store::{AuditStore, PgAuditStore};
