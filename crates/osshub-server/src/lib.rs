//! OSSHUB Gateway Server Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Licensing-integration gateway between a local licensing system and the
//! OSSHUB hub.
//!
//! # Overview
//!
//! - **Outbound relay**: health, callback registration, license final and
//!   license update calls to the hub, with one fresh login per
//!   authenticated call
//! - **Inbound receiver**: acknowledges NIB, license file and status
//!   callbacks pushed by the hub
//! - **Audit logging**: every call crossing the boundary, in either
//!   direction, produces exactly one row in `audit_logs`
//! - **Redaction**: bearer tokens and passwords are masked before anything
//!   reaches the audit store or the logs
//!
//! # Example
//!
//! ```no_run
//! use osshub_server::{api, config::Config, db, relay::Payloads};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let store = db::open_audit_store(&config).await?;
//!     let payloads = Payloads::load(config.hub.payload_file.as_deref(), &config.app.url)?;
//!     let state = api::AppState::new(&config, store, payloads)?;
//!     api::serve(state, &config).await
//! }
//! ```

pub mod api;
pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod hub;
pub mod inbound;
pub mod middleware;
pub mod redaction;
pub mod relay;

// Re-export commonly used types
pub use error::{ServerError, ServerResult};
