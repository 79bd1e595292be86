//! OSSHUB Gateway Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared pieces used by the gateway server and the audit viewer:
//!
//! - **Logging**: tracing subscriber bootstrap driven by environment variables
//! - **Error Handling**: the common error type and result alias
//! - **Types**: boundary vocabulary (call direction, caller tags)

pub mod error;
pub mod logging;
pub mod types;

pub use error::{GatewayError, Result};
pub use types::Direction;
