//! Error types shared across the gateway crates

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Common error type
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid value '{value}' for {field}: expected one of {expected}")]
    InvalidValue {
        field: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl GatewayError {
    pub fn invalid_value(field: &'static str, value: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
            expected,
        }
    }
}
