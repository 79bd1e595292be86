//! Boundary vocabulary shared by the server and the audit viewer

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Caller tag recorded for calls this gateway makes to the hub.
pub const TRIGGERED_BY_SYSTEM: &str = "system";

/// Caller tag recorded for callbacks the hub makes to this gateway.
pub const TRIGGERED_BY_OSSHUB: &str = "osshub";

/// Direction of a call relative to the gateway.
///
/// Inbound is hub-to-gateway, outbound is gateway-to-hub. Stored in the
/// `jenis` column of `audit_logs` as its lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "inbound" => Ok(Self::Inbound),
            "outbound" => Ok(Self::Outbound),
            _ => Err(GatewayError::invalid_value("direction", s, "inbound, outbound")),
        }
    }
}
