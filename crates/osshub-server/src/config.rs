//! Configuration management
//!
//! Everything is read from the environment (a `.env` file is honoured) once
//! at startup and then handed to each component explicitly.

use osshub_common::GatewayError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::redaction::HIDDEN;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/osshub_gateway";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default timeout for a single hub call in seconds.
pub const DEFAULT_HUB_TIMEOUT_SECS: u64 = 30;

/// Default public URL of this gateway.
pub const DEFAULT_APP_URL: &str = "http://localhost:8000";

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub hub: HubConfig,
    pub app: AppConfig,
    pub audit: AuditConfig,
    pub cors: CorsConfig,
}

/// Listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Connection details for the OSSHUB hub
#[derive(Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Base URL all hub paths are appended to
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub timeout_secs: u64,
    pub auth_failure: AuthFailureMode,
    /// Optional TOML file holding the outbound credential/license payloads
    pub payload_file: Option<PathBuf>,
}

impl std::fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConfig")
            .field("endpoint", &self.endpoint)
            .field("username", &self.username)
            .field("password", &HIDDEN)
            .field("timeout_secs", &self.timeout_secs)
            .field("auth_failure", &self.auth_failure)
            .field("payload_file", &self.payload_file)
            .finish()
    }
}

/// Settings describing this gateway to the outside world
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public base URL; inbound callback URLs are derived from it
    pub url: String,
}

/// Audit subsystem configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub store: AuditBackend,
    pub failure_policy: AuditFailurePolicy,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// What an authenticated relay call does when no token could be obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthFailureMode {
    /// Send the call anyway with `Authorization: Bearer no_token` and let the
    /// hub reject it
    #[default]
    Forward,
    /// Skip the hub call and answer (and audit) a failure straight away
    ShortCircuit,
}

impl std::str::FromStr for AuthFailureMode {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "short_circuit" | "short-circuit" => Ok(Self::ShortCircuit),
            _ => Err(GatewayError::invalid_value(
                "OSSHUB_AUTH_FAILURE",
                s,
                "forward, short_circuit",
            )),
        }
    }
}

/// What happens to a boundary call whose audit row cannot be written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditFailurePolicy {
    /// The caller gets a 500 instead of the normal response
    #[default]
    Strict,
    /// The failure is logged and the normal response is returned
    BestEffort,
}

impl std::str::FromStr for AuditFailurePolicy {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "best_effort" | "best-effort" => Ok(Self::BestEffort),
            _ => Err(GatewayError::invalid_value(
                "AUDIT_FAILURE_POLICY",
                s,
                "strict, best_effort",
            )),
        }
    }
}

/// Where audit rows are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditBackend {
    #[default]
    Postgres,
    /// Process memory only; rows vanish on restart
    Memory,
}

impl std::str::FromStr for AuditBackend {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            _ => Err(GatewayError::invalid_value("AUDIT_STORE", s, "postgres, memory")),
        }
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// Numeric values that fail to parse fall back to their defaults; enum
    /// values that fail to parse are an error.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let auth_failure = match lookup("OSSHUB_AUTH_FAILURE") {
            Some(value) => value.parse()?,
            None => AuthFailureMode::default(),
        };
        let store = match lookup("AUDIT_STORE") {
            Some(value) => value.parse()?,
            None => AuditBackend::default(),
        };
        let failure_policy = match lookup("AUDIT_FAILURE_POLICY") {
            Some(value) => value.parse()?,
            None => AuditFailurePolicy::default(),
        };

        Ok(Config {
            server: ServerConfig {
                host: text("GATEWAY_HOST", DEFAULT_SERVER_HOST),
                port: parse_or(lookup("GATEWAY_PORT"), DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: parse_or(
                    lookup("GATEWAY_SHUTDOWN_TIMEOUT"),
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
            },
            database: DatabaseConfig {
                url: text("DATABASE_URL", DEFAULT_DATABASE_URL),
                max_connections: parse_or(
                    lookup("DATABASE_MAX_CONNECTIONS"),
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: parse_or(
                    lookup("DATABASE_MIN_CONNECTIONS"),
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: parse_or(
                    lookup("DATABASE_CONNECT_TIMEOUT"),
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: parse_or(
                    lookup("DATABASE_IDLE_TIMEOUT"),
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            hub: HubConfig {
                endpoint: text("OSSHUB_ENDPOINT", ""),
                username: text("OSSHUB_USERNAME", ""),
                password: text("OSSHUB_PASSWORD", ""),
                timeout_secs: parse_or(lookup("OSSHUB_TIMEOUT_SECS"), DEFAULT_HUB_TIMEOUT_SECS),
                auth_failure,
                payload_file: lookup("OSSHUB_PAYLOAD_FILE")
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from),
            },
            app: AppConfig {
                url: text("APP_URL", DEFAULT_APP_URL),
            },
            audit: AuditConfig {
                store,
                failure_policy,
            },
            cors: CorsConfig {
                allowed_origins: text("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ALLOWED_ORIGIN)
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: lookup("CORS_ALLOW_CREDENTIALS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(true),
            },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        validate_http_url("OSSHUB_ENDPOINT", &self.hub.endpoint)?;
        validate_http_url("APP_URL", &self.app.url)?;

        if self.hub.timeout_secs == 0 {
            anyhow::bail!("OSSHUB_TIMEOUT_SECS must be greater than 0");
        }

        if self.hub.username.is_empty() || self.hub.password.is_empty() {
            tracing::warn!("OSSHUB_USERNAME or OSSHUB_PASSWORD is empty - hub login will fail");
        }

        if self.audit.store == AuditBackend::Postgres {
            if self.database.url.is_empty() {
                anyhow::bail!("Database URL cannot be empty");
            }

            if self.database.max_connections == 0 {
                anyhow::bail!("Database max_connections must be greater than 0");
            }

            if self.database.min_connections > self.database.max_connections {
                anyhow::bail!(
                    "Database min_connections ({}) cannot be greater than max_connections ({})",
                    self.database.min_connections,
                    self.database.max_connections
                );
            }
        } else {
            tracing::warn!("Audit rows are kept in memory only (AUDIT_STORE=memory)");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

fn validate_http_url(name: &str, value: &str) -> anyhow::Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{} must be set", name);
    }

    let parsed = url::Url::parse(value)
        .map_err(|e| anyhow::anyhow!("{} is not a valid URL ({}): {}", name, value, e))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        anyhow::bail!("{} must use http or https, got '{}'", name, parsed.scheme());
    }

    Ok(())
}
