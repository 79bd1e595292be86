//! Audit data models

use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use osshub_common::{
    types::{TRIGGERED_BY_OSSHUB, TRIGGERED_BY_SYSTEM},
    Direction,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::BTreeMap;

// ============================================================================
// Audit Query Constants
// ============================================================================

/// Default number of rows returned by the audit viewer
pub const DEFAULT_AUDIT_QUERY_LIMIT: i64 = 10;

/// Maximum number of rows that can be returned in a single query.
pub const MAX_AUDIT_QUERY_LIMIT: i64 = 1000;

/// Clamp a requested row count into `1..=MAX_AUDIT_QUERY_LIMIT`
pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_AUDIT_QUERY_LIMIT)
}

/// Render an HTTP header map as a JSON object of `name -> [values]`
pub fn headers_to_json(headers: &HeaderMap) -> JsonValue {
    let mut grouped: BTreeMap<String, Vec<JsonValue>> = BTreeMap::new();
    for (name, value) in headers {
        grouped
            .entry(name.as_str().to_string())
            .or_default()
            .push(JsonValue::String(String::from_utf8_lossy(value.as_bytes()).into_owned()));
    }

    JsonValue::Object(
        grouped
            .into_iter()
            .map(|(name, values)| (name, JsonValue::Array(values)))
            .collect::<Map<String, JsonValue>>(),
    )
}

/// Render a flat `name -> value` header map as a JSON object
pub fn string_map_to_json(headers: &BTreeMap<String, String>) -> JsonValue {
    JsonValue::Object(
        headers
            .iter()
            .map(|(name, value)| (name.clone(), JsonValue::String(value.clone())))
            .collect(),
    )
}

/// Audit row as stored in `audit_logs`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditLog {
    pub id: i64,
    /// `system` for outbound calls, `osshub` for inbound callbacks
    pub triggered_by: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
    pub status_code: Option<String>,
    #[sqlx(rename = "jenis")]
    pub direction: Option<String>,
    #[sqlx(rename = "req_header")]
    pub request_headers: Option<JsonValue>,
    #[sqlx(rename = "req_body")]
    pub request_body: Option<JsonValue>,
    #[sqlx(rename = "res_header")]
    pub response_headers: Option<JsonValue>,
    #[sqlx(rename = "res_body")]
    pub response_body: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn direction(&self) -> Option<Direction> {
        self.direction.as_deref().and_then(|d| d.parse().ok())
    }

    /// Look up a recorded request header by case-insensitive name
    ///
    /// Header values are stored either as a plain string or as a list of
    /// strings; for lists the first value is returned.
    pub fn request_header(&self, name: &str) -> Option<String> {
        let headers = self.request_headers.as_ref()?.as_object()?;
        let value = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)?;

        match value {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Array(items) => items.first().and_then(|v| v.as_str()).map(str::to_string),
            _ => None,
        }
    }
}

/// Input for creating an audit row
///
/// `created_at` is not part of the input; the store stamps it on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub triggered_by: String,
    /// Full URL of the call
    pub endpoint: String,
    pub method: String,
    /// Status code as text; `"500"` when the hub could not be reached
    pub status_code: Option<String>,
    pub direction: Direction,
    pub request_headers: Option<JsonValue>,
    pub request_body: Option<JsonValue>,
    pub response_headers: Option<JsonValue>,
    /// Response body, or the error message on failure paths
    pub response_body: String,
}

impl NewAuditEntry {
    pub fn builder() -> AuditEntryBuilder {
        AuditEntryBuilder::default()
    }

    /// Builder preset for a call this gateway makes to the hub
    pub fn outbound() -> AuditEntryBuilder {
        AuditEntryBuilder::default()
            .triggered_by(TRIGGERED_BY_SYSTEM)
            .direction(Direction::Outbound)
    }

    /// Builder preset for a callback the hub makes to this gateway
    pub fn inbound() -> AuditEntryBuilder {
        AuditEntryBuilder::default()
            .triggered_by(TRIGGERED_BY_OSSHUB)
            .direction(Direction::Inbound)
    }
}

/// Builder for audit entries
#[derive(Debug, Clone, Default)]
pub struct AuditEntryBuilder {
    triggered_by: Option<String>,
    endpoint: Option<String>,
    method: Option<String>,
    status_code: Option<String>,
    direction: Option<Direction>,
    request_headers: Option<JsonValue>,
    request_body: Option<JsonValue>,
    response_headers: Option<JsonValue>,
    response_body: Option<String>,
}

impl AuditEntryBuilder {
    pub fn triggered_by(mut self, triggered_by: impl Into<String>) -> Self {
        self.triggered_by = Some(triggered_by.into());
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn status_code(mut self, status_code: impl ToString) -> Self {
        self.status_code = Some(status_code.to_string());
        self
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn request_headers(mut self, headers: Option<JsonValue>) -> Self {
        self.request_headers = headers;
        self
    }

    pub fn request_body(mut self, body: Option<JsonValue>) -> Self {
        self.request_body = body;
        self
    }

    pub fn response_headers(mut self, headers: Option<JsonValue>) -> Self {
        self.response_headers = headers;
        self
    }

    pub fn response_body(mut self, body: impl Into<String>) -> Self {
        self.response_body = Some(body.into());
        self
    }

    /// Build the entry, failing if a mandatory field is missing
    pub fn try_build(self) -> Result<NewAuditEntry, &'static str> {
        Ok(NewAuditEntry {
            triggered_by: self.triggered_by.ok_or("triggered_by is required")?,
            endpoint: self.endpoint.ok_or("endpoint is required")?,
            method: self.method.ok_or("method is required")?,
            status_code: self.status_code,
            direction: self.direction.ok_or("direction is required")?,
            request_headers: self.request_headers,
            request_body: self.request_body,
            response_headers: self.response_headers,
            response_body: self.response_body.ok_or("response_body is required")?,
        })
    }
}
