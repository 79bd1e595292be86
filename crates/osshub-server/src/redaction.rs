//! Masking of secret material before it reaches the audit log
//!
//! Every representation of an outbound request is passed through these
//! functions before an audit entry is built from it, so the bearer token and
//! the hub password are never persisted or logged.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Replacement value for any `Authorization` header.
pub const HIDDEN_BEARER: &str = "Bearer [HIDDEN]";

/// Replacement value for masked secret fields.
pub const HIDDEN: &str = "[HIDDEN]";

const AUTHORIZATION: &str = "authorization";

/// Field names treated as secrets inside request bodies.
const SECRET_FIELDS: &[&str] = &["password", "passwd", "secret", "client_secret"];

/// Return a copy of `headers` with every `Authorization` value masked
///
/// Header names are matched case-insensitively; all other headers pass
/// through unchanged.
pub fn redact_headers(headers: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            if name.eq_ignore_ascii_case(AUTHORIZATION) {
                (name.clone(), HIDDEN_BEARER.to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}

/// Return a copy of a credential body with password-like fields masked
///
/// Objects are walked recursively; arrays are walked element by element.
pub fn redact_credentials(body: &JsonValue) -> JsonValue {
    match body {
        JsonValue::Object(map) => JsonValue::Object(
            map.iter()
                .map(|(key, value)| {
                    let masked = if is_secret_field(key) {
                        JsonValue::String(HIDDEN.to_string())
                    } else {
                        redact_credentials(value)
                    };
                    (key.clone(), masked)
                })
                .collect(),
        ),
        JsonValue::Array(items) => JsonValue::Array(items.iter().map(redact_credentials).collect()),
        other => other.clone(),
    }
}

fn is_secret_field(key: &str) -> bool {
    SECRET_FIELDS.iter().any(|field| key.eq_ignore_ascii_case(field))
}
