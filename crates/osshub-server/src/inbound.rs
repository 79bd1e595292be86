//! Callbacks pushed by the hub
//!
//! Each callback is acknowledged with a fixed message and audited as
//! received. Payloads are neither validated nor stored beyond the audit row,
//! and request headers are persisted without redaction.

use axum::{
    body::Bytes,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::info;

use crate::audit::{headers_to_json, AuditRecorder, NewAuditEntry};
use crate::error::{ServerError, ServerResult};

/// Kind of hub callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    Nib,
    FileIzin,
    Status,
}

impl Callback {
    pub fn ack_message(self) -> &'static str {
        match self {
            Callback::Nib => "Received NIB successfully",
            Callback::FileIzin => "Received file izin successfully",
            Callback::Status => "Received status successfully",
        }
    }
}

/// Inbound request as captured for the audit row
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// Full URL: public base URL plus path and query
    pub url: String,
    pub headers: JsonValue,
    pub body: JsonValue,
}

impl InboundRequest {
    pub fn from_parts(app_url: &str, uri: &Uri, headers: &HeaderMap, body: &Bytes) -> Self {
        let path = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());

        Self {
            url: format!("{}{}", app_url.trim_end_matches('/'), path),
            headers: headers_to_json(headers),
            body: body_to_json(body),
        }
    }
}

/// Empty bodies become `{}`; anything that is not JSON is kept as a string
fn body_to_json(body: &Bytes) -> JsonValue {
    if body.iter().all(u8::is_ascii_whitespace) {
        return json!({});
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| JsonValue::String(String::from_utf8_lossy(body).into_owned()))
}

/// Body returned to the hub
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub message: String,
}

impl IntoResponse for Acknowledgement {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Accepts hub callbacks
#[derive(Clone)]
pub struct InboundReceiver {
    recorder: AuditRecorder,
}

impl InboundReceiver {
    pub fn new(recorder: AuditRecorder) -> Self {
        Self { recorder }
    }

    pub async fn receive_nib(&self, request: InboundRequest) -> ServerResult<Acknowledgement> {
        self.receive(Callback::Nib, request).await
    }

    pub async fn receive_file_izin(
        &self,
        request: InboundRequest,
    ) -> ServerResult<Acknowledgement> {
        self.receive(Callback::FileIzin, request).await
    }

    pub async fn receive_status(&self, request: InboundRequest) -> ServerResult<Acknowledgement> {
        self.receive(Callback::Status, request).await
    }

    /// Acknowledge and audit one callback
    pub async fn receive(
        &self,
        kind: Callback,
        request: InboundRequest,
    ) -> ServerResult<Acknowledgement> {
        let ack = Acknowledgement {
            message: kind.ack_message().to_string(),
        };
        let ack_body = serde_json::to_string(&ack)
            .map_err(|e| ServerError::Internal(format!("Failed to encode acknowledgement: {}", e)))?;

        info!(callback = ?kind, url = %request.url, "Hub callback received");

        let entry = NewAuditEntry::inbound()
            .endpoint(request.url)
            .method("POST")
            .status_code(StatusCode::OK.as_u16())
            .request_headers(Some(request.headers))
            .request_body(Some(request.body))
            .response_headers(Some(json!({ "content-type": ["application/json"] })))
            .response_body(ack_body)
            .try_build()
            .map_err(|e| ServerError::Internal(format!("Incomplete audit entry: {}", e)))?;

        self.recorder.record_call(entry).await?;

        Ok(ack)
    }
}
