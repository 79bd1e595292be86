//! Outbound relay to the hub
//!
//! Every operation makes at most one hub call and writes exactly one audit
//! row, whatever the outcome. Hub answers are passed through unchanged;
//! failures become a 500 with `{"error", "message"}`.

pub mod payloads;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Method;
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::audit::{string_map_to_json, AuditEntryBuilder, AuditRecorder, NewAuditEntry};
use crate::config::AuthFailureMode;
use crate::error::{ServerError, ServerResult};
use crate::hub::token::bearer;
use crate::hub::{HubClient, TokenError, TokenProvider, NO_TOKEN};
use crate::redaction::redact_headers;

pub use payloads::{CredentialPayload, CustomHeader, LicensePayload, Payloads, PnbpPayload};

const CONTENT_TYPE_JSON: &str = "application/json";
const AUTHORIZATION: &str = "Authorization";
const CONTENT_TYPE: &str = "Content-Type";

/// A hub capability exposed by the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubOperation {
    Health,
    SetRemoteCredential,
    LicenseFinal,
    LicenseUpdate,
}

impl HubOperation {
    /// Path relative to the hub base endpoint
    pub fn path(self) -> &'static str {
        match self {
            HubOperation::Health => "health",
            HubOperation::SetRemoteCredential => "yanlik/remote-credential",
            HubOperation::LicenseFinal => "license-final",
            HubOperation::LicenseUpdate => "license-update",
        }
    }

    pub fn method(self) -> Method {
        match self {
            HubOperation::Health => Method::GET,
            HubOperation::SetRemoteCredential | HubOperation::LicenseFinal => Method::POST,
            HubOperation::LicenseUpdate => Method::PUT,
        }
    }

    /// `error` field of the 500 body returned when the call fails
    pub fn failure_message(self) -> &'static str {
        match self {
            HubOperation::Health => "Unable to connect to health endpoint",
            HubOperation::SetRemoteCredential => "set remote credential failed",
            HubOperation::LicenseFinal => "license final failed",
            HubOperation::LicenseUpdate => "license update failed",
        }
    }

    pub fn requires_auth(self) -> bool {
        !matches!(self, HubOperation::Health)
    }
}

/// What the relay hands back to its caller
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RelayResponse {
    fn passthrough(status: u16, body: String) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        }
    }

    fn failure(operation: HubOperation, message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({
                "error": operation.failure_message(),
                "message": message,
            })
            .to_string(),
        }
    }
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, CONTENT_TYPE_JSON)],
            self.body,
        )
            .into_response()
    }
}

/// Issues hub calls on behalf of the local licensing system
#[derive(Clone)]
pub struct OutboundRelay {
    hub: HubClient,
    tokens: TokenProvider,
    recorder: AuditRecorder,
    auth_failure: AuthFailureMode,
}

impl OutboundRelay {
    pub fn new(
        hub: HubClient,
        tokens: TokenProvider,
        recorder: AuditRecorder,
        auth_failure: AuthFailureMode,
    ) -> Self {
        Self {
            hub,
            tokens,
            recorder,
            auth_failure,
        }
    }

    /// Unauthenticated liveness probe of the hub
    pub async fn health(&self) -> ServerResult<RelayResponse> {
        self.call(HubOperation::Health, None).await
    }

    /// Register this gateway's callback endpoints with the hub
    pub async fn set_remote_credential(
        &self,
        payload: &CredentialPayload,
    ) -> ServerResult<RelayResponse> {
        self.call(HubOperation::SetRemoteCredential, Some(payload.to_body()))
            .await
    }

    pub async fn license_final(&self, payload: &LicensePayload) -> ServerResult<RelayResponse> {
        self.call(HubOperation::LicenseFinal, Some(payload.final_body()))
            .await
    }

    pub async fn license_update(&self, payload: &LicensePayload) -> ServerResult<RelayResponse> {
        self.call(HubOperation::LicenseUpdate, Some(payload.update_body()))
            .await
    }

    #[tracing::instrument(skip(self, body), fields(path = operation.path()))]
    async fn call(
        &self,
        operation: HubOperation,
        body: Option<JsonValue>,
    ) -> ServerResult<RelayResponse> {
        let endpoint = self.hub.endpoint(operation.path());

        let mut headers = BTreeMap::new();
        if operation.requires_auth() {
            let authorization = match self.tokens.acquire().await {
                Ok(token) => token.bearer(),
                Err(e) => match self.auth_failure {
                    AuthFailureMode::Forward => {
                        warn!(error = %e, "Hub login failed, forwarding with sentinel token");
                        bearer(NO_TOKEN)
                    },
                    AuthFailureMode::ShortCircuit => {
                        return self.short_circuit(operation, endpoint, body, e).await;
                    },
                },
            };
            headers.insert(AUTHORIZATION.to_string(), authorization);
            headers.insert(CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string());
        }

        // Only the redacted copy outlives the request.
        let logged_headers =
            (!headers.is_empty()).then(|| string_map_to_json(&redact_headers(&headers)));
        let audit = NewAuditEntry::outbound()
            .endpoint(endpoint)
            .method(operation.method().as_str())
            .request_headers(logged_headers)
            .request_body(body.clone());

        let result = self
            .hub
            .send(operation.method(), operation.path(), &headers, body.as_ref())
            .await;
        drop(headers);

        match result {
            Ok(response) => {
                info!(status = response.status, "Hub call succeeded");
                let entry = audit
                    .status_code(response.status)
                    .response_headers(Some(response.headers))
                    .response_body(response.body.as_str());
                self.recorder.record_call(build(entry)?).await?;

                Ok(RelayResponse::passthrough(response.status, response.body))
            },
            Err(e) => {
                let message = e.to_string();
                warn!(error = %message, "Hub call failed");
                let entry = audit
                    .status_code(StatusCode::INTERNAL_SERVER_ERROR.as_u16())
                    .response_headers(None)
                    .response_body(message.as_str());
                self.recorder.record_call(build(entry)?).await?;

                Ok(RelayResponse::failure(operation, &message))
            },
        }
    }

    /// Record and fail an authenticated call without contacting the hub
    async fn short_circuit(
        &self,
        operation: HubOperation,
        endpoint: String,
        body: Option<JsonValue>,
        error: TokenError,
    ) -> ServerResult<RelayResponse> {
        let message = error.to_string();
        warn!(error = %message, "Hub login failed, skipping hub call");

        let entry = NewAuditEntry::outbound()
            .endpoint(endpoint)
            .method(operation.method().as_str())
            .status_code(StatusCode::INTERNAL_SERVER_ERROR.as_u16())
            .request_body(body)
            .response_body(message.as_str());
        self.recorder.record_call(build(entry)?).await?;

        Ok(RelayResponse::failure(operation, &message))
    }
}

fn build(builder: AuditEntryBuilder) -> ServerResult<NewAuditEntry> {
    builder
        .try_build()
        .map_err(|e| ServerError::Internal(format!("Incomplete audit entry: {}", e)))
}
