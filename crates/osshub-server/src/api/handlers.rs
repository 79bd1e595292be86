//! Route handlers
//!
//! Handlers only adapt HTTP to the relay, the token provider and the inbound
//! receiver; all auditing happens below them.

use axum::{
    body::Bytes,
    extract::{OriginalUri, State},
    http::HeaderMap,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use super::AppState;
use crate::error::ServerResult;
use crate::inbound::{Acknowledgement, InboundRequest};
use crate::relay::RelayResponse;

pub async fn health(State(state): State<AppState>) -> ServerResult<RelayResponse> {
    state.relay.health().await
}

/// Raw token string, or `no_token`
pub async fn login(State(state): State<AppState>) -> String {
    state.tokens.get_token().await
}

pub async fn set_remote_credential(State(state): State<AppState>) -> ServerResult<RelayResponse> {
    state
        .relay
        .set_remote_credential(&state.payloads.credential)
        .await
}

pub async fn license_final(State(state): State<AppState>) -> ServerResult<RelayResponse> {
    state.relay.license_final(&state.payloads.license).await
}

pub async fn license_update(State(state): State<AppState>) -> ServerResult<RelayResponse> {
    state.relay.license_update(&state.payloads.license).await
}

pub async fn receive_nib(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Acknowledgement> {
    let request = InboundRequest::from_parts(&state.app_url, &uri, &headers, &body);
    state.inbound.receive_nib(request).await
}

pub async fn receive_file_izin(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Acknowledgement> {
    let request = InboundRequest::from_parts(&state.app_url, &uri, &headers, &body);
    state.inbound.receive_file_izin(request).await
}

pub async fn receive_status(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Acknowledgement> {
    let request = InboundRequest::from_parts(&state.app_url, &uri, &headers, &body);
    state.inbound.receive_status(request).await
}

/// Local liveness probe; does not touch the hub
pub async fn status() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "API is working!",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
