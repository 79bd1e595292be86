//! Outbound relay tests
//!
//! These tests verify:
//! - Hub responses are passed through unchanged and audited once
//! - Transport failures and non-2xx answers become a 500 and one audit row
//! - Bearer tokens never reach the audit store
//! - The auth failure and audit failure policies

mod common;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::*;
use osshub_server::{
    audit::{AuditLog, AuditStore, NewAuditEntry},
    error::{ServerError, ServerResult},
    relay::{LicensePayload, Payloads},
};
use serde_json::json;
use std::sync::Arc;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn sample_license() -> LicensePayload {
    LicensePayload {
        nib: "1287000141282".to_string(),
        id_produk: "PRD-0001".to_string(),
        id_proyek: "R-202205191423292409792".to_string(),
        id_izin: "I-202306201351596424899".to_string(),
        kd_izin: "059000000010".to_string(),
        status_izin: "51".to_string(),
        keterangan: "Disetujui".to_string(),
        ..LicensePayload::default()
    }
}

fn payloads_with_license() -> Payloads {
    Payloads {
        license: sample_license(),
        ..Payloads::defaults(APP_URL)
    }
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_passes_hub_response_through() {
    let hub = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "up"})))
        .expect(1)
        .mount(&hub)
        .await;

    let gateway = TestGateway::new(&test_config(&hub_url(&hub), &[]));
    let (status, body) = gateway.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({"status": "up"}));

    let rows = gateway.store.entries();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.triggered_by.as_deref(), Some("system"));
    assert_eq!(row.direction.as_deref(), Some("outbound"));
    assert_eq!(row.method.as_deref(), Some("GET"));
    assert_eq!(row.status_code.as_deref(), Some("200"));
    assert_eq!(row.endpoint, Some(format!("{}/api/health", hub.uri())));
    assert!(row.request_headers.is_none());
    assert!(row.request_body.is_none());
    assert!(row.response_headers.as_ref().unwrap().get("content-type").is_some());
    assert_eq!(parse(row.response_body.as_deref().unwrap()), json!({"status": "up"}));
}

#[tokio::test]
async fn test_health_unreachable_hub_returns_500() {
    let gateway = TestGateway::new(&test_config(UNREACHABLE_HUB, &[]));

    let (status, body) = gateway.get("/health").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse(&body);
    assert_eq!(body["error"], "Unable to connect to health endpoint");
    assert!(!body["message"].as_str().unwrap().is_empty());

    let rows = gateway.store.entries();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status_code.as_deref(), Some("500"));
    assert!(rows[0].response_headers.is_none());
    assert_eq!(rows[0].response_body.as_deref(), body["message"].as_str());
}

#[tokio::test]
async fn test_hub_error_status_is_passed_as_failure() {
    let hub = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&hub)
        .await;

    let gateway = TestGateway::new(&test_config(&hub_url(&hub), &[]));
    let (status, body) = gateway.get("/health").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = parse(&body)["message"].as_str().unwrap().to_string();
    assert!(message.starts_with("Server error: `GET "));
    assert!(message.contains("`503 Service Unavailable` response: maintenance"));
    assert_eq!(gateway.store.len(), 1);
}

// ============================================================================
// Authenticated operations
// ============================================================================

#[tokio::test]
async fn test_license_final_sends_bearer_and_redacts_it_in_audit() {
    let hub = MockServer::start().await;
    mount_login(&hub, "tok-abc-123").await;
    Mock::given(method("POST"))
        .and(path("/api/license-final"))
        .and(header("authorization", "Bearer tok-abc-123"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({"IZINFINAL": {"nib": "1287000141282", "id_produk": "PRD-0001"}})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"status": true, "message": "saved"})),
        )
        .expect(1)
        .mount(&hub)
        .await;

    let gateway =
        TestGateway::with_payloads(&test_config(&hub_url(&hub), &[]), payloads_with_license());
    let (status, body) = gateway.get("/license-final").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(parse(&body), json!({"status": true, "message": "saved"}));

    // The login call itself is never audited.
    let rows = gateway.store.entries();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.method.as_deref(), Some("POST"));
    assert_eq!(row.status_code.as_deref(), Some("201"));
    assert_eq!(row.request_header("authorization").as_deref(), Some("Bearer [HIDDEN]"));
    assert_eq!(row.request_header("content-type").as_deref(), Some("application/json"));
    assert_eq!(row.request_body.as_ref().unwrap()["IZINFINAL"]["kd_izin"], "059000000010");

    let persisted = serde_json::to_string(row).unwrap();
    assert!(!persisted.contains("tok-abc-123"));
    assert!(!persisted.contains(HUB_PASSWORD));
}

#[tokio::test]
async fn test_license_update_uses_put_without_product_id() {
    let hub = MockServer::start().await;
    mount_login(&hub, "tok-update").await;
    Mock::given(method("PUT"))
        .and(path("/api/license-update"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(1)
        .mount(&hub)
        .await;

    let gateway =
        TestGateway::with_payloads(&test_config(&hub_url(&hub), &[]), payloads_with_license());
    let (status, _) = gateway.get("/license-update").await;
    assert_eq!(status, StatusCode::OK);

    let requests = hub.received_requests().await.unwrap();
    let update = requests
        .iter()
        .find(|r| r.url.path() == "/api/license-update")
        .unwrap();
    let sent: serde_json::Value = serde_json::from_slice(&update.body).unwrap();
    assert!(sent["IZINFINAL"].get("id_produk").is_none());
    assert_eq!(sent["IZINFINAL"]["nib"], "1287000141282");

    let rows = gateway.store.entries();
    assert_eq!(rows[0].method.as_deref(), Some("PUT"));
    assert_eq!(rows[0].request_header("authorization").as_deref(), Some("Bearer [HIDDEN]"));
}

#[tokio::test]
async fn test_set_remote_credential_registers_callbacks() {
    let hub = MockServer::start().await;
    mount_login(&hub, "tok-cred").await;
    Mock::given(method("POST"))
        .and(path("/api/yanlik/remote-credential"))
        .and(body_partial_json(json!({
            "credential": {
                "remote_url": "http://gateway.test/receive-nib",
                "remote_fileds": "http://gateway.test/receive-file-izin",
                "remote_receive_status": "http://gateway.test/receive-status"
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": true})))
        .expect(1)
        .mount(&hub)
        .await;

    let gateway = TestGateway::new(&test_config(&hub_url(&hub), &[]));
    let (status, body) = gateway.get("/set-remote-credential").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({"status": true}));
    assert_eq!(gateway.store.len(), 1);
}

// ============================================================================
// Authentication failure
// ============================================================================

#[tokio::test]
async fn test_login_failure_forwards_sentinel_token() {
    let hub = MockServer::start().await;
    mount_login_rejected(&hub).await;
    Mock::given(method("POST"))
        .and(path("/api/license-final"))
        .and(header("authorization", "Bearer no_token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Unauthenticated."})),
        )
        .expect(1)
        .mount(&hub)
        .await;

    let gateway = TestGateway::new(&test_config(&hub_url(&hub), &[]));
    let (status, body) = gateway.get("/license-final").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse(&body);
    assert_eq!(body["error"], "license final failed");
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("Client error: `POST "));
    assert!(message.contains("`401 Unauthorized`"));

    let rows = gateway.store.entries();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status_code.as_deref(), Some("500"));
    assert!(rows[0].response_body.as_deref().unwrap().contains("401"));
    assert_eq!(rows[0].request_header("authorization").as_deref(), Some("Bearer [HIDDEN]"));
}

#[tokio::test]
async fn test_login_failure_short_circuits_when_configured() {
    let hub = MockServer::start().await;
    mount_login_rejected(&hub).await;
    Mock::given(method("PUT"))
        .and(path("/api/license-update"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&hub)
        .await;

    let config = test_config(&hub_url(&hub), &[("OSSHUB_AUTH_FAILURE", "short_circuit")]);
    let gateway = TestGateway::new(&config);
    let (status, body) = gateway.get("/license-update").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse(&body);
    assert_eq!(body["error"], "license update failed");
    assert!(body["message"].as_str().unwrap().starts_with("Hub login failed"));

    let rows = gateway.store.entries();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status_code.as_deref(), Some("500"));
    assert_eq!(rows[0].method.as_deref(), Some("PUT"));
    assert!(rows[0].request_headers.is_none());
    assert!(rows[0].request_body.is_some());
}

// ============================================================================
// Audit failure policy
// ============================================================================

struct BrokenStore;

#[async_trait]
impl AuditStore for BrokenStore {
    async fn insert(&self, _entry: NewAuditEntry) -> ServerResult<AuditLog> {
        Err(ServerError::AuditStore("connection reset".to_string()))
    }

    async fn recent(&self, _limit: i64) -> ServerResult<Vec<AuditLog>> {
        Ok(Vec::new())
    }
}

async fn hub_with_health() -> MockServer {
    let hub = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "up"})))
        .mount(&hub)
        .await;
    hub
}

#[tokio::test]
async fn test_strict_audit_policy_fails_request() {
    let hub = hub_with_health().await;
    let config = test_config(&hub_url(&hub), &[("AUDIT_FAILURE_POLICY", "strict")]);
    let router = router_with_store(&config, Arc::new(BrokenStore), Payloads::defaults(APP_URL));

    let (status, body) = send(
        &router,
        axum::http::Request::get("/health").body(axum::body::Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = parse(&body);
    assert_eq!(body["error"], "audit log write failed");
    assert!(body["message"].as_str().unwrap().contains("connection reset"));
}

#[tokio::test]
async fn test_best_effort_audit_policy_keeps_response() {
    let hub = hub_with_health().await;
    let config = test_config(&hub_url(&hub), &[("AUDIT_FAILURE_POLICY", "best_effort")]);
    let router = router_with_store(&config, Arc::new(BrokenStore), Payloads::defaults(APP_URL));

    let (status, body) = send(
        &router,
        axum::http::Request::get("/health").body(axum::body::Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body), json!({"status": "up"}));
}
