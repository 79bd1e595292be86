//! Shared helpers for gateway integration tests
//!
//! The hub is played by a `wiremock::MockServer` mounted under `/api`, and
//! audit rows land in a `MemoryAuditStore` the test can inspect.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use osshub_server::{
    api::{create_router, AppState},
    audit::{AuditStore, MemoryAuditStore},
    config::Config,
    relay::Payloads,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{
    matchers::{body_string_contains, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const APP_URL: &str = "http://gateway.test";
pub const HUB_USERNAME: &str = "gateway";
pub const HUB_PASSWORD: &str = "s3cret-password";

/// An address nothing listens on
pub const UNREACHABLE_HUB: &str = "http://127.0.0.1:1/api";

/// Configuration pointing at `hub_url`, with optional overrides
pub fn test_config(hub_url: &str, overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("OSSHUB_ENDPOINT".to_string(), hub_url.to_string()),
        ("OSSHUB_USERNAME".to_string(), HUB_USERNAME.to_string()),
        ("OSSHUB_PASSWORD".to_string(), HUB_PASSWORD.to_string()),
        ("OSSHUB_TIMEOUT_SECS".to_string(), "5".to_string()),
        ("APP_URL".to_string(), APP_URL.to_string()),
        ("AUDIT_STORE".to_string(), "memory".to_string()),
        ("CORS_ALLOWED_ORIGINS".to_string(), "*".to_string()),
    ]);
    for (key, value) in overrides {
        vars.insert(key.to_string(), value.to_string());
    }

    let config = Config::from_lookup(|key| vars.get(key).cloned()).unwrap();
    config.validate().unwrap();
    config
}

/// Base URL of the mock hub
pub fn hub_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// A router wired to an in-memory audit store
pub struct TestGateway {
    pub router: Router,
    pub store: Arc<MemoryAuditStore>,
}

impl TestGateway {
    pub fn new(config: &Config) -> Self {
        Self::with_payloads(config, Payloads::defaults(APP_URL))
    }

    pub fn with_payloads(config: &Config, payloads: Payloads) -> Self {
        let store = Arc::new(MemoryAuditStore::new());
        let router = router_with_store(config, store.clone(), payloads);
        Self { router, store }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, String) {
        send(&self.router, Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .header("user-agent", "GuzzleHttp/7")
            .header("x-forwarded-for", "10.20.30.40")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(&self.router, request).await
    }
}

pub fn router_with_store(
    config: &Config,
    store: Arc<dyn AuditStore>,
    payloads: Payloads,
) -> Router {
    let state = AppState::new(config, store, payloads).unwrap();
    create_router(state, config)
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

pub fn parse(body: &str) -> Value {
    serde_json::from_str(body).unwrap()
}

/// Hub login that issues `token` for the test credentials
pub async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_string_contains(format!("username={}", HUB_USERNAME)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": token,
            "token_type": "bearer",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

/// Hub login that rejects every attempt
pub async fn mount_login_rejected(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Invalid credentials"})),
        )
        .mount(server)
        .await;
}
