//! Hub authentication
//!
//! One login call per authenticated operation; tokens are never cached.

use serde::Deserialize;
use serde_json::json;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

use super::{HubClient, HubError};
use crate::config::HubConfig;
use crate::redaction::{redact_credentials, HIDDEN};

/// Login path relative to the hub base endpoint
pub const LOGIN_PATH: &str = "auth/login";

/// Value rendered by [`TokenProvider::get_token`] when login fails
pub const NO_TOKEN: &str = "no_token";

/// Why a login attempt did not yield a token
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Hub login failed: {0}")]
    Hub(#[from] HubError),

    #[error("Hub login response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Hub login response has no access_token")]
    MissingAccessToken,
}

/// Bearer token issued by the hub
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Authorization` header value
    pub fn bearer(&self) -> String {
        bearer(&self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&HIDDEN).finish()
    }
}

pub(crate) fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    access_token: Option<String>,
}

/// Obtains bearer tokens from the hub login endpoint
#[derive(Clone)]
pub struct TokenProvider {
    client: HubClient,
    username: String,
    password: String,
}

impl TokenProvider {
    pub fn new(client: HubClient, config: &HubConfig) -> Self {
        Self {
            client,
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Perform one login call
    pub async fn acquire(&self) -> Result<AccessToken, TokenError> {
        let form = json!({ "username": self.username, "password": self.password });
        debug!(
            endpoint = %self.client.endpoint(LOGIN_PATH),
            form = %redact_credentials(&form),
            "Requesting hub access token"
        );

        let response = self
            .client
            .post_form(
                LOGIN_PATH,
                &[("username", self.username.as_str()), ("password", self.password.as_str())],
            )
            .await?;

        let login: LoginResponse = serde_json::from_str(&response.body)?;

        login
            .access_token
            .filter(|token| !token.is_empty())
            .map(AccessToken)
            .ok_or(TokenError::MissingAccessToken)
    }

    /// Token string, or [`NO_TOKEN`] on any failure
    ///
    /// Failures are logged at `warn` and never audited.
    pub async fn get_token(&self) -> String {
        match self.acquire().await {
            Ok(token) => token.0,
            Err(e) => {
                warn!(error = %e, "Hub login failed, falling back to sentinel token");
                NO_TOKEN.to_string()
            },
        }
    }
}
