//! HTTP transport to the OSSHUB licensing hub
//!
//! [`HubClient`] resolves operation paths against the configured base
//! endpoint and turns every non-2xx answer into a [`HubError::Status`]
//! whose message carries the method, the full URL, the status line and a
//! truncated copy of the body.

pub mod token;

use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::audit::headers_to_json;
use crate::config::HubConfig;

pub use token::{AccessToken, TokenError, TokenProvider, NO_TOKEN};

/// Longest response body excerpt kept in a status error message
pub const ERROR_BODY_EXCERPT_LEN: usize = 120;

/// Errors raised while talking to the hub
#[derive(Debug, Error)]
pub enum HubError {
    /// DNS, connect, TLS or timeout failure; no response was received
    #[error("Unable to reach `{method} {url}`: {}", error_chain(.source))]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The hub answered with a non-2xx status
    #[error("{}: `{method} {url}` resulted in a `{status} {reason}` response: {}", status_class(.status), excerpt(.body))]
    Status {
        method: String,
        url: String,
        status: u16,
        reason: String,
        body: String,
    },

    /// The response arrived but its body could not be read
    #[error("Failed to read response body of `{method} {url}`: {}", error_chain(.source))]
    Body {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build hub HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl HubError {
    /// HTTP status returned by the hub, if one was received
    pub fn status(&self) -> Option<u16> {
        match self {
            HubError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

fn status_class(status: &u16) -> &'static str {
    match *status {
        400..=499 => "Client error",
        500..=599 => "Server error",
        _ => "Unexpected response",
    }
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let cut: String = body.chars().take(ERROR_BODY_EXCERPT_LEN).collect();
    format!("{} (truncated...)", cut)
}

fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// A successful (2xx) hub response
#[derive(Debug, Clone)]
pub struct HubResponse {
    pub status: u16,
    /// Response headers as `name -> [values]`
    pub headers: JsonValue,
    pub body: String,
}

/// HTTP client bound to one hub base endpoint
#[derive(Clone)]
pub struct HubClient {
    http: Client,
    base_url: String,
}

impl HubClient {
    pub fn new(config: &HubConfig) -> Result<Self, HubError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(HubError::Client)?;

        Ok(Self {
            http,
            base_url: normalize_base(&config.endpoint),
        })
    }

    /// Full URL of an operation path relative to the base endpoint
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request with explicit headers and an optional JSON body
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        headers: &BTreeMap<String, String>,
        body: Option<&JsonValue>,
    ) -> Result<HubResponse, HubError> {
        let url = self.endpoint(path);

        let mut request = self.http.request(method.clone(), &url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            request = request.body(body.to_string());
        }

        self.execute(method, url, request).await
    }

    /// POST a form-encoded body
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<HubResponse, HubError> {
        let url = self.endpoint(path);
        let request = self.http.post(&url).form(form);
        self.execute(Method::POST, url, request).await
    }

    async fn execute(
        &self,
        method: Method,
        url: String,
        request: RequestBuilder,
    ) -> Result<HubResponse, HubError> {
        debug!(method = %method, url = %url, "Sending hub request");

        let response = match request.send().await {
            Ok(response) => response,
            Err(source) => {
                return Err(HubError::Transport {
                    method: method.to_string(),
                    url,
                    source,
                })
            },
        };

        let status = response.status();
        let headers = headers_to_json(response.headers());
        let body = match response.text().await {
            Ok(body) => body,
            Err(source) => {
                return Err(HubError::Body {
                    method: method.to_string(),
                    url,
                    source,
                })
            },
        };

        debug!(method = %method, url = %url, status = status.as_u16(), "Hub responded");

        if !status.is_success() {
            return Err(HubError::Status {
                method: method.to_string(),
                url,
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body,
            });
        }

        Ok(HubResponse {
            status: status.as_u16(),
            headers,
            body,
        })
    }
}

fn normalize_base(endpoint: &str) -> String {
    let trimmed = endpoint.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    }
}
