//! Authenticated JSON transport to the upstream platform.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::GatewayConfig;
use crate::error::GatewayError;

/// Point in time by which an upstream call must have settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Instant,
}

impl Deadline {
    /// Deadline `timeout` from now.
    #[must_use]
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
        }
    }

    /// The instant this deadline expires.
    #[must_use]
    pub fn instant(&self) -> Instant {
        self.at
    }

    /// Time left before expiry (zero once expired).
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.at.saturating_duration_since(Instant::now())
    }
}

/// A single request against the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamCall {
    /// HTTP method.
    pub method: Method,
    /// Path relative to the configured base URL.
    pub path: String,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Deadline for the whole exchange, including reading the body.
    pub deadline: Deadline,
}

impl UpstreamCall {
    /// Body-less GET.
    #[must_use]
    pub fn get(path: impl Into<String>, deadline: Deadline) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
            deadline,
        }
    }

    /// Body-less POST.
    #[must_use]
    pub fn post(path: impl Into<String>, deadline: Deadline) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            body: None,
            deadline,
        }
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Issues calls against the upstream platform and returns the decoded JSON.
///
/// The returned value is untyped; callers narrow it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute one call. Never retries.
    async fn request(&self, call: UpstreamCall) -> Result<Value, GatewayError>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    /// HTTP client.
    client: Client,
    /// Base URL and credential.
    config: GatewayConfig,
}

impl HttpTransport {
    /// Create a new transport for the given configuration.
    ///
    /// # Errors
    /// Returns error if HTTP client cannot be created.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// Handle API response, parsing JSON or error.
    async fn handle_response(response: reqwest::Response) -> Result<Value, GatewayError> {
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(GatewayError::UpstreamHttp {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            warn!(error = %e, body = %text, "Failed to parse upstream response");
            GatewayError::Decode(e)
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(&self, call: UpstreamCall) -> Result<Value, GatewayError> {
        let url = self.config.endpoint(&call.path)?;
        let started = Instant::now();
        debug!(
            method = %call.method,
            url = %url,
            remaining_ms = call.deadline.remaining().as_millis(),
            "Upstream request"
        );

        let mut builder = self
            .client
            .request(call.method.clone(), url)
            .bearer_auth(&self.config.api_token)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");

        if let Some(body) = &call.body {
            builder = builder.json(body);
        }

        let exchange = async {
            let response = builder.send().await?;
            Self::handle_response(response).await
        };

        let result = match tokio::time::timeout_at(call.deadline.instant(), exchange).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::DeadlineExceeded {
                path: call.path.clone(),
                elapsed_ms: started.elapsed().as_millis(),
            }),
        };

        let elapsed_ms = started.elapsed().as_millis();
        match &result {
            Ok(_) => info!(
                method = %call.method,
                path = %call.path,
                elapsed_ms,
                "Upstream request succeeded"
            ),
            Err(e) => warn!(
                method = %call.method,
                path = %call.path,
                status = e.status(),
                elapsed_ms,
                error = %e,
                "Upstream request failed"
            ),
        }

        result
    }
}
