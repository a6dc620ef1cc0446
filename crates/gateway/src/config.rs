//! Configuration for the upstream platform connection.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::GatewayError;

/// Default per-operation deadline.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the upstream platform.
///
/// Built once at startup and handed to [`crate::HttpTransport`]; nothing in
/// the crate reads process-wide state after that.
#[derive(Clone)]
pub struct GatewayConfig {
    /// API base URL, e.g. `https://deploy.example.com/api/v1`.
    pub base_url: Url,
    /// Bearer token sent on every request.
    pub api_token: String,
    /// Deadline applied to each gateway operation.
    pub request_timeout: Duration,
}

impl GatewayConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    /// Returns [`GatewayError::Config`] if the URL does not parse, is not
    /// http(s), or the token is empty.
    pub fn new(
        base_url: &str,
        api_token: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| GatewayError::Config(format!("invalid base URL '{base_url}': {e}")))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(GatewayError::Config(format!(
                "base URL must be http or https, got '{}'",
                base_url.scheme()
            )));
        }

        // Relative joins drop the last segment unless the path ends with '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(GatewayError::Config("API token must not be empty".to_string()));
        }

        if request_timeout.is_zero() {
            return Err(GatewayError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            base_url,
            api_token,
            request_timeout,
        })
    }

    /// Resolve an endpoint path (e.g. `/projects/abc`) against the base URL.
    ///
    /// # Errors
    /// Returns [`GatewayError::Config`] if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url, GatewayError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| GatewayError::Config(format!("invalid endpoint '{path}': {e}")))
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
