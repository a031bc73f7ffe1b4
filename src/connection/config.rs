use std::time::Duration;

use crate::core::{Error, Result};

/// REST connection configuration
///
/// Collects the base URL and the fixed security contract of the REST
/// binding: same-origin credentials (cookies) plus an anti-forgery token
/// header when one is available.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Base URL that relative endpoints are resolved against
    pub base_url: String,

    /// Value for the `X-XSRF-TOKEN` header. In a browser this would be
    /// read from the same-named cookie; here the host application hands
    /// it in explicitly.
    pub xsrf_token: Option<String>,

    /// Bearer token for the `Authorization` header
    pub bearer_token: Option<String>,

    /// Per-request timeout
    pub timeout: Duration,
}

impl ConnectionConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            xsrf_token: None,
            bearer_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the anti-forgery token
    pub fn xsrf_token(mut self, token: &str) -> Self {
        self.xsrf_token = Some(token.to_string());
        self
    }

    /// Set the bearer token
    pub fn bearer_token(mut self, token: &str) -> Self {
        self.bearer_token = Some(token.to_string());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Configuration("base_url cannot be empty".into()));
        }

        Ok(())
    }

    /// Resolve an endpoint against the base URL. Absolute endpoints are
    /// used as-is.
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }

        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}
