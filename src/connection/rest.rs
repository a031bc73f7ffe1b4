use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::connection::{ConnectionConfig, Transport};
use crate::core::Result;
use crate::query::CallStack;

/// RESTful JSON transport.
///
/// Sends queries to an endpoint over HTTP using RESTful conventions; the
/// recorded call stack, when present, travels JSON-encoded in a single
/// `query` URL parameter. Every request carries `Accept: application/json`
/// and, when configured, the `X-XSRF-TOKEN` and `Authorization` headers.
/// Cookies are persisted across requests, standing in for the browser's
/// same-origin credentials.
pub struct RestConnection {
    config: ConnectionConfig,
    client: Client,
}

impl RestConnection {
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    fn request(&self, method: Method, url: &str, query: &CallStack) -> Result<RequestBuilder> {
        let url = self.config.url_for(url);
        debug!(%method, %url, calls = query.len(), "sending request");

        let mut request = self
            .client
            .request(method, &url)
            .header(ACCEPT, "application/json");

        if let Some(token) = &self.config.xsrf_token {
            request = request.header("X-XSRF-TOKEN", token);
        }

        if let Some(token) = &self.config.bearer_token {
            request = request.bearer_auth(token);
        }

        if !query.is_empty() {
            request = request.query(&[("query", query.to_json()?)]);
        }

        Ok(request)
    }

    /// Extract JSON from a response body. An empty body becomes `null`
    /// rather than a parse error, since some write endpoints answer with
    /// no content.
    async fn unwrap(response: Response) -> Result<Value> {
        let text = response.error_for_status()?.text().await?;

        if text.is_empty() {
            return Ok(Value::Null);
        }

        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl Transport for RestConnection {
    async fn get(&self, url: &str, query: &CallStack) -> Result<Value> {
        let response = self.request(Method::GET, url, query)?.send().await?;
        Self::unwrap(response).await
    }

    async fn post(&self, url: &str, data: &Value) -> Result<Value> {
        let response = self
            .request(Method::POST, url, &CallStack::new())?
            .json(data)
            .send()
            .await?;
        Self::unwrap(response).await
    }

    async fn put(&self, url: &str, data: &Value, query: &CallStack) -> Result<Value> {
        let response = self
            .request(Method::PUT, url, query)?
            .json(data)
            .send()
            .await?;
        Self::unwrap(response).await
    }

    async fn delete(&self, url: &str, query: &CallStack) -> Result<bool> {
        let response = self.request(Method::DELETE, url, query)?.send().await?;
        Ok(response.status() == StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;

    #[test]
    fn test_new_validates_config() {
        let result = RestConnection::new(ConnectionConfig::new(""));
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_new_with_valid_config() {
        let connection = RestConnection::new(ConnectionConfig::new("http://localhost")).unwrap();
        assert_eq!(connection.config().base_url, "http://localhost");
    }
}
