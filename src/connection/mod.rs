pub mod config;
pub mod rest;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::Result;
use crate::query::CallStack;

pub use config::ConnectionConfig;
pub use rest::RestConnection;

/// The seam between the query layer and the wire.
///
/// A transport turns an (url, call stack) pair into an HTTP exchange and
/// hands back parsed JSON. It is a thin, stateless conduit: no retries,
/// no caching, no rate limiting. Network failures propagate unchanged.
///
/// Implement this to swap the HTTP stack out, e.g. with a canned-response
/// stub in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET the url, appending a non-empty stack as the `query` parameter.
    async fn get(&self, url: &str, query: &CallStack) -> Result<Value>;

    /// POST `data` as a JSON body.
    async fn post(&self, url: &str, data: &Value) -> Result<Value>;

    /// PUT `data` as a JSON body, with the stack in the query string.
    /// Used for single-record updates and stack-driven bulk updates alike.
    async fn put(&self, url: &str, data: &Value, query: &CallStack) -> Result<Value>;

    /// DELETE the url with the stack in the query string. Success is
    /// judged purely by a 200 status, independent of the body.
    async fn delete(&self, url: &str, query: &CallStack) -> Result<bool>;
}
