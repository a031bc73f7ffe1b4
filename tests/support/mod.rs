#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use restorm::{CallStack, Registry, Result, Transport};

/// One request as the stub transport saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: &'static str,
    pub url: String,
    pub query: String,
    pub body: Value,
}

/// In-memory transport that records every request and answers from a
/// queue of canned responses. An empty queue answers `null`.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<VecDeque<Value>>,
    delete_result: Mutex<bool>,
    calls: Mutex<Vec<Recorded>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            delete_result: Mutex::new(true),
            ..Self::default()
        })
    }

    pub fn respond_with(self: &Arc<Self>, response: Value) -> Arc<Self> {
        self.responses.lock().unwrap().push_back(response);
        Arc::clone(self)
    }

    pub fn delete_succeeds(self: &Arc<Self>, success: bool) -> Arc<Self> {
        *self.delete_result.lock().unwrap() = success;
        Arc::clone(self)
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str, url: &str, query: &CallStack, body: Value) {
        self.calls.lock().unwrap().push(Recorded {
            method,
            url: url.to_string(),
            query: query.to_json().unwrap(),
            body,
        });
    }

    fn next_response(&self) -> Value {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Value::Null)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn get(&self, url: &str, query: &CallStack) -> Result<Value> {
        self.record("GET", url, query, Value::Null);
        Ok(self.next_response())
    }

    async fn post(&self, url: &str, data: &Value) -> Result<Value> {
        self.record("POST", url, &CallStack::new(), data.clone());
        Ok(self.next_response())
    }

    async fn put(&self, url: &str, data: &Value, query: &CallStack) -> Result<Value> {
        self.record("PUT", url, query, data.clone());
        Ok(self.next_response())
    }

    async fn delete(&self, url: &str, query: &CallStack) -> Result<bool> {
        self.record("DELETE", url, query, Value::Null);
        Ok(*self.delete_result.lock().unwrap())
    }
}

/// A registry wired to a fresh stub transport.
pub fn stub_registry() -> (Registry, Arc<StubTransport>) {
    let transport = StubTransport::new();
    let registry = Registry::new(transport.clone());
    (registry, transport)
}
