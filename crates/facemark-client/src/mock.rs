//! Scripted in-memory transport for tests and offline demos.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use facemark_types::{outcome::ServiceResponse, Result};
use serde_json::Value;

use crate::{classify_reply, transport_error, Transport};

/// Canned answer for one path.
#[derive(Debug, Clone)]
pub enum Reply {
    Status { status: u16, body: String },
    Unreachable,
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Reply::Status {
            status: 200,
            body: value.to_string(),
        }
    }

    pub fn status(status: u16, value: Value) -> Self {
        Reply::Status {
            status,
            body: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// Answers each path with its scripted [`Reply`], every time it is asked,
/// and records the calls in order.
#[derive(Clone, Default)]
pub struct MockTransport {
    replies: Arc<Mutex<HashMap<String, Reply>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(self, path: &str, reply: Reply) -> Self {
        self.set_reply(path, reply);
        self
    }

    pub fn set_reply(&self, path: &str, reply: Reply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.insert(path.to_string(), reply);
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn count(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.path == path).count()
    }

    fn answer(&self, method: &'static str, path: &str, body: Option<&Value>) -> Result<ServiceResponse> {
        self.calls
            .lock()
            .map_err(|_| transport_error("mock call log poisoned"))?
            .push(RecordedCall {
                method,
                path: path.to_string(),
                body: body.cloned(),
            });

        let reply = self
            .replies
            .lock()
            .map_err(|_| transport_error("mock replies poisoned"))?
            .get(path)
            .cloned();
        match reply {
            Some(Reply::Status { status, body }) => classify_reply(status, &body),
            Some(Reply::Unreachable) => Err(transport_error(format!("{method} {path}: connection refused"))),
            None => Err(transport_error(format!("{method} {path}: no scripted reply"))),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_json(&self, path: &str) -> Result<ServiceResponse> {
        self.answer("GET", path, None)
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<ServiceResponse> {
        self.answer("POST", path, Some(body))
    }
}
