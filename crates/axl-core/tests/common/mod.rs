//! Scripted transport shared by the integration tests

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use axl_core::{AxlClient, AxlTransport, AxlValue, TransportError};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// Transport that answers from per-procedure queues and records every request
///
/// A procedure with nothing queued fails with a SOAP fault, the way the
/// server answers a procedure it does not know.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<HashMap<String, VecDeque<Result<AxlValue, TransportError>>>>,
    requests: Mutex<Vec<(String, AxlValue)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply for `procedure`
    pub fn reply(self, procedure: &str, reply: Value) -> Self {
        self.push(procedure, Ok(AxlValue::from(reply)));
        self
    }

    /// Queue a SOAP fault for `procedure`
    pub fn fault(self, procedure: &str, message: &str) -> Self {
        self.push(
            procedure,
            Err(TransportError::Fault {
                code: "soapenv:Server".to_string(),
                message: message.to_string(),
            }),
        );
        self
    }

    fn push(&self, procedure: &str, outcome: Result<AxlValue, TransportError>) {
        self.replies
            .lock()
            .entry(procedure.to_string())
            .or_default()
            .push_back(outcome);
    }

    /// Procedure names in call order
    pub fn procedures(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Every request sent to `procedure`, in call order
    pub fn requests_to(&self, procedure: &str) -> Vec<AxlValue> {
        self.requests
            .lock()
            .iter()
            .filter(|(p, _)| p == procedure)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl AxlTransport for MockTransport {
    async fn invoke(&self, procedure: &str, request: &AxlValue) -> Result<AxlValue, TransportError> {
        self.requests
            .lock()
            .push((procedure.to_string(), request.clone()));

        self.replies
            .lock()
            .get_mut(procedure)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| {
                Err(TransportError::Fault {
                    code: "soapenv:Client".to_string(),
                    message: format!("Unknown procedure {}", procedure),
                })
            })
    }
}

pub fn client(transport: MockTransport) -> AxlClient<MockTransport> {
    AxlClient::new(transport)
}

/// `{return: {tag: [records]}}`, collapsing a single record the way AXL does
pub fn list_reply(tag: &str, records: Vec<Value>) -> Value {
    let inner = match records.len() {
        0 => return json!({"return": ""}),
        1 => records.into_iter().next().unwrap_or(Value::Null),
        _ => Value::Array(records),
    };
    json!({"return": {tag: inner}})
}

/// `{return: {tag: record}}` as returned by `get<Type>`
pub fn get_reply(tag: &str, record: Value) -> Value {
    json!({"return": {tag: record}})
}

/// `{return: value}` as returned by add, update and remove
pub fn ack(value: &str) -> Value {
    json!({"return": value})
}

/// AxlValue from JSON, for comparing requests
pub fn axl(value: Value) -> AxlValue {
    AxlValue::from(value)
}
