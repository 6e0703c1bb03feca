#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use stables_live_store::{LiveStoreConfig, LiveStoreError, Transport, TransportResponse};
use tokio::sync::oneshot;
use tokio::time::Instant;

/// What the scripted transport does for one request.
pub enum Step {
    Respond(TransportResponse),
    /// Hangs until the test sends a response. Dropping the sender fails the
    /// request as cancelled.
    Gate(oneshot::Receiver<TransportResponse>),
}

#[derive(Clone, Debug)]
pub struct Call {
    pub path: String,
    pub validator: Option<String>,
    pub at: Instant,
}

/// Transport that replays scripted responses per path and records every call.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<HashMap<String, VecDeque<Step>>>,
    fallback: Mutex<HashMap<String, TransportResponse>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, path: &str, step: Step) {
        self.steps
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(step);
    }

    pub fn respond(&self, path: &str, response: TransportResponse) {
        self.push(path, Step::Respond(response));
    }

    /// Creates a gated step and returns the sender that releases it.
    pub fn gate(&self, path: &str) -> oneshot::Sender<TransportResponse> {
        let (sender, receiver) = oneshot::channel();
        self.push(path, Step::Gate(receiver));
        sender
    }

    /// Response used once the script for `path` runs dry.
    pub fn fallback(&self, path: &str, response: TransportResponse) {
        self.fallback
            .lock()
            .unwrap()
            .insert(path.to_string(), response);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Offsets of every call from `origin`, in milliseconds.
    pub fn call_offsets_ms(&self, origin: Instant) -> Vec<u128> {
        self.calls()
            .iter()
            .map(|call| call.at.duration_since(origin).as_millis())
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        path: &str,
        validator: Option<&str>,
    ) -> Result<TransportResponse, LiveStoreError> {
        self.calls.lock().unwrap().push(Call {
            path: path.to_string(),
            validator: validator.map(str::to_string),
            at: Instant::now(),
        });

        let step = self
            .steps
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(VecDeque::pop_front);

        match step {
            Some(Step::Respond(response)) => Ok(response),
            Some(Step::Gate(receiver)) => receiver.await.map_err(|_| LiveStoreError::Cancelled),
            None => Ok(self
                .fallback
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .unwrap_or_else(|| TransportResponse::new(500, Vec::new()))),
        }
    }
}

pub fn ok_json(value: serde_json::Value) -> TransportResponse {
    TransportResponse::new(200, serde_json::to_vec(&value).unwrap())
}

pub fn balances(phorse: &str, medals: u64) -> TransportResponse {
    ok_json(json!({ "phorse": phorse, "wron": "0", "medals": medals }))
}

pub fn server_error() -> TransportResponse {
    TransportResponse::new(500, br#"{"error": "Internal server error"}"#.to_vec())
}

pub fn horse(id: u32, name: &str, energy: u32) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "level": 1,
        "energy": energy,
        "maxEnergy": 12,
        "status": "idle"
    })
}

/// Fixed schedule: no jitter, so offsets are exact.
pub fn fixed_config(base_ms: u64, max_backoff_ms: u64) -> LiveStoreConfig {
    LiveStoreConfig::default()
        .with_poll_base(Duration::from_millis(base_ms))
        .with_jitter_ratio(0.0)
        .with_max_backoff(Duration::from_millis(max_backoff_ms))
}

/// Lets the driver process everything queued so far.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub fn assert_offsets(actual: &[u128], expected: &[u128]) {
    assert_eq!(actual.len(), expected.len(), "calls at {:?}", actual);
    for (a, e) in actual.iter().zip(expected) {
        assert!(
            a.abs_diff(*e) <= 5,
            "expected a call near {}ms, got {:?}",
            e,
            actual
        );
    }
}
