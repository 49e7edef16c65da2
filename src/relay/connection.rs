//! Per-connection state for the persistent (WebSocket) transport
//!
//! A connection owns one `thread_id` for its whole life. Every inbound frame
//! starts a new run in that thread with its own `run_id` and `message_id`.
//! Bad frames produce a RUN_ERROR and leave the connection usable.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use super::run::{new_id, reject, relay_run, EventStream, RunRequest};
use crate::agent::Agent;

/// Error text for frames that are not valid JSON
pub const INVALID_JSON: &str = "Invalid JSON format";
/// Error text for frames without a usable `message` field
pub const NO_MESSAGE: &str = "No message provided";

/// One persistent chat connection
#[derive(Debug)]
pub struct Connection {
    thread_id: String,
    runs_started: usize,
}

impl Connection {
    /// Open a connection with a freshly generated thread id
    pub fn open() -> Self {
        Self::with_thread_id(new_id())
    }

    pub fn with_thread_id(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            runs_started: 0,
        }
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Number of frames that started a run (rejected frames excluded)
    pub fn runs_started(&self) -> usize {
        self.runs_started
    }

    /// Turn one inbound frame `{"message": ..., "user_id": ...}` into events.
    ///
    /// The caller must drain (or drop) the returned stream before handling
    /// the next frame, which keeps runs on one connection strictly sequential.
    pub fn handle_frame(&mut self, agent: Arc<dyn Agent>, frame: &str) -> EventStream {
        let payload: Value = match serde_json::from_str(frame) {
            Ok(payload) => payload,
            Err(e) => {
                debug!(thread_id = %self.thread_id, error = %e, "Rejecting unparseable frame");
                return reject(INVALID_JSON);
            }
        };

        let message = match payload.get("message").and_then(Value::as_str) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => {
                debug!(thread_id = %self.thread_id, "Rejecting frame without message");
                return reject(NO_MESSAGE);
            }
        };

        if let Some(user_id) = payload.get("user_id").and_then(Value::as_str) {
            debug!(thread_id = %self.thread_id, user_id, "Frame received");
        }

        self.runs_started += 1;
        let request = RunRequest::new(message).with_thread_id(self.thread_id.clone());
        relay_run(agent, request)
    }
}
