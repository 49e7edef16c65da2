//! Run state machine: one agent exchange → one ordered event stream
//!
//! ```text
//! RUN_STARTED → TEXT_MESSAGE_START → TEXT_MESSAGE_CONTENT* → TEXT_MESSAGE_END → RUN_FINISHED
//!                        │                     │
//!                        └──── agent fails ────┴──► RUN_ERROR (stream ends)
//! ```

use std::pin::Pin;
use std::sync::Arc;

use futures_util::stream::{self, Stream, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::events::Event;
use crate::agent::Agent;

/// Ordered events of one run. Dropping it abandons the run.
pub type EventStream = Pin<Box<dyn Stream<Item = Event> + Send>>;

/// Generate a fresh identifier for threads, runs and messages
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Input to a single run
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    pub message: String,
    pub thread_id: String,
    pub run_id: String,
    pub parent_run_id: Option<String>,
}

impl RunRequest {
    /// A run in a new thread, with generated thread and run ids
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            thread_id: new_id(),
            run_id: new_id(),
            parent_run_id: None,
        }
    }

    pub fn with_thread_id(mut self, thread_id: impl Into<String>) -> Self {
        self.thread_id = thread_id.into();
        self
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    pub fn with_parent_run_id(mut self, parent_run_id: Option<String>) -> Self {
        self.parent_run_id = parent_run_id;
        self
    }
}

/// Relay one run of `agent` as AG-UI events.
///
/// Events are produced lazily, so each one reaches the transport as soon as
/// the agent makes it possible. Empty and null fragments are dropped. Any agent
/// failure becomes a single RUN_ERROR and ends the stream.
pub fn relay_run(agent: Arc<dyn Agent>, request: RunRequest) -> EventStream {
    let RunRequest {
        message,
        thread_id,
        run_id,
        parent_run_id,
    } = request;

    let events = async_stream::stream! {
        info!(thread_id = %thread_id, run_id = %run_id, "Run started");
        yield Event::run_started(&thread_id, &run_id, parent_run_id);

        let message_id = new_id();
        yield Event::text_message_start(&message_id);

        let mut fragments = match agent.run_stream(&message).await {
            Ok(fragments) => fragments,
            Err(e) => {
                warn!(run_id = %run_id, error = %e, "Agent failed to start");
                yield Event::run_error(e.to_string());
                return;
            }
        };

        let mut relayed = 0usize;
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(Some(delta)) if !delta.is_empty() => {
                    relayed += 1;
                    yield Event::text_message_content(&message_id, delta);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(run_id = %run_id, error = %e, fragments = relayed, "Agent failed mid-stream");
                    yield Event::run_error(e.to_string());
                    return;
                }
            }
        }

        yield Event::text_message_end(&message_id);
        debug!(run_id = %run_id, fragments = relayed, "Message complete");
        yield Event::run_finished(&thread_id, &run_id);
        info!(thread_id = %thread_id, run_id = %run_id, "Run finished");
    };

    Box::pin(events)
}

/// A stream holding a single RUN_ERROR, for input rejected before a run starts
pub fn reject(message: impl Into<String>) -> EventStream {
    Box::pin(stream::once(futures_util::future::ready(Event::run_error(
        message,
    ))))
}
