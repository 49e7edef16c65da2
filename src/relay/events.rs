//! AG-UI lifecycle events emitted by the relay
//!
//! Each event serializes to one JSON object whose `type` field carries the
//! AG-UI event name and whose identifiers are snake_case:
//!
//! ```text
//! {"type":"RUN_STARTED","thread_id":"…","run_id":"…","timestamp":1700000000000}
//! {"type":"TEXT_MESSAGE_START","message_id":"…","role":"assistant","timestamp":…}
//! {"type":"TEXT_MESSAGE_CONTENT","message_id":"…","delta":"Hel","timestamp":…}
//! {"type":"TEXT_MESSAGE_END","message_id":"…","timestamp":…}
//! {"type":"RUN_FINISHED","thread_id":"…","run_id":"…","timestamp":…}
//! {"type":"RUN_ERROR","message":"…","timestamp":…}
//! ```

use serde::{Deserialize, Serialize};

/// Role of a streamed message. Generated replies are always from the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Assistant,
}

/// One AG-UI protocol event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    /// Signals the start of a run
    RunStarted {
        thread_id: String,
        run_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_run_id: Option<String>,
        timestamp: i64,
    },
    /// Opens an assistant message
    TextMessageStart {
        message_id: String,
        role: Role,
        timestamp: i64,
    },
    /// One non-empty fragment of the assistant message
    TextMessageContent {
        message_id: String,
        delta: String,
        timestamp: i64,
    },
    /// Closes the assistant message
    TextMessageEnd { message_id: String, timestamp: i64 },
    /// Signals successful completion of a run
    RunFinished {
        thread_id: String,
        run_id: String,
        timestamp: i64,
    },
    /// Signals that the run failed; nothing follows it
    RunError { message: String, timestamp: i64 },
}

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Event {
    pub fn run_started(
        thread_id: impl Into<String>,
        run_id: impl Into<String>,
        parent_run_id: Option<String>,
    ) -> Self {
        Event::RunStarted {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            parent_run_id,
            timestamp: now_millis(),
        }
    }

    pub fn text_message_start(message_id: impl Into<String>) -> Self {
        Event::TextMessageStart {
            message_id: message_id.into(),
            role: Role::Assistant,
            timestamp: now_millis(),
        }
    }

    pub fn text_message_content(message_id: impl Into<String>, delta: impl Into<String>) -> Self {
        Event::TextMessageContent {
            message_id: message_id.into(),
            delta: delta.into(),
            timestamp: now_millis(),
        }
    }

    pub fn text_message_end(message_id: impl Into<String>) -> Self {
        Event::TextMessageEnd {
            message_id: message_id.into(),
            timestamp: now_millis(),
        }
    }

    pub fn run_finished(thread_id: impl Into<String>, run_id: impl Into<String>) -> Self {
        Event::RunFinished {
            thread_id: thread_id.into(),
            run_id: run_id.into(),
            timestamp: now_millis(),
        }
    }

    pub fn run_error(message: impl Into<String>) -> Self {
        Event::RunError {
            message: message.into(),
            timestamp: now_millis(),
        }
    }

    /// AG-UI name of this event, as written in the `type` field
    pub fn event_type(&self) -> &'static str {
        match self {
            Event::RunStarted { .. } => "RUN_STARTED",
            Event::TextMessageStart { .. } => "TEXT_MESSAGE_START",
            Event::TextMessageContent { .. } => "TEXT_MESSAGE_CONTENT",
            Event::TextMessageEnd { .. } => "TEXT_MESSAGE_END",
            Event::RunFinished { .. } => "RUN_FINISHED",
            Event::RunError { .. } => "RUN_ERROR",
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Event::RunStarted { timestamp, .. }
            | Event::TextMessageStart { timestamp, .. }
            | Event::TextMessageContent { timestamp, .. }
            | Event::TextMessageEnd { timestamp, .. }
            | Event::RunFinished { timestamp, .. }
            | Event::RunError { timestamp, .. } => *timestamp,
        }
    }

    /// Message id carried by the text message events
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Event::TextMessageStart { message_id, .. }
            | Event::TextMessageContent { message_id, .. }
            | Event::TextMessageEnd { message_id, .. } => Some(message_id.as_str()),
            _ => None,
        }
    }

    /// True for RUN_FINISHED and RUN_ERROR
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::RunFinished { .. } | Event::RunError { .. })
    }
}
