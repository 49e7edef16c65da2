//! Request/response types for Ollama's `/api/chat` endpoint

use serde::{Deserialize, Serialize};

/// A message in a chat conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "system", "user", "assistant"
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// One line of the `/api/chat` response.
///
/// Non-streaming calls return a single object of this shape; streaming calls
/// return one per line, the last carrying `done: true` and the eval counters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub eval_count: u32,
    #[serde(default)]
    pub prompt_eval_count: u32,
    #[serde(default)]
    pub eval_duration: u64,
    /// Set by Ollama instead of `message` when the request fails mid-stream
    #[serde(default)]
    pub error: Option<String>,
}

impl ChatResponse {
    /// Text carried by this line, empty when there is none
    pub fn content(&self) -> &str {
        self.message.as_ref().map(|m| m.content.as_str()).unwrap_or("")
    }

    pub fn stats(&self) -> ChatStats {
        ChatStats {
            eval_count: self.eval_count,
            prompt_eval_count: self.prompt_eval_count,
            eval_duration_ns: self.eval_duration,
        }
    }
}

/// Token/timing metadata from the final chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChatStats {
    /// Number of tokens generated
    pub eval_count: u32,
    /// Number of tokens in the prompt
    pub prompt_eval_count: u32,
    /// Time spent generating tokens (nanoseconds)
    pub eval_duration_ns: u64,
}

/// A single item from the streaming response.
///
/// Either a token fragment (possibly empty) or the final metadata.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    /// A token fragment from the model's response
    Token(String),
    /// The final message containing timing/count metadata
    Done(ChatStats),
}

/// Error type for chat operations
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Ollama returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Ollama error: {0}")]
    Backend(String),
    #[error("Empty response from Ollama")]
    EmptyResponse,
}
