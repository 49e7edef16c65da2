//! Ollama LLM integration module
//!
//! This module provides a client for Ollama's `/api/chat` endpoint, both as a
//! single-shot call and as an NDJSON token stream.

pub mod client;
pub mod types;

// Re-export public types so callers can write `crate::ollama::StreamChunk`
pub use client::OllamaClient;
pub use types::{ChatError, ChatMessage, ChatResponse, ChatStats, StreamChunk};
