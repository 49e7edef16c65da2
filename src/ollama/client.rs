//! Ollama API client for chat completion

use futures_util::stream::{Stream, StreamExt};
use std::pin::Pin;

use super::types::{ChatError, ChatMessage, ChatResponse, StreamChunk};

/// Boxed stream of chunks returned by [`OllamaClient::chat_stream`]
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, ChatError>> + Send>>;

/// Client for interacting with Ollama's HTTP API
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a new Ollama client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the Ollama server (e.g., "http://localhost:11434")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// POST to `/api/chat` and fail on a non-2xx status
    async fn post_chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        stream: bool,
    ) -> Result<reqwest::Response, ChatError> {
        let endpoint = format!("{}/api/chat", self.base_url);

        let response = self
            .client
            .post(&endpoint)
            .json(&serde_json::json!({
                "model": model,
                "messages": messages,
                "stream": stream,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChatError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response)
    }

    /// Stream a chat completion from Ollama
    ///
    /// # Returns
    /// A stream of `StreamChunk` items - `Token(String)` for each generated
    /// fragment (which may be empty), then `Done(ChatStats)` once.
    ///
    /// Ollama sends one JSON object per line, but HTTP chunk boundaries do not
    /// line up with those lines, so bytes are buffered until a newline arrives.
    pub async fn chat_stream(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
    ) -> Result<ChunkStream, ChatError> {
        let mut bytes_stream = self.post_chat(&messages, model, true).await?.bytes_stream();

        let chunk_stream = async_stream::stream! {
            let mut buf: Vec<u8> = Vec::new();

            while let Some(chunk_result) = bytes_stream.next().await {
                let bytes = match chunk_result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(ChatError::from(e));
                        return;
                    }
                };
                buf.extend_from_slice(&bytes);

                for line in drain_lines(&mut buf) {
                    match parse_line(&line) {
                        Ok(Some(chunk)) => yield Ok(chunk),
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }

            // Trailing line without a newline
            match parse_line(&buf) {
                Ok(Some(chunk)) => yield Ok(chunk),
                Ok(None) => {}
                Err(e) => yield Err(e),
            }
        };

        Ok(Box::pin(chunk_stream))
    }

    /// Generate a complete (non-streaming) chat reply
    pub async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
    ) -> Result<ChatResponse, ChatError> {
        let text = self.post_chat(&messages, model, false).await?.text().await?;

        if text.is_empty() {
            return Err(ChatError::EmptyResponse);
        }

        let chat_response: ChatResponse = serde_json::from_str(&text)?;
        if let Some(error) = chat_response.error {
            return Err(ChatError::Backend(error));
        }
        Ok(chat_response)
    }
}

/// Remove every complete (newline-terminated) line from `buf`
fn drain_lines(buf: &mut Vec<u8>) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    while let Some(pos) = buf.iter().position(|b| *b == b'\n') {
        let mut line: Vec<u8> = buf.drain(..=pos).collect();
        line.pop();
        lines.push(line);
    }
    lines
}

/// Parse one NDJSON line; blank lines yield `None`
fn parse_line(line: &[u8]) -> Result<Option<StreamChunk>, ChatError> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    let data: ChatResponse = serde_json::from_slice(line)?;
    if let Some(error) = data.error {
        return Err(ChatError::Backend(error));
    }

    // Ollama sends metadata only in the final message
    if data.done {
        return Ok(Some(StreamChunk::Done(data.stats())));
    }
    Ok(Some(StreamChunk::Token(data.content().to_string())))
}
