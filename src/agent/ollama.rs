//! Ollama-backed agent
//!
//! Wraps [`OllamaClient`] with a fixed name and system instructions, turning
//! its chunk stream into the fragment stream the relay consumes.

use async_trait::async_trait;
use futures_util::{future, StreamExt};
use tracing::{debug, info};

use super::capability::{Agent, AgentError, FragmentStream};
use crate::ollama::{ChatMessage, OllamaClient, StreamChunk};

/// Default instructions given to the chat agent
pub const DEFAULT_INSTRUCTIONS: &str = "You are a helpful assistant for a website chat interface.";

/// Configuration for the Ollama agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Base URL of the Ollama server
    pub base_url: String,
    /// Model to use for Ollama (e.g., "llama3.2")
    pub model: String,
    /// Agent name, used in logs
    pub name: String,
    /// System prompt prepended to every conversation
    pub instructions: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            name: "MyReactChatAgent".to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
        }
    }
}

/// Chat agent speaking to a local Ollama server
pub struct OllamaAgent {
    client: OllamaClient,
    config: AgentConfig,
}

impl OllamaAgent {
    /// Create a new agent
    ///
    /// # Arguments
    /// * `config` - Agent configuration (server URL, model, instructions)
    pub fn new(config: AgentConfig) -> Self {
        Self {
            client: OllamaClient::new(config.base_url.clone()),
            config,
        }
    }

    fn conversation(&self, message: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.config.instructions.clone()),
            ChatMessage::user(message),
        ]
    }
}

#[async_trait]
impl Agent for OllamaAgent {
    async fn run(&self, message: &str) -> Result<String, AgentError> {
        info!(agent = %self.config.name, model = %self.config.model, "Running agent");

        let response = self
            .client
            .chat(self.conversation(message), &self.config.model)
            .await?;

        debug!(
            agent = %self.config.name,
            eval_count = response.eval_count,
            "Agent reply complete"
        );
        Ok(response.content().to_string())
    }

    async fn run_stream(&self, message: &str) -> Result<FragmentStream, AgentError> {
        info!(agent = %self.config.name, model = %self.config.model, "Streaming agent reply");

        let chunks = self
            .client
            .chat_stream(self.conversation(message), &self.config.model)
            .await?;

        let agent_name = self.config.name.clone();
        let fragments = chunks.filter_map(move |chunk| {
            let item = match chunk {
                Ok(StreamChunk::Token(token)) => Some(Ok(Some(token))),
                Ok(StreamChunk::Done(stats)) => {
                    debug!(
                        agent = %agent_name,
                        eval_count = stats.eval_count,
                        eval_duration_ns = stats.eval_duration_ns,
                        "Agent stream finished"
                    );
                    None
                }
                Err(e) => Some(Err(AgentError::from(e))),
            };
            future::ready(item)
        });

        Ok(Box::pin(fragments))
    }
}
