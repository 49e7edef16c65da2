//! The `Agent` trait and its error type

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::stream::Stream;

use crate::ollama::ChatError;

/// Lazy sequence of reply fragments.
///
/// `Ok(None)` is a null fragment; the relay drops it along with empty strings.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Option<String>, AgentError>> + Send>>;

/// Error type for agent operations
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// The model backend failed
    #[error(transparent)]
    Chat(#[from] ChatError),
    /// Any other failure reported by an agent implementation
    #[error("{0}")]
    Failed(String),
}

impl AgentError {
    pub fn failed(msg: impl Into<String>) -> Self {
        AgentError::Failed(msg.into())
    }
}

/// An opaque chat agent.
///
/// Implementations must be shareable across connections; they are held as
/// `Arc<dyn Agent>` in the server state.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Produce the complete reply for `message`
    async fn run(&self, message: &str) -> Result<String, AgentError>;

    /// Start a reply for `message` and return its fragments as they arrive.
    ///
    /// An error here means the run could not be set up; errors yielded by the
    /// stream mean it failed part-way.
    async fn run_stream(&self, message: &str) -> Result<FragmentStream, AgentError>;
}
