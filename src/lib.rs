//! chatgate - AG-UI event relay with a sandboxed code executor
//!
//! Turns an agent's streamed reply into an ordered sequence of AG-UI
//! lifecycle events, delivered over Server-Sent Events, WebSocket or a plain
//! JSON reply, and runs untrusted code in short-lived Docker containers.
//!
//! # Modules
//!
//! - `relay` - run state machine and AG-UI events
//! - `agent` - the `Agent` capability and its Ollama backend
//! - `ollama` - Ollama chat API client
//! - `sandbox` - container runtime seam and the bounded-time executor
//! - `server` - axum routes for the three chat transports and `/execute`
//! - `config` - environment configuration
//! - `metrics` - Prometheus metrics for observability
//! - `tracing` - tracing subscriber and OpenTelemetry export
//!
//! # Quick Start
//!
//! ```ignore
//! use chatgate::{relay_run, OllamaAgent, AgentConfig, RunRequest};
//!
//! let agent = Arc::new(OllamaAgent::new(AgentConfig::default()));
//! let mut events = relay_run(agent, RunRequest::new("Hello"));
//! while let Some(event) = events.next().await {
//!     println!("{}", serde_json::to_string(&event)?);
//! }
//! ```

pub mod agent;
pub mod config;
pub mod metrics;
pub mod ollama;
pub mod relay;
pub mod sandbox;
pub mod server;
pub mod tracing;

// Re-export commonly used types at crate root for convenience
pub use agent::{Agent, AgentConfig, AgentError, FragmentStream, OllamaAgent};
pub use config::ServerConfig;
pub use relay::{relay_run, Connection, Event, EventStream, RunRequest};
pub use sandbox::{
    ContainerRuntime, DockerRuntime, ExecutionRequest, ExecutionResult, SandboxExecutor,
};
pub use server::{create_router, AppState};
