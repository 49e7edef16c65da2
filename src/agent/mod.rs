//! Agent capability consumed by the event relay
//!
//! The relay never talks to a model directly. It holds an `Arc<dyn Agent>`
//! and asks it for either a full reply or a lazy stream of text fragments:
//!
//! ```text
//! RunRequest → relay_run ──run_stream()──► Agent (OllamaAgent, or a test double)
//!                  ▲                         │
//!                  └──── Option<String> ◄────┘  fragments, in arrival order
//! ```

pub mod capability;
pub mod ollama;

pub use capability::{Agent, AgentError, FragmentStream};
pub use ollama::{AgentConfig, OllamaAgent};
