//! Event relay: agent replies as AG-UI event streams
//!
//! - `events` - the six lifecycle events and their JSON wire form
//! - `run` - the per-run state machine (`relay_run`)
//! - `connection` - thread-scoped state for persistent connections

pub mod connection;
pub mod events;
pub mod run;

pub use connection::Connection;
pub use events::{Event, Role};
pub use run::{new_id, relay_run, EventStream, RunRequest};
