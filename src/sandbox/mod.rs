//! Sandboxed code execution
//!
//! - `runtime` - the [`ContainerRuntime`] seam and its value types
//! - `docker` - the Docker Engine implementation
//! - `executor` - bounded-time execution with guaranteed teardown

use std::time::Duration;

pub mod docker;
pub mod executor;
pub mod runtime;

pub use docker::DockerRuntime;
pub use executor::{
    build_command, ExecutionRequest, ExecutionResult, SandboxExecutor, MAX_TIMEOUT,
};
pub use runtime::{
    ContainerRuntime, ContainerSpec, ContainerState, ContainerStatus, ResourceLimits,
    SandboxError,
};

/// Image used when a request does not name one
pub const DEFAULT_IMAGE: &str = "python:3.11-slim";

/// Execution timeout used when a request does not set one
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
